use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Payload assembled across the wizard phases and posted to the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistSubmission {
    pub twitter_name: String,
    pub wallet_address: String,
    pub quote_link: String,
    pub comment_link: String,
    /// Honeypot. Never rendered to people, so anything here came from a bot.
    #[serde(default)]
    pub website: String,
}

impl WaitlistSubmission {
    pub fn get(&self, field: WaitlistField) -> &str {
        match field {
            WaitlistField::TwitterName => &self.twitter_name,
            WaitlistField::WalletAddress => &self.wallet_address,
            WaitlistField::QuoteLink => &self.quote_link,
            WaitlistField::CommentLink => &self.comment_link,
            WaitlistField::Website => &self.website,
        }
    }

    /// Overwrites exactly one field.
    pub fn set(&mut self, field: WaitlistField, value: String) {
        let slot = match field {
            WaitlistField::TwitterName => &mut self.twitter_name,
            WaitlistField::WalletAddress => &mut self.wallet_address,
            WaitlistField::QuoteLink => &mut self.quote_link,
            WaitlistField::CommentLink => &mut self.comment_link,
            WaitlistField::Website => &mut self.website,
        };
        *slot = value;
    }

    pub fn is_blank(&self, field: WaitlistField) -> bool {
        self.get(field).trim().is_empty()
    }

    pub fn honeypot_filled(&self) -> bool {
        !self.is_blank(WaitlistField::Website)
    }

    /// Checks the fields a phase gates on.
    pub fn validate_phase(&self, phase: Phase) -> Result<(), ValidationError> {
        let missing: Vec<WaitlistField> = phase
            .required_fields()
            .iter()
            .copied()
            .filter(|field| self.is_blank(*field))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { phase, missing })
        }
    }

    /// Every data-entry gate, in phase order. Run once right before sending.
    pub fn ensure_complete(&self) -> Result<(), ValidationError> {
        Phase::DATA_ENTRY
            .iter()
            .try_for_each(|phase| self.validate_phase(*phase))
    }
}

/// Closed set of field names accepted by `set_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitlistField {
    TwitterName,
    WalletAddress,
    QuoteLink,
    CommentLink,
    Website,
}

impl WaitlistField {
    pub const fn key(self) -> &'static str {
        match self {
            WaitlistField::TwitterName => "twitterName",
            WaitlistField::WalletAddress => "walletAddress",
            WaitlistField::QuoteLink => "quoteLink",
            WaitlistField::CommentLink => "commentLink",
            WaitlistField::Website => "website",
        }
    }

    pub const fn placeholder(self) -> &'static str {
        match self {
            WaitlistField::TwitterName => "TWITTER (X) NAME",
            WaitlistField::WalletAddress => "ETH WALLET ADDRESS (0x...)",
            WaitlistField::QuoteLink => "QUOTE LINK",
            WaitlistField::CommentLink => "COMMENT LINK",
            WaitlistField::Website => "",
        }
    }
}

impl fmt::Display for WaitlistField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown waitlist field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for WaitlistField {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "twitterName" | "twitter_name" => Ok(Self::TwitterName),
            "walletAddress" | "wallet_address" => Ok(Self::WalletAddress),
            "quoteLink" | "quote_link" => Ok(Self::QuoteLink),
            "commentLink" | "comment_link" => Ok(Self::CommentLink),
            "website" => Ok(Self::Website),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// Wizard step. Ordered; the only way forward is `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Identity,
    Tasks,
    Wallet,
    Success,
}

impl Phase {
    pub const DATA_ENTRY: [Phase; 3] = [Phase::Identity, Phase::Tasks, Phase::Wallet];

    /// Transition reachable through `advance`. `Wallet` only leaves via submission
    /// and `Success` is terminal.
    pub const fn next(self) -> Option<Phase> {
        match self {
            Phase::Identity => Some(Phase::Tasks),
            Phase::Tasks => Some(Phase::Wallet),
            Phase::Wallet | Phase::Success => None,
        }
    }

    pub const fn required_fields(self) -> &'static [WaitlistField] {
        match self {
            Phase::Identity => &[WaitlistField::TwitterName],
            Phase::Tasks => &[WaitlistField::QuoteLink, WaitlistField::CommentLink],
            Phase::Wallet => &[WaitlistField::WalletAddress],
            Phase::Success => &[],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Phase::Identity => "identity",
            Phase::Tasks => "tasks",
            Phase::Wallet => "wallet",
            Phase::Success => "success",
        }
    }

    pub const fn heading(self) -> &'static str {
        match self {
            Phase::Identity => "Phase 01",
            Phase::Tasks => "Phase 02",
            Phase::Wallet => "Phase 03",
            Phase::Success => "Manifested",
        }
    }

    pub const fn tagline(self) -> Option<&'static str> {
        match self {
            Phase::Identity => Some("Identify yourself in the void."),
            Phase::Tasks => Some("Let's cause some trouble..."),
            Phase::Success => Some("Invite 2 friends & get a chance at guaranteed whitelist"),
            Phase::Wallet => None,
        }
    }

    /// Message surfaced when this phase's gate fails.
    pub const fn required_message(self) -> &'static str {
        match self {
            Phase::Identity => "Please enter your Twitter name.",
            Phase::Tasks => "Please complete the tasks and provide the links.",
            Phase::Wallet => "Please enter your wallet address.",
            Phase::Success => "Nothing left to fill in.",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failed,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Success => "success",
            SubmissionStatus::Failed => "failed",
        }
    }
}

/// A phase gate that did not pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .phase.required_message())]
pub struct ValidationError {
    pub phase: Phase,
    pub missing: Vec<WaitlistField>,
}

/// What to do when the honeypot field arrives filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoneypotPolicy {
    /// Skip the endpoint but report success to the caller.
    #[default]
    Discard,
    /// Send it anyway and let the endpoint sort it out.
    Forward,
    /// Fail the submission with the generic error.
    Reject,
}

impl FromStr for HoneypotPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "discard" | "drop" => Ok(Self::Discard),
            "forward" | "accept" => Ok(Self::Forward),
            "reject" => Ok(Self::Reject),
            other => Err(other.to_string()),
        }
    }
}

/// Static call to action shown during the `Tasks` phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInstruction {
    pub label: &'static str,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_field: Option<WaitlistField>,
}

impl TaskInstruction {
    pub fn standard(campaign_url: &str) -> Vec<TaskInstruction> {
        vec![
            TaskInstruction {
                label: "follow",
                url: campaign_url.to_string(),
                proof_field: None,
            },
            TaskInstruction {
                label: "like & quote pinned post containing \"cherygpt\"",
                url: campaign_url.to_string(),
                proof_field: Some(WaitlistField::QuoteLink),
            },
            TaskInstruction {
                label: "tag 2 frens",
                url: campaign_url.to_string(),
                proof_field: Some(WaitlistField::CommentLink),
            },
        ]
    }
}
