use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    HoneypotPolicy, Phase, SubmissionStatus, ValidationError, WaitlistField, WaitlistSubmission,
};
use super::effects::{Celebration, ConfettiBurst};
use super::endpoint::{EndpointAck, SubmissionEndpoint, SubmissionError};
use super::notify::{Notification, NotificationSink};
use super::referral::{Clipboard, ClipboardError, ReferralBase, ReferralLink};

/// Linear signup wizard: `Identity -> Tasks -> Wallet -> Success`.
///
/// Every operation that can fail reports the failure to the notification sink
/// it was given and also returns it, leaving the wizard in a resumable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistWizard {
    phase: Phase,
    fields: WaitlistSubmission,
    status: SubmissionStatus,
}

/// What `begin_submission` decided to do with the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPlan {
    Deliver(WaitlistSubmission),
    /// Honeypot hit under `HoneypotPolicy::Discard`; do not contact the endpoint.
    Suppress,
}

/// Result handed to `complete_submission` once the endpoint call settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Delivered(EndpointAck),
    Failed(SubmissionError),
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionDisposition {
    Delivered,
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub disposition: SubmissionDisposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot {operation} during the {phase} phase")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("no submission is in progress")]
    NoSubmissionPending,
    #[error("fields cannot be edited while the wizard is {state}")]
    FieldsLocked { state: &'static str },
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("submission flagged as automated")]
    Spam,
    #[error("referral link is only available after a successful submission")]
    ReferralUnavailable,
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

impl WizardError {
    /// User-facing rendering of the failure.
    pub fn notification(&self) -> Notification {
        match self {
            WizardError::Validation(err) => Notification::destructive("Required", err.to_string()),
            WizardError::Submission(err) => {
                Notification::destructive("Submission failed", err.user_message())
            }
            WizardError::Spam => Notification::destructive(
                "Submission failed",
                SubmissionError::Rejected { message: None }.user_message(),
            ),
            WizardError::SubmissionInFlight => Notification::destructive(
                "Hold on",
                "Your submission is still being processed.",
            ),
            WizardError::Clipboard(_) => Notification::destructive(
                "Copy failed",
                "Unable to copy the referral link. Copy it manually instead.",
            ),
            WizardError::InvalidTransition { .. }
            | WizardError::NoSubmissionPending
            | WizardError::FieldsLocked { .. }
            | WizardError::ReferralUnavailable => {
                Notification::destructive("Not available", self.to_string())
            }
        }
    }
}

impl Default for WaitlistWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitlistWizard {
    pub fn new() -> Self {
        Self {
            phase: Phase::Identity,
            fields: WaitlistSubmission::default(),
            status: SubmissionStatus::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn fields(&self) -> &WaitlistSubmission {
        &self.fields
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Wallet && !self.is_pending()
    }

    pub fn set_field(
        &mut self,
        field: WaitlistField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        if self.is_pending() {
            return Err(WizardError::FieldsLocked { state: "submitting" });
        }
        if self.phase == Phase::Success {
            return Err(WizardError::FieldsLocked { state: "complete" });
        }

        self.fields.set(field, value.into());
        debug!(%field, phase = %self.phase, "waitlist field updated");
        Ok(())
    }

    /// Moves to the next data-entry phase once the current phase's fields are filled.
    pub fn advance(&mut self, notifier: &dyn NotificationSink) -> Result<Phase, WizardError> {
        let result = self.try_advance();
        report(result, notifier)
    }

    fn try_advance(&mut self) -> Result<Phase, WizardError> {
        let next = self.phase.next().ok_or(WizardError::InvalidTransition {
            operation: "advance",
            phase: self.phase,
        })?;
        self.fields.validate_phase(self.phase)?;

        info!(from = %self.phase, to = %next, "waitlist wizard advanced");
        self.phase = next;
        Ok(next)
    }

    /// Validates the whole payload and marks the wizard pending.
    ///
    /// The caller performs the endpoint call without holding the wizard and
    /// hands the result to `complete_submission`.
    pub fn begin_submission(
        &mut self,
        policy: HoneypotPolicy,
        notifier: &dyn NotificationSink,
    ) -> Result<SubmissionPlan, WizardError> {
        let result = self.try_begin(policy);
        report(result, notifier)
    }

    fn try_begin(&mut self, policy: HoneypotPolicy) -> Result<SubmissionPlan, WizardError> {
        if self.is_pending() {
            return Err(WizardError::SubmissionInFlight);
        }
        if self.phase != Phase::Wallet {
            return Err(WizardError::InvalidTransition {
                operation: "submit",
                phase: self.phase,
            });
        }
        self.fields.ensure_complete()?;

        if self.fields.honeypot_filled() {
            match policy {
                HoneypotPolicy::Discard => {
                    warn!("honeypot field filled; discarding waitlist submission");
                    self.status = SubmissionStatus::Pending;
                    return Ok(SubmissionPlan::Suppress);
                }
                HoneypotPolicy::Reject => {
                    warn!("honeypot field filled; rejecting waitlist submission");
                    self.status = SubmissionStatus::Failed;
                    return Err(WizardError::Spam);
                }
                HoneypotPolicy::Forward => {
                    warn!("honeypot field filled; forwarding waitlist submission anyway");
                }
            }
        }

        self.status = SubmissionStatus::Pending;
        Ok(SubmissionPlan::Deliver(self.fields.clone()))
    }

    /// Applies the settled submission. Success moves to `Success` and fires the
    /// celebration; failure stays in `Wallet` with every field intact.
    pub fn complete_submission(
        &mut self,
        outcome: SubmissionOutcome,
        notifier: &dyn NotificationSink,
        celebration: &dyn Celebration,
    ) -> Result<SubmissionReceipt, WizardError> {
        let result = self.try_complete(outcome, celebration);
        report(result, notifier)
    }

    fn try_complete(
        &mut self,
        outcome: SubmissionOutcome,
        celebration: &dyn Celebration,
    ) -> Result<SubmissionReceipt, WizardError> {
        if !self.is_pending() {
            return Err(WizardError::NoSubmissionPending);
        }

        let receipt = match outcome {
            SubmissionOutcome::Delivered(ack) => SubmissionReceipt {
                disposition: SubmissionDisposition::Delivered,
                message: ack.message,
            },
            SubmissionOutcome::Suppressed => SubmissionReceipt {
                disposition: SubmissionDisposition::Suppressed,
                message: None,
            },
            SubmissionOutcome::Failed(err) => {
                self.status = SubmissionStatus::Failed;
                return Err(err.into());
            }
        };

        self.phase = Phase::Success;
        self.status = SubmissionStatus::Success;
        info!(disposition = ?receipt.disposition, "waitlist submission completed");
        celebration.celebrate(&ConfettiBurst::default());
        Ok(receipt)
    }

    /// Gives up on a pending submission whose outcome will never arrive, e.g.
    /// because the request driving it was dropped. Returns whether anything
    /// was pending.
    pub fn cancel_submission(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        warn!(phase = %self.phase, "pending waitlist submission cancelled before it settled");
        self.status = SubmissionStatus::Failed;
        true
    }

    /// Single-owner convenience running begin, endpoint call, and complete.
    pub async fn submit<E>(
        &mut self,
        endpoint: &E,
        policy: HoneypotPolicy,
        notifier: &dyn NotificationSink,
        celebration: &dyn Celebration,
    ) -> Result<SubmissionReceipt, WizardError>
    where
        E: SubmissionEndpoint,
    {
        let outcome = match self.begin_submission(policy, notifier)? {
            SubmissionPlan::Deliver(payload) => match endpoint.submit(&payload).await {
                Ok(ack) => SubmissionOutcome::Delivered(ack),
                Err(err) => SubmissionOutcome::Failed(err),
            },
            SubmissionPlan::Suppress => SubmissionOutcome::Suppressed,
        };
        self.complete_submission(outcome, notifier, celebration)
    }

    pub fn referral_link(&self, base: &ReferralBase) -> Result<ReferralLink, WizardError> {
        if self.phase != Phase::Success {
            return Err(WizardError::ReferralUnavailable);
        }
        Ok(base.link_for(&self.fields.twitter_name))
    }

    /// Copies the referral link; clipboard failures are reported, never fatal.
    pub fn copy_referral(
        &self,
        base: &ReferralBase,
        clipboard: &dyn Clipboard,
        notifier: &dyn NotificationSink,
    ) -> Result<ReferralLink, WizardError> {
        let result = self.referral_link(base).and_then(|link| {
            clipboard.write_text(link.as_str())?;
            Ok(link)
        });

        if result.is_ok() {
            notifier.notify(Notification::info(
                "Copied!",
                "Referral link copied to clipboard.",
            ));
        }
        report(result, notifier)
    }
}

fn report<T>(
    result: Result<T, WizardError>,
    notifier: &dyn NotificationSink,
) -> Result<T, WizardError> {
    if let Err(err) = &result {
        warn!("waitlist wizard operation failed: {err}");
        notifier.notify(err.notification());
    }
    result
}
