use std::fmt;

use serde::Serialize;
use url::Url;

/// Origin plus fixed path that every referral link hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralBase {
    origin: String,
    path: String,
}

impl ReferralBase {
    /// Keeps only scheme, host and port of `site`.
    pub fn new(site: &Url, path: &str) -> Self {
        Self::from_parts(&site.origin().ascii_serialization(), path)
    }

    pub fn from_parts(origin: &str, path: &str) -> Self {
        Self {
            origin: origin.trim().trim_end_matches('/').to_string(),
            path: path.trim().trim_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `origin/path/?ref=<encoded name>`. Pure; same input, same link.
    pub fn link_for(&self, twitter_name: &str) -> ReferralLink {
        let encoded = encode_uri_component(twitter_name);
        let link = if self.path.is_empty() {
            format!("{}/?ref={encoded}", self.origin)
        } else {
            format!("{}/{}/?ref={encoded}", self.origin, self.path)
        };
        ReferralLink(link)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReferralLink(String);

impl ReferralLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReferralLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percent-encodes like JavaScript's `encodeURIComponent`, which also leaves
/// `!'()*` untouched.
pub fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard permission denied")]
    PermissionDenied,
    #[error("clipboard unavailable: {0}")]
    Unsupported(String),
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Somewhere the referral link can be copied to.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}
