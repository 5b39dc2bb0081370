use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use metrics_exporter_prometheus::PrometheusHandle;
use std::io::{IsTerminal, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use void_walker::config::WaitlistConfig;
use void_walker::workflows::waitlist::{
    Clipboard, ClipboardError, EndpointAck, SubmissionEndpoint, SubmissionError,
    WaitlistSettings, WaitlistSubmission,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn waitlist_settings(config: &WaitlistConfig) -> WaitlistSettings {
    WaitlistSettings {
        referral: config.referral_base(),
        honeypot: config.honeypot_policy,
        campaign_url: config.campaign_url.to_string(),
    }
}

/// Accepts every submission without leaving the machine.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DryRunEndpoint;

impl SubmissionEndpoint for DryRunEndpoint {
    async fn submit(&self, payload: &WaitlistSubmission) -> Result<EndpointAck, SubmissionError> {
        info!(
            twitter_name = %payload.twitter_name,
            wallet_address = %payload.wallet_address,
            "dry run: waitlist submission not sent"
        );
        Ok(EndpointAck::accepted())
    }
}

/// Copies through the terminal with an OSC 52 escape sequence.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TerminalClipboard;

impl Clipboard for TerminalClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout();
        if !stdout.is_terminal() {
            return Err(ClipboardError::Unsupported(
                "stdout is not a terminal".to_string(),
            ));
        }

        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|err| ClipboardError::Write(err.to_string()))
    }
}

pub(crate) fn osc52_sequence(text: &str) -> String {
    format!("\u{1b}]52;c;{}\u{7}", BASE64.encode(text))
}
