use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;
use tokio::sync::{Notify, Semaphore};

use crate::workflows::waitlist::domain::{HoneypotPolicy, WaitlistField, WaitlistSubmission};
use crate::workflows::waitlist::effects::{Celebration, ConfettiBurst};
use crate::workflows::waitlist::endpoint::{EndpointAck, SubmissionEndpoint, SubmissionError};
use crate::workflows::waitlist::notify::{Notification, NotificationSink};
use crate::workflows::waitlist::referral::{Clipboard, ClipboardError, ReferralBase};
use crate::workflows::waitlist::repository::InMemoryWizardRepository;
use crate::workflows::waitlist::service::{WaitlistService, WaitlistSettings};
use crate::workflows::waitlist::wizard::WaitlistWizard;

pub(super) const ORIGIN: &str = "https://example.com";

#[derive(Default)]
pub(super) struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("sink mutex").clone()
    }

    pub(super) fn last(&self) -> Option<Notification> {
        self.events.lock().expect("sink mutex").last().cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.events.lock().expect("sink mutex").push(notification);
    }
}

#[derive(Default)]
pub(super) struct CountingCelebration {
    bursts: AtomicUsize,
}

impl CountingCelebration {
    pub(super) fn count(&self) -> usize {
        self.bursts.load(Ordering::SeqCst)
    }
}

impl Celebration for CountingCelebration {
    fn celebrate(&self, burst: &ConfettiBurst) {
        assert_eq!(burst.particle_count, 150);
        self.bursts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Endpoint answering from a script of canned responses, accepting once the
/// script runs out.
#[derive(Default)]
pub(super) struct ScriptedEndpoint {
    script: Mutex<VecDeque<Result<EndpointAck, SubmissionError>>>,
    received: Mutex<Vec<WaitlistSubmission>>,
}

impl ScriptedEndpoint {
    pub(super) fn with_script(
        responses: impl IntoIterator<Item = Result<EndpointAck, SubmissionError>>,
    ) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing(error: SubmissionError) -> Self {
        Self::with_script([Err(error)])
    }

    pub(super) fn received(&self) -> Vec<WaitlistSubmission> {
        self.received.lock().expect("endpoint mutex").clone()
    }
}

impl SubmissionEndpoint for ScriptedEndpoint {
    async fn submit(&self, payload: &WaitlistSubmission) -> Result<EndpointAck, SubmissionError> {
        self.received
            .lock()
            .expect("endpoint mutex")
            .push(payload.clone());
        self.script
            .lock()
            .expect("endpoint mutex")
            .pop_front()
            .unwrap_or_else(|| Ok(EndpointAck::accepted()))
    }
}

/// Endpoint that parks every call until the test releases it.
pub(super) struct GatedEndpoint {
    pub(super) entered: Notify,
    release: Semaphore,
    calls: AtomicUsize,
}

impl GatedEndpoint {
    pub(super) fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn release(&self) {
        self.release.add_permits(1);
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubmissionEndpoint for GatedEndpoint {
    async fn submit(&self, _payload: &WaitlistSubmission) -> Result<EndpointAck, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|err| SubmissionError::Network(err.to_string()))?;
        permit.forget();
        Ok(EndpointAck::accepted())
    }
}

#[derive(Default)]
pub(super) struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub(super) fn contents(&self) -> Option<String> {
        self.contents.lock().expect("clipboard mutex").clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.contents.lock().expect("clipboard mutex") = Some(text.to_string());
        Ok(())
    }
}

pub(super) struct DeniedClipboard;

impl Clipboard for DeniedClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::PermissionDenied)
    }
}

pub(super) fn referral_base() -> ReferralBase {
    ReferralBase::from_parts(ORIGIN, "void-walker")
}

pub(super) fn settings(honeypot: HoneypotPolicy) -> WaitlistSettings {
    WaitlistSettings {
        referral: referral_base(),
        honeypot,
        campaign_url: "https://x.com/cherygpt".to_string(),
    }
}

pub(super) fn build_service<E>(
    endpoint: Arc<E>,
) -> (
    WaitlistService<InMemoryWizardRepository, E>,
    Arc<InMemoryWizardRepository>,
)
where
    E: SubmissionEndpoint + 'static,
{
    let repository = Arc::new(InMemoryWizardRepository::default());
    let service = WaitlistService::new(
        repository.clone(),
        endpoint,
        settings(HoneypotPolicy::Discard),
    );
    (service, repository)
}

/// Wizard walked through the first two phases with a wallet filled in.
pub(super) fn wizard_at_wallet(name: &str) -> WaitlistWizard {
    let sink = RecordingSink::default();
    let mut wizard = WaitlistWizard::new();
    wizard
        .set_field(WaitlistField::TwitterName, name)
        .expect("identity editable");
    wizard.advance(&sink).expect("identity passes");
    wizard
        .set_field(WaitlistField::QuoteLink, "https://x.com/a/status/1")
        .expect("tasks editable");
    wizard
        .set_field(WaitlistField::CommentLink, "https://x.com/a/status/2")
        .expect("tasks editable");
    wizard.advance(&sink).expect("tasks pass");
    wizard
        .set_field(
            WaitlistField::WalletAddress,
            "0x52908400098527886E0F7030069857D2E4169EE7",
        )
        .expect("wallet editable");
    wizard
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
