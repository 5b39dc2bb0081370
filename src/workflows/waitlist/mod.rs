//! Waitlist signup wizard: phased data entry, one guarded submission to the
//! spreadsheet endpoint, then a shareable referral link.

pub mod domain;
pub mod effects;
pub mod endpoint;
pub mod notify;
pub mod referral;
pub mod repository;
pub mod router;
pub mod service;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    HoneypotPolicy, Phase, SubmissionStatus, TaskInstruction, UnknownField, ValidationError,
    WaitlistField, WaitlistSubmission,
};
pub use effects::{Celebration, CelebrationSlot, ConfettiBurst, NoCelebration};
pub use endpoint::{
    interpret_response, EndpointAck, HttpSubmissionEndpoint, SubmissionEndpoint, SubmissionError,
};
pub use notify::{
    Notification, NotificationBuffer, NotificationSink, NotificationVariant,
    TracingNotificationSink,
};
pub use referral::{encode_uri_component, Clipboard, ClipboardError, ReferralBase, ReferralLink};
pub use repository::{
    InMemoryWizardRepository, RepositoryError, SessionId, WizardRepository, WizardSession,
};
pub use router::{waitlist_router, FieldUpdate};
pub use service::{
    FieldsView, SessionView, SubmitView, WaitlistService, WaitlistServiceError, WaitlistSettings,
};
pub use wizard::{
    SubmissionDisposition, SubmissionOutcome, SubmissionPlan, SubmissionReceipt, WaitlistWizard,
    WizardError,
};
