use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{HoneypotPolicy, Phase, SubmissionStatus, TaskInstruction, WaitlistField};
use super::effects::Celebration;
use super::endpoint::SubmissionEndpoint;
use super::notify::NotificationSink;
use super::referral::{ReferralBase, ReferralLink};
use super::repository::{RepositoryError, SessionId, WizardRepository, WizardSession};
use super::wizard::{SubmissionOutcome, SubmissionPlan, SubmissionReceipt, WizardError};

/// Knobs shared by every session hosted by the service.
#[derive(Debug, Clone)]
pub struct WaitlistSettings {
    pub referral: ReferralBase,
    pub honeypot: HoneypotPolicy,
    pub campaign_url: String,
}

/// Field values echoed back to the client. The honeypot is never echoed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsView {
    pub twitter_name: String,
    pub wallet_address: String,
    pub quote_link: String,
    pub comment_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub phase: Phase,
    pub heading: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<&'static str>,
    pub status: SubmissionStatus,
    pub submit_enabled: bool,
    pub fields: FieldsView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<TaskInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_link: Option<ReferralLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitView {
    pub session: SessionView,
    pub receipt: SubmissionReceipt,
}

/// Hosts wizard sessions on top of a repository and a submission endpoint.
pub struct WaitlistService<R, E> {
    repository: Arc<R>,
    endpoint: Arc<E>,
    settings: WaitlistSettings,
}

impl<R, E> WaitlistService<R, E>
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    pub fn new(repository: Arc<R>, endpoint: Arc<E>, settings: WaitlistSettings) -> Self {
        Self {
            repository,
            endpoint,
            settings,
        }
    }

    pub fn settings(&self) -> &WaitlistSettings {
        &self.settings
    }

    pub fn start(&self) -> Result<SessionView, WaitlistServiceError> {
        let session = self.repository.insert(WizardSession::start())?;
        info!(session = %session.id, "waitlist session started");
        Ok(self.view(&session))
    }

    pub fn get(&self, id: &SessionId) -> Result<SessionView, WaitlistServiceError> {
        let session = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(self.view(&session))
    }

    pub fn update_field(
        &self,
        id: &SessionId,
        field: WaitlistField,
        value: String,
        notifier: &dyn NotificationSink,
    ) -> Result<SessionView, WaitlistServiceError> {
        let view = self.repository.update(id, |session| {
            session
                .wizard
                .set_field(field, value)
                .map(|()| self.view(session))
                .inspect_err(|err| notifier.notify(err.notification()))
        })??;
        Ok(view)
    }

    pub fn advance(
        &self,
        id: &SessionId,
        notifier: &dyn NotificationSink,
    ) -> Result<SessionView, WaitlistServiceError> {
        let view = self.repository.update(id, |session| {
            session
                .wizard
                .advance(notifier)
                .map(|_| self.view(session))
        })??;
        Ok(view)
    }

    /// Runs one submission. The session is only held for the synchronous
    /// begin/complete steps, never while the endpoint call is in flight.
    pub async fn submit(
        &self,
        id: &SessionId,
        notifier: &dyn NotificationSink,
        celebration: &dyn Celebration,
    ) -> Result<SubmitView, WaitlistServiceError> {
        let policy = self.settings.honeypot;
        let plan = self.repository.update(id, |session| {
            session.wizard.begin_submission(policy, notifier)
        })??;
        let pending = PendingSubmission {
            repository: &*self.repository,
            id,
            armed: true,
        };

        let outcome = match plan {
            SubmissionPlan::Deliver(payload) => match self.endpoint.submit(&payload).await {
                Ok(ack) => SubmissionOutcome::Delivered(ack),
                Err(err) => SubmissionOutcome::Failed(err),
            },
            SubmissionPlan::Suppress => SubmissionOutcome::Suppressed,
        };
        pending.settle();

        let completed = self.repository.update(id, |session| {
            session
                .wizard
                .complete_submission(outcome, notifier, celebration)
                .map(|receipt| SubmitView {
                    session: self.view(session),
                    receipt,
                })
        });

        match completed {
            Err(RepositoryError::NotFound) => {
                warn!(session = %id, "session abandoned before its submission settled");
                Err(RepositoryError::NotFound.into())
            }
            other => Ok(other??),
        }
    }

    pub fn referral(&self, id: &SessionId) -> Result<ReferralLink, WaitlistServiceError> {
        let session = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(session.wizard.referral_link(&self.settings.referral)?)
    }

    /// Discards the session, e.g. when the visitor navigates away.
    pub fn abandon(&self, id: &SessionId) -> Result<(), WaitlistServiceError> {
        self.repository.remove(id)?;
        info!(session = %id, "waitlist session abandoned");
        Ok(())
    }

    fn view(&self, session: &WizardSession) -> SessionView {
        let wizard = &session.wizard;
        let phase = wizard.phase();
        let fields = wizard.fields();

        let instructions = if phase == Phase::Tasks {
            TaskInstruction::standard(&self.settings.campaign_url)
        } else {
            Vec::new()
        };

        SessionView {
            session_id: session.id.clone(),
            started_at: session.started_at,
            phase,
            heading: phase.heading(),
            tagline: phase.tagline(),
            status: wizard.status(),
            submit_enabled: wizard.can_submit(),
            fields: FieldsView {
                twitter_name: fields.twitter_name.clone(),
                wallet_address: fields.wallet_address.clone(),
                quote_link: fields.quote_link.clone(),
                comment_link: fields.comment_link.clone(),
            },
            instructions,
            referral_link: wizard.referral_link(&self.settings.referral).ok(),
        }
    }
}

/// Held across the endpoint call. If the submitting future is dropped before
/// the outcome is applied, the session's pending flag is cleared on drop so
/// the visitor can submit again.
struct PendingSubmission<'a, R: WizardRepository> {
    repository: &'a R,
    id: &'a SessionId,
    armed: bool,
}

impl<R: WizardRepository> PendingSubmission<'_, R> {
    fn settle(mut self) {
        self.armed = false;
    }
}

impl<R: WizardRepository> Drop for PendingSubmission<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self
            .repository
            .update(self.id, |session| session.wizard.cancel_submission())
        {
            Ok(_) => {}
            Err(err) => {
                debug!(session = %self.id, "no pending submission to reset: {err}")
            }
        }
    }
}

/// Error raised by the waitlist service.
#[derive(Debug, thiserror::Error)]
pub enum WaitlistServiceError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
