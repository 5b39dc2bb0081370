use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::WaitlistField;
use super::effects::{CelebrationSlot, ConfettiBurst};
use super::endpoint::SubmissionEndpoint;
use super::notify::{Notification, NotificationBuffer};
use super::repository::{RepositoryError, SessionId, WizardRepository};
use super::service::{SessionView, SubmitView, WaitlistService, WaitlistServiceError};
use super::wizard::WizardError;

#[derive(Debug, Deserialize, Serialize)]
pub struct FieldUpdate {
    pub field: WaitlistField,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize)]
struct SessionEnvelope {
    #[serde(flatten)]
    session: SessionView,
    notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
struct SubmitEnvelope {
    #[serde(flatten)]
    submitted: SubmitView,
    #[serde(skip_serializing_if = "Option::is_none")]
    celebration: Option<ConfettiBurst>,
    notifications: Vec<Notification>,
}

/// Router builder exposing the wizard session endpoints.
pub fn waitlist_router<R, E>(service: Arc<WaitlistService<R, E>>) -> Router
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    Router::new()
        .route("/api/v1/waitlist/sessions", post(start_handler::<R, E>))
        .route(
            "/api/v1/waitlist/sessions/:session_id",
            get(session_handler::<R, E>).delete(abandon_handler::<R, E>),
        )
        .route(
            "/api/v1/waitlist/sessions/:session_id/fields",
            axum::routing::put(field_handler::<R, E>),
        )
        .route(
            "/api/v1/waitlist/sessions/:session_id/advance",
            post(advance_handler::<R, E>),
        )
        .route(
            "/api/v1/waitlist/sessions/:session_id/submit",
            post(submit_handler::<R, E>),
        )
        .route(
            "/api/v1/waitlist/sessions/:session_id/referral",
            get(referral_handler::<R, E>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<R, E>(
    State(service): State<Arc<WaitlistService<R, E>>>,
) -> Response
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    let buffer = NotificationBuffer::default();
    session_response(StatusCode::CREATED, service.start(), &buffer)
}

pub(crate) async fn session_handler<R, E>(
    State(service): State<Arc<WaitlistService<R, E>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    let buffer = NotificationBuffer::default();
    let result = service.get(&SessionId(session_id));
    session_response(StatusCode::OK, result, &buffer)
}

pub(crate) async fn field_handler<R, E>(
    State(service): State<Arc<WaitlistService<R, E>>>,
    Path(session_id): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Response
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    let buffer = NotificationBuffer::default();
    let result =
        service.update_field(&SessionId(session_id), update.field, update.value, &buffer);
    session_response(StatusCode::OK, result, &buffer)
}

pub(crate) async fn advance_handler<R, E>(
    State(service): State<Arc<WaitlistService<R, E>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    let buffer = NotificationBuffer::default();
    let result = service.advance(&SessionId(session_id), &buffer);
    session_response(StatusCode::OK, result, &buffer)
}

pub(crate) async fn submit_handler<R, E>(
    State(service): State<Arc<WaitlistService<R, E>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    let buffer = NotificationBuffer::default();
    let celebration = CelebrationSlot::default();
    let result = service
        .submit(&SessionId(session_id), &buffer, &celebration)
        .await;

    match result {
        Ok(submitted) => {
            let payload = SubmitEnvelope {
                submitted,
                celebration: celebration.take(),
                notifications: buffer.drain(),
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err, &buffer),
    }
}

pub(crate) async fn referral_handler<R, E>(
    State(service): State<Arc<WaitlistService<R, E>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    let buffer = NotificationBuffer::default();
    match service.referral(&SessionId(session_id)) {
        Ok(link) => (StatusCode::OK, Json(json!({ "referral_link": link }))).into_response(),
        Err(err) => error_response(err, &buffer),
    }
}

pub(crate) async fn abandon_handler<R, E>(
    State(service): State<Arc<WaitlistService<R, E>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: WizardRepository + 'static,
    E: SubmissionEndpoint + 'static,
{
    let buffer = NotificationBuffer::default();
    match service.abandon(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err, &buffer),
    }
}

fn session_response(
    status: StatusCode,
    result: Result<SessionView, WaitlistServiceError>,
    buffer: &NotificationBuffer,
) -> Response {
    match result {
        Ok(session) => {
            let payload = SessionEnvelope {
                session,
                notifications: buffer.drain(),
            };
            (status, Json(payload)).into_response()
        }
        Err(err) => error_response(err, buffer),
    }
}

fn error_response(err: WaitlistServiceError, buffer: &NotificationBuffer) -> Response {
    let payload = json!({
        "error": err.to_string(),
        "notifications": buffer.drain(),
    });
    (error_status(&err), Json(payload)).into_response()
}

pub(crate) fn error_status(err: &WaitlistServiceError) -> StatusCode {
    match err {
        WaitlistServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        WaitlistServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        WaitlistServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        WaitlistServiceError::Wizard(WizardError::Validation(_) | WizardError::Spam) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WaitlistServiceError::Wizard(WizardError::Submission(_)) => StatusCode::BAD_GATEWAY,
        WaitlistServiceError::Wizard(
            WizardError::SubmissionInFlight
            | WizardError::InvalidTransition { .. }
            | WizardError::NoSubmissionPending
            | WizardError::FieldsLocked { .. }
            | WizardError::ReferralUnavailable,
        ) => StatusCode::CONFLICT,
        WaitlistServiceError::Wizard(WizardError::Clipboard(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
