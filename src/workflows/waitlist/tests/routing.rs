use super::common::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::waitlist::endpoint::SubmissionError;
use crate::workflows::waitlist::repository::{RepositoryError, SessionId, WizardRepository};
use crate::workflows::waitlist::router::{error_status, waitlist_router};
use crate::workflows::waitlist::service::WaitlistServiceError;
use crate::workflows::waitlist::wizard::WizardError;

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value).expect("json body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

async fn call(router: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.expect("router responds");
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, read_json_body(response).await)
}

async fn set_field(router: &axum::Router, base: &str, field: &str, value: &str) -> StatusCode {
    let (status, _) = call(
        router,
        request(
            Method::PUT,
            &format!("{base}/fields"),
            Some(json!({ "field": field, "value": value })),
        ),
    )
    .await;
    status
}

#[tokio::test]
async fn full_signup_flow_over_http() {
    let (service, _) = build_service(Arc::new(ScriptedEndpoint::default()));
    let router = waitlist_router(Arc::new(service));

    let (status, body) = call(
        &router,
        request(Method::POST, "/api/v1/waitlist/sessions", None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phase"], "identity");
    let session_id = body["session_id"].as_str().expect("id").to_string();
    let base = format!("/api/v1/waitlist/sessions/{session_id}");

    assert_eq!(set_field(&router, &base, "twitterName", "bob smith").await, StatusCode::OK);
    let (status, body) = call(&router, request(Method::POST, &format!("{base}/advance"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "tasks");
    assert_eq!(body["instructions"].as_array().map(Vec::len), Some(3));

    assert_eq!(set_field(&router, &base, "quoteLink", "https://x.com/q").await, StatusCode::OK);
    assert_eq!(set_field(&router, &base, "commentLink", "https://x.com/c").await, StatusCode::OK);
    let (_, body) = call(&router, request(Method::POST, &format!("{base}/advance"), None)).await;
    assert_eq!(body["phase"], "wallet");
    assert_eq!(body["submit_enabled"], true);

    assert_eq!(set_field(&router, &base, "walletAddress", "0xabc").await, StatusCode::OK);
    let (status, body) = call(&router, request(Method::POST, &format!("{base}/submit"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["phase"], "success");
    assert_eq!(body["receipt"]["disposition"], "delivered");
    assert_eq!(body["celebration"]["particle_count"], 150);
    assert_eq!(
        body["session"]["referral_link"],
        "https://example.com/void-walker/?ref=bob%20smith"
    );

    let (status, body) = call(&router, request(Method::GET, &format!("{base}/referral"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["referral_link"],
        "https://example.com/void-walker/?ref=bob%20smith"
    );
}

#[tokio::test]
async fn advance_without_name_is_unprocessable_with_notification() {
    let (service, _) = build_service(Arc::new(ScriptedEndpoint::default()));
    let router = waitlist_router(Arc::new(service));
    let (_, body) = call(
        &router,
        request(Method::POST, "/api/v1/waitlist/sessions", None),
    )
    .await;
    let session_id = body["session_id"].as_str().expect("id").to_string();

    let (status, body) = call(
        &router,
        request(
            Method::POST,
            &format!("/api/v1/waitlist/sessions/{session_id}/advance"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["notifications"][0]["variant"], "destructive");
    assert_eq!(body["notifications"][0]["title"], "Required");
}

#[tokio::test]
async fn endpoint_failure_maps_to_bad_gateway() {
    let endpoint = Arc::new(ScriptedEndpoint::failing(SubmissionError::Status {
        status: 400,
        message: Some("Already registered".to_string()),
    }));
    let (service, _) = build_service(endpoint);
    let router = waitlist_router(Arc::new(service));
    let (_, body) = call(
        &router,
        request(Method::POST, "/api/v1/waitlist/sessions", None),
    )
    .await;
    let base = format!(
        "/api/v1/waitlist/sessions/{}",
        body["session_id"].as_str().expect("id")
    );

    set_field(&router, &base, "twitterName", "alice").await;
    call(&router, request(Method::POST, &format!("{base}/advance"), None)).await;
    set_field(&router, &base, "quoteLink", "q").await;
    set_field(&router, &base, "commentLink", "c").await;
    call(&router, request(Method::POST, &format!("{base}/advance"), None)).await;
    set_field(&router, &base, "walletAddress", "0xabc").await;

    let (status, body) = call(&router, request(Method::POST, &format!("{base}/submit"), None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["notifications"][0]["description"], "Already registered");

    let (_, body) = call(&router, request(Method::GET, &base, None)).await;
    assert_eq!(body["phase"], "wallet");
    assert_eq!(body["fields"]["walletAddress"], "0xabc");
}

#[tokio::test]
async fn unknown_field_is_rejected_by_extractor() {
    let (service, _) = build_service(Arc::new(ScriptedEndpoint::default()));
    let router = waitlist_router(Arc::new(service));
    let (_, body) = call(
        &router,
        request(Method::POST, "/api/v1/waitlist/sessions", None),
    )
    .await;
    let base = format!(
        "/api/v1/waitlist/sessions/{}",
        body["session_id"].as_str().expect("id")
    );

    let response = router
        .clone()
        .oneshot(request(
            Method::PUT,
            &format!("{base}/fields"),
            Some(json!({ "field": "phase", "value": "success" })),
        ))
        .await
        .expect("router responds");
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn delete_discards_session() {
    let (service, repository) = build_service(Arc::new(ScriptedEndpoint::default()));
    let router = waitlist_router(Arc::new(service));
    let (_, body) = call(
        &router,
        request(Method::POST, "/api/v1/waitlist/sessions", None),
    )
    .await;
    let session_id = body["session_id"].as_str().expect("id").to_string();
    let base = format!("/api/v1/waitlist/sessions/{session_id}");

    let (status, _) = call(&router, request(Method::DELETE, &base, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(repository
        .fetch(&SessionId(session_id))
        .expect("fetch")
        .is_none());

    let (status, _) = call(&router, request(Method::GET, &base, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn error_status_covers_wizard_misuse() {
    let cases = [
        (
            WaitlistServiceError::Wizard(WizardError::SubmissionInFlight),
            StatusCode::CONFLICT,
        ),
        (
            WaitlistServiceError::Wizard(WizardError::ReferralUnavailable),
            StatusCode::CONFLICT,
        ),
        (
            WaitlistServiceError::Wizard(WizardError::Spam),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            WaitlistServiceError::Repository(RepositoryError::Unavailable("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error_status(&error), expected, "{error}");
    }
}
