use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use super::domain::WaitlistSubmission;

const GENERIC_FAILURE: &str = "Failed to join waitlist. Please try again.";
const INVALID_SUBMISSION: &str = "Invalid submission";

/// Body the spreadsheet script answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointAck {
    #[serde(alias = "result")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EndpointAck {
    pub fn accepted() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    fn is_error(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("error")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Remote failure while recording a waitlist entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("endpoint unreachable: {0}")]
    Network(String),
    #[error("endpoint answered with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("endpoint response was not understood: {0}")]
    MalformedResponse(String),
    #[error("endpoint rejected the submission")]
    Rejected { message: Option<String> },
}

impl SubmissionError {
    /// Best message available for the person filling in the form.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Status {
                status: 400,
                message,
            } => message
                .clone()
                .unwrap_or_else(|| INVALID_SUBMISSION.to_string()),
            SubmissionError::Status { message, .. } | SubmissionError::Rejected { message } => {
                message
                    .clone()
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string())
            }
            SubmissionError::Network(_) | SubmissionError::MalformedResponse(_) => {
                GENERIC_FAILURE.to_string()
            }
        }
    }
}

/// External service that durably records a completed waitlist entry.
pub trait SubmissionEndpoint: Send + Sync {
    fn submit(
        &self,
        payload: &WaitlistSubmission,
    ) -> impl Future<Output = Result<EndpointAck, SubmissionError>> + Send;
}

/// Maps a raw endpoint answer onto the success/failure contract.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<EndpointAck, SubmissionError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message)
            .filter(|message| !message.trim().is_empty());
        return Err(SubmissionError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let ack: EndpointAck = serde_json::from_str(body)
        .map_err(|err| SubmissionError::MalformedResponse(err.to_string()))?;

    if ack.is_error() {
        return Err(SubmissionError::Rejected {
            message: ack
                .message
                .filter(|message| !message.trim().is_empty()),
        });
    }

    Ok(ack)
}

/// Posts the payload as JSON with reqwest.
#[derive(Debug, Clone)]
pub struct HttpSubmissionEndpoint {
    client: reqwest::Client,
    url: Url,
}

impl HttpSubmissionEndpoint {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl SubmissionEndpoint for HttpSubmissionEndpoint {
    async fn submit(&self, payload: &WaitlistSubmission) -> Result<EndpointAck, SubmissionError> {
        info!(endpoint = %self.url, "posting waitlist submission");

        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|err| {
                error!("waitlist endpoint request failed: {err}");
                SubmissionError::Network(err.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            error!(%status, "unable to read waitlist endpoint body: {err}");
            SubmissionError::Network(err.to_string())
        })?;

        let result = interpret_response(status, &body);
        match &result {
            Ok(ack) => info!(%status, ack = %ack.status, "waitlist endpoint accepted submission"),
            Err(err) => error!(%status, "waitlist endpoint refused submission: {err}"),
        }
        result
    }
}
