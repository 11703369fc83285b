use reqwest::StatusCode;
use thiserror::Error;

use survey_spec::{SessionError, ValidationResult};

/// Failures talking to the survey REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors surfaced by the survey controller. None of them are retried.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("failed to fetch survey '{survey_id}': {source}")]
    FetchFailed {
        survey_id: String,
        #[source]
        source: ApiError,
    },
    #[error("please answer all questions ({} unanswered, {} invalid)", .0.missing.len(), .0.errors.len())]
    ValidationFailed(ValidationResult),
    #[error("failed to submit answers: {0}")]
    SubmitFailed(#[source] ApiError),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("answers for this session were already submitted")]
    AlreadySubmitted,
    #[error("session was abandoned before the survey loaded")]
    Abandoned,
    #[error(transparent)]
    Session(#[from] SessionError),
}
