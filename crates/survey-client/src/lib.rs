//! Survey controller and REST client for the survey API.
//!
//! The controller owns the session boundaries: it fetches questions from a
//! [`QuestionSource`] when a session starts and hands the finished batch to an
//! [`AnswerSink`]. [`HttpSurveyApi`] implements both against the remote API.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;

pub use api::{AnswerSink, QuestionSource};
pub use config::ClientConfig;
pub use controller::{SubmitResult, SurveyController};
pub use error::{ApiError, SurveyError};
pub use http::HttpSurveyApi;
pub use tokio_util::sync::CancellationToken;

/// Builds a controller whose question source and answer sink share one HTTP client.
pub fn http_controller(
    config: ClientConfig,
    respondent: survey_spec::Respondent,
    phase: survey_spec::Phase,
) -> Result<SurveyController, ApiError> {
    let api = std::sync::Arc::new(HttpSurveyApi::new(config)?);
    Ok(SurveyController::new(api.clone(), api, respondent, phase))
}
