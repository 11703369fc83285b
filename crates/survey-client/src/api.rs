use async_trait::async_trait;

use survey_spec::{AnswerRecord, Survey};

use crate::error::ApiError;

/// Supplies the ordered question list of a survey.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_survey(&self, survey_id: &str) -> Result<Survey, ApiError>;
}

/// Persists an answer batch; all-or-nothing from the caller's point of view.
#[async_trait]
pub trait AnswerSink: Send + Sync {
    async fn submit_answers(&self, records: &[AnswerRecord]) -> Result<(), ApiError>;
}
