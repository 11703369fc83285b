//! reqwest-backed implementation of the question source and answer sink.

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use survey_spec::{AnswerRecord, Survey};

use crate::api::{AnswerSink, QuestionSource};
use crate::config::ClientConfig;
use crate::error::ApiError;

const DETAILS_PATH: &str = "survey/details";
const ANSWER_PATH: &str = "survey/questions/answer";

/// Client for `GET /survey/details` and `POST /survey/questions/answer`.
#[derive(Debug, Clone)]
pub struct HttpSurveyApi {
    http_client: Client,
    config: ClientConfig,
}

impl HttpSurveyApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("survey API error: {} - {}", status, body);
        Err(ApiError::Status { status, body })
    }
}

#[async_trait]
impl QuestionSource for HttpSurveyApi {
    async fn fetch_survey(&self, survey_id: &str) -> Result<Survey, ApiError> {
        let url = self.config.endpoint(DETAILS_PATH);
        debug!("Fetching survey {} from {}", survey_id, url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("survey_id", survey_id)])
            .send()
            .await
            .map_err(ApiError::Transport)?;
        let response = Self::check_status(response).await?;
        let body = response.text().await.map_err(ApiError::Transport)?;
        let survey: Survey = serde_json::from_str(&body).map_err(ApiError::Decode)?;

        debug!(
            "Fetched survey {} with {} questions",
            survey.survey_id,
            survey.questions.len()
        );
        Ok(survey.normalized())
    }
}

#[async_trait]
impl AnswerSink for HttpSurveyApi {
    async fn submit_answers(&self, records: &[AnswerRecord]) -> Result<(), ApiError> {
        let url = self.config.endpoint(ANSWER_PATH);
        debug!("Posting {} answer records to {}", records.len(), url);

        let response = self
            .http_client
            .post(&url)
            .json(records)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::check_status(response).await?;
        Ok(())
    }
}
