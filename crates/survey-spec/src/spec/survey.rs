use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::spec::question::{Question, QuestionType};

/// Survey details as returned by `GET /survey/details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Survey {
    pub survey_id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Survey {
    pub fn new(survey_id: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            survey_id: survey_id.into(),
            questions,
        }
        .normalized()
    }

    /// Stamps every question with the owning survey id.
    pub fn normalized(mut self) -> Self {
        for question in &mut self.questions {
            if question.survey_id.is_empty() {
                question.survey_id = self.survey_id.clone();
            }
        }
        self
    }

    /// Structural checks applied before a session is opened.
    pub fn check(&self) -> Result<(), SessionError> {
        let mut seen = BTreeSet::new();
        for question in &self.questions {
            if !seen.insert(question.question_id.as_str()) {
                return Err(SessionError::InvalidSurvey(format!(
                    "duplicate question id '{}'",
                    question.question_id
                )));
            }
            if question.question_type.is_closed() && question.answers.is_empty() {
                return Err(SessionError::InvalidSurvey(format!(
                    "question '{}' is {} but has no answer options",
                    question.question_id, question.question_type
                )));
            }
        }
        Ok(())
    }

    pub fn only_of_type(&self, kind: QuestionType) -> bool {
        self.questions
            .iter()
            .all(|question| question.question_type == kind)
    }
}
