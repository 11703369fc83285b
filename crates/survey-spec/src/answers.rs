use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::spec::question::{AnswerValue, Question, QuestionType};

/// Recorded response to one question, tagged by question kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    Scale { value: AnswerValue },
    Choice { value: AnswerValue },
    OpenEnded { text: String },
}

impl Answer {
    /// Builds the answer for `question`, rejecting values outside the option set.
    ///
    /// Open-ended text is accepted as typed, empty included; emptiness is only
    /// checked when the session is validated.
    pub fn for_question(question: &Question, value: AnswerValue) -> Result<Self, SessionError> {
        match question.question_type {
            QuestionType::OpenEnded => match value {
                AnswerValue::Text(text) => Ok(Answer::OpenEnded { text }),
                AnswerValue::Integer(_) => Err(SessionError::TypeMismatch {
                    question_id: question.question_id.clone(),
                    expected: QuestionType::OpenEnded,
                }),
            },
            kind => {
                let option =
                    question
                        .option(&value)
                        .ok_or_else(|| SessionError::InvalidOption {
                            question_id: question.question_id.clone(),
                            value: value.to_string(),
                        })?;
                let value = option.value.clone();
                Ok(if kind == QuestionType::Scale {
                    Answer::Scale { value }
                } else {
                    Answer::Choice { value }
                })
            }
        }
    }

    /// Whether the answer fulfils the non-emptiness rule of `question`.
    pub fn is_satisfied(&self, question: &Question) -> bool {
        match (self, question.question_type) {
            (Answer::OpenEnded { text }, QuestionType::OpenEnded) => !text.trim().is_empty(),
            (Answer::Scale { value }, QuestionType::Scale)
            | (Answer::Choice { value }, QuestionType::MultipleChoice) => {
                question.option(value).is_some()
            }
            _ => false,
        }
    }

    pub fn value(&self) -> Option<&AnswerValue> {
        match self {
            Answer::Scale { value } | Answer::Choice { value } => Some(value),
            Answer::OpenEnded { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::OpenEnded { text } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Scale { value } | Answer::Choice { value } => write!(f, "{}", value),
            Answer::OpenEnded { text } => f.write_str(text),
        }
    }
}

/// When the survey is administered relative to the main experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Phase {
    Pre,
    Post,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pre => "Pre",
            Phase::Post => "Post",
        }
    }
}

/// Identifies who is answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
    pub utorid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl Respondent {
    pub fn new(utorid: impl Into<String>) -> Self {
        Self {
            utorid: utorid.into(),
            conversation_id: None,
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Wire shape of one submitted answer (`POST /survey/questions/answer`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerRecord {
    pub utorid: String,
    pub question_type: QuestionType,
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub survey_type: Phase,
    pub survey_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_ended_answer: Option<String>,
}

impl AnswerRecord {
    pub fn new(respondent: &Respondent, phase: Phase, question: &Question, answer: &Answer) -> Self {
        Self {
            utorid: respondent.utorid.clone(),
            question_type: question.question_type,
            question_id: question.question_id.clone(),
            conversation_id: respondent.conversation_id.clone(),
            survey_type: phase,
            survey_id: question.survey_id.clone(),
            answer: answer.value().cloned(),
            open_ended_answer: answer.text().map(str::to_string),
        }
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub question_id: String,
    pub message: String,
    pub code: String,
}

/// Outcome of checking a response map against its questions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}
