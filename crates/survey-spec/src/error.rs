use thiserror::Error;

use crate::answers::ValidationResult;
use crate::spec::question::QuestionType;

/// Errors raised by session navigation, answer recording and record assembly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("invalid survey: {0}")]
    InvalidSurvey(String),
    #[error("question position {position} is outside 1..={len}")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("'{value}' is not an option of question '{question_id}'")]
    InvalidOption { question_id: String, value: String },
    #[error("question '{question_id}' expects a {expected} answer")]
    TypeMismatch {
        question_id: String,
        expected: QuestionType,
    },
    #[error("already at the last question")]
    NoNextQuestion,
    #[error("question '{question_id}' has not been answered")]
    Unanswered { question_id: String },
    #[error(
        "survey is incomplete: {} unanswered, {} invalid",
        .0.missing.len(),
        .0.errors.len()
    )]
    Incomplete(ValidationResult),
}
