use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Supported question kinds, as named by the survey API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Scale,
    MultipleChoice,
    OpenEnded,
}

impl QuestionType {
    /// Wire label used by the survey API.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Scale => "SCALE",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::OpenEnded => "OPEN_ENDED",
        }
    }

    /// Closed-ended questions constrain the answer to the option set.
    pub fn is_closed(&self) -> bool {
        !matches!(self, QuestionType::OpenEnded)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integer or text token. Used for option values and for raw user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Integer(i64),
    Text(String),
}

impl AnswerValue {
    /// Loose equality: `"5"` matches `5`, since selection widgets hand back text.
    pub fn matches(&self, other: &AnswerValue) -> bool {
        match (self, other) {
            (AnswerValue::Integer(left), AnswerValue::Integer(right)) => left == right,
            (AnswerValue::Text(left), AnswerValue::Text(right)) => left == right,
            (AnswerValue::Integer(number), AnswerValue::Text(text))
            | (AnswerValue::Text(text), AnswerValue::Integer(number)) => {
                text.trim().parse::<i64>().ok() == Some(*number)
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            AnswerValue::Integer(_) => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Integer(value) => write!(f, "{}", value),
            AnswerValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Integer(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

/// A selectable option of a closed-ended question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerOption {
    pub value: AnswerValue,
    pub text: String,
}

/// A single survey question as served by the question source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub question_id: String,
    /// Prompt text shown to the respondent.
    pub question: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub answers: Vec<AnswerOption>,
    /// Owning survey; filled from the enclosing survey when absent on the wire.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub survey_id: String,
}

impl Question {
    /// Returns the option whose value matches `value`, if any.
    pub fn option(&self, value: &AnswerValue) -> Option<&AnswerOption> {
        self.answers.iter().find(|option| option.value.matches(value))
    }
}
