use std::collections::BTreeMap;

use serde_json::Value;

use crate::answers::{Answer, ValidationError, ValidationResult};
use crate::error::SessionError;
use crate::spec::question::{AnswerValue, Question, QuestionType};
use crate::spec::survey::Survey;

/// Responses keyed by question id.
pub type AnswerMap = BTreeMap<String, Answer>;

/// Checks that every question has an entry satisfying its type's rule.
pub fn validate(questions: &[Question], answers: &AnswerMap) -> ValidationResult {
    let mut missing = Vec::new();
    let mut errors = Vec::new();

    for question in questions {
        match answers.get(&question.question_id) {
            None => missing.push(question.question_id.clone()),
            Some(answer) => {
                if let Some(error) = validate_answer(question, answer) {
                    errors.push(error);
                }
            }
        }
    }

    ValidationResult {
        valid: missing.is_empty() && errors.is_empty(),
        missing,
        errors,
    }
}

fn validate_answer(question: &Question, answer: &Answer) -> Option<ValidationError> {
    if answer.is_satisfied(question) {
        return None;
    }
    let (message, code) = match (answer, question.question_type) {
        (Answer::OpenEnded { .. }, QuestionType::OpenEnded) => ("answer is empty", "empty_answer"),
        (Answer::Scale { .. }, QuestionType::Scale)
        | (Answer::Choice { .. }, QuestionType::MultipleChoice) => {
            ("answer is not one of the options", "invalid_option")
        }
        _ => ("answer kind does not match question type", "type_mismatch"),
    };
    Some(base_error(question, message, code))
}

/// Validates a raw `{ "<question_id>": value }` document against a survey.
pub fn validate_json(survey: &Survey, answers: &Value) -> ValidationResult {
    let answers_map = answers.as_object().cloned().unwrap_or_default();
    let mut parsed = AnswerMap::new();
    let mut errors = Vec::new();

    for question in &survey.questions {
        let Some(raw) = answers_map.get(&question.question_id) else {
            continue;
        };
        let converted = raw_to_value(raw)
            .ok_or_else(|| SessionError::TypeMismatch {
                question_id: question.question_id.clone(),
                expected: question.question_type,
            })
            .and_then(|value| Answer::for_question(question, value));
        match converted {
            Ok(answer) => {
                parsed.insert(question.question_id.clone(), answer);
            }
            Err(err) => errors.push(base_error(question, &err.to_string(), error_code(&err))),
        }
    }

    let mut result = validate(&survey.questions, &parsed);
    let rejected: Vec<&str> = errors.iter().map(|e| e.question_id.as_str()).collect();
    result.missing.retain(|id| !rejected.contains(&id.as_str()));
    result.errors.extend(errors);

    for key in answers_map.keys() {
        if !survey.questions.iter().any(|q| &q.question_id == key) {
            result.errors.push(ValidationError {
                question_id: key.clone(),
                message: "no such question in survey".into(),
                code: "unknown_question".into(),
            });
        }
    }

    result.valid = result.missing.is_empty() && result.errors.is_empty();
    result
}

fn raw_to_value(raw: &Value) -> Option<AnswerValue> {
    match raw {
        Value::String(text) => Some(AnswerValue::Text(text.clone())),
        Value::Number(number) => number.as_i64().map(AnswerValue::Integer),
        _ => None,
    }
}

fn error_code(err: &SessionError) -> &'static str {
    match err {
        SessionError::InvalidOption { .. } => "invalid_option",
        _ => "type_mismatch",
    }
}

fn base_error(question: &Question, message: &str, code: &str) -> ValidationError {
    ValidationError {
        question_id: question.question_id.clone(),
        message: message.into(),
        code: code.into(),
    }
}
