//! Single-list survey session: navigation, answer recording and record assembly.

use serde::{Deserialize, Serialize};

use crate::answers::{Answer, AnswerRecord, Phase, Respondent, ValidationResult};
use crate::error::SessionError;
use crate::spec::question::{AnswerValue, Question};
use crate::spec::survey::Survey;
use crate::validate::{AnswerMap, validate};

/// Opaque acknowledgement stored on a session once its batch was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub token: String,
    pub records: usize,
}

/// In-progress walk through one survey's questions.
///
/// `current_index` is 0-based and always points inside the question list
/// (it stays 0 for an empty survey). Positions taken by the public API are
/// 1-based, matching display order.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveySession {
    survey: Survey,
    current_index: usize,
    answers: AnswerMap,
    receipt: Option<SubmitReceipt>,
}

impl SurveySession {
    pub fn new(survey: Survey) -> Result<Self, SessionError> {
        let survey = survey.normalized();
        survey.check()?;
        Ok(Self {
            survey,
            current_index: 0,
            answers: AnswerMap::new(),
            receipt: None,
        })
    }

    pub fn survey_id(&self) -> &str {
        &self.survey.survey_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.survey.questions
    }

    pub fn len(&self) -> usize {
        self.survey.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.survey.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 1-based position of the current question.
    pub fn position(&self) -> usize {
        self.current_index + 1
    }

    pub fn current(&self) -> Option<&Question> {
        self.survey.questions.get(self.current_index)
    }

    pub fn current_answer(&self) -> Option<&Answer> {
        self.current()
            .and_then(|question| self.answers.get(&question.question_id))
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn answer(&self, position: usize) -> Option<&Answer> {
        let question = self.question_at(position).ok()?;
        self.answers.get(&question.question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.survey
            .questions
            .iter()
            .filter(|question| self.answers.contains_key(&question.question_id))
            .count()
    }

    pub fn receipt(&self) -> Option<&SubmitReceipt> {
        self.receipt.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.receipt.is_some()
    }

    pub fn question_at(&self, position: usize) -> Result<&Question, SessionError> {
        position
            .checked_sub(1)
            .and_then(|index| self.survey.questions.get(index))
            .ok_or(SessionError::PositionOutOfRange {
                position,
                len: self.len(),
            })
    }

    /// Sets or overwrites the answer at `position`. The session is unchanged on error.
    pub fn record_answer(
        &mut self,
        position: usize,
        value: impl Into<AnswerValue>,
    ) -> Result<(), SessionError> {
        let question = self.question_at(position)?;
        let answer = Answer::for_question(question, value.into())?;
        let question_id = question.question_id.clone();
        self.answers.insert(question_id, answer);
        Ok(())
    }

    /// Records an answer for the question under the cursor.
    pub fn answer_current(&mut self, value: impl Into<AnswerValue>) -> Result<(), SessionError> {
        self.record_answer(self.position(), value)
    }

    pub fn clear_answer(&mut self, position: usize) -> Result<Option<Answer>, SessionError> {
        let question_id = self.question_at(position)?.question_id.clone();
        Ok(self.answers.remove(&question_id))
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.len()
    }

    pub fn can_advance(&self) -> bool {
        !self.is_last() && self.current_answer().is_some()
    }

    pub fn can_retreat(&self) -> bool {
        self.current_index > 0
    }

    /// Moves to the next question; blocked at the end and while the current
    /// question is unanswered.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        if self.is_last() {
            return Err(SessionError::NoNextQuestion);
        }
        if self.current_answer().is_none() {
            return Err(SessionError::Unanswered {
                question_id: self.current_question_id(),
            });
        }
        self.current_index += 1;
        Ok(())
    }

    /// Moves back one question, clamped at the first.
    pub fn retreat(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
    }

    /// Jumps to the last question; used when re-entering a phase from behind.
    pub fn seek_last(&mut self) {
        self.current_index = self.len().saturating_sub(1);
    }

    pub fn validate(&self) -> ValidationResult {
        validate(&self.survey.questions, &self.answers)
    }

    pub fn is_complete(&self) -> bool {
        self.validate().valid
    }

    /// One record per question in display order; fails unless complete.
    pub fn build_records(
        &self,
        respondent: &Respondent,
        phase: Phase,
    ) -> Result<Vec<AnswerRecord>, SessionError> {
        let validation = self.validate();
        if !validation.valid {
            return Err(SessionError::Incomplete(validation));
        }
        Ok(self.records_unchecked(respondent, phase))
    }

    pub(crate) fn records_unchecked(
        &self,
        respondent: &Respondent,
        phase: Phase,
    ) -> Vec<AnswerRecord> {
        self.survey
            .questions
            .iter()
            .filter_map(|question| {
                self.answers
                    .get(&question.question_id)
                    .map(|answer| AnswerRecord::new(respondent, phase, question, answer))
            })
            .collect()
    }

    pub fn mark_submitted(&mut self, receipt: SubmitReceipt) {
        self.receipt = Some(receipt);
    }

    fn current_question_id(&self) -> String {
        self.current()
            .map(|question| question.question_id.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::question::{AnswerOption, QuestionType};

    fn scale(id: &str) -> Question {
        Question {
            question_id: id.into(),
            question: format!("How would you rate {}?", id),
            question_type: QuestionType::Scale,
            answers: (1..=5)
                .map(|value| AnswerOption {
                    value: AnswerValue::Integer(value),
                    text: value.to_string(),
                })
                .collect(),
            survey_id: String::new(),
        }
    }

    fn session(ids: &[&str]) -> SurveySession {
        let questions = ids.iter().map(|id| scale(id)).collect();
        SurveySession::new(Survey::new("s1", questions)).expect("valid survey")
    }

    #[test]
    fn advance_requires_answer_and_stops_at_end() {
        let mut session = session(&["q1", "q2"]);
        assert!(matches!(
            session.advance(),
            Err(SessionError::Unanswered { .. })
        ));
        assert_eq!(session.current_index(), 0);

        session.record_answer(1, 3).unwrap();
        session.advance().unwrap();
        assert_eq!(session.current_index(), 1);

        session.record_answer(2, 4).unwrap();
        assert_eq!(session.advance(), Err(SessionError::NoNextQuestion));
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn retreat_clamps_at_first_question() {
        let mut session = session(&["q1", "q2"]);
        session.retreat();
        assert_eq!(session.current_index(), 0);
        session.record_answer(1, 1).unwrap();
        session.advance().unwrap();
        session.retreat();
        session.retreat();
        assert_eq!(session.current_index(), 0);
        assert!(session.answer(1).is_some());
    }

    #[test]
    fn invalid_option_leaves_session_unchanged() {
        let mut session = session(&["q1"]);
        session.record_answer(1, 2).unwrap();
        let before = session.clone();
        let err = session.record_answer(1, 9).unwrap_err();
        assert!(matches!(err, SessionError::InvalidOption { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn position_out_of_range_is_rejected() {
        let mut session = session(&["q1"]);
        assert!(matches!(
            session.record_answer(0, 1),
            Err(SessionError::PositionOutOfRange { position: 0, len: 1 })
        ));
        assert!(matches!(
            session.record_answer(2, 1),
            Err(SessionError::PositionOutOfRange { position: 2, len: 1 })
        ));
    }

    #[test]
    fn text_token_matches_integer_option() {
        let mut session = session(&["q1"]);
        session.record_answer(1, "4").unwrap();
        assert_eq!(
            session.answer(1),
            Some(&Answer::Scale {
                value: AnswerValue::Integer(4)
            })
        );
    }

    #[test]
    fn empty_survey_is_complete() {
        let mut session = session(&[]);
        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert_eq!(session.advance(), Err(SessionError::NoNextQuestion));
        let records = session
            .build_records(&Respondent::new("doej"), Phase::Pre)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let survey = Survey::new("s1", vec![scale("q1"), scale("q1")]);
        assert!(matches!(
            SurveySession::new(survey),
            Err(SessionError::InvalidSurvey(_))
        ));
    }
}
