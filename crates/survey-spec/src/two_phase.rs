//! Closed-ended scale questions followed by a single open-ended prompt,
//! validated and submitted as one batch.

use crate::answers::{AnswerRecord, Phase, Respondent, ValidationResult};
use crate::error::SessionError;
use crate::session::{SubmitReceipt, SurveySession};
use crate::spec::question::{AnswerValue, QuestionType};
use crate::spec::survey::Survey;

/// Which list the respondent is currently working through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Closed,
    Prompt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwoPhaseSession {
    closed: SurveySession,
    prompt: SurveySession,
    stage: Stage,
}

impl TwoPhaseSession {
    pub fn new(closed: Survey, prompt: Survey) -> Result<Self, SessionError> {
        if !closed.only_of_type(QuestionType::Scale) {
            return Err(SessionError::InvalidSurvey(format!(
                "survey '{}' must contain only SCALE questions",
                closed.survey_id
            )));
        }
        if prompt.questions.len() != 1 || !prompt.only_of_type(QuestionType::OpenEnded) {
            return Err(SessionError::InvalidSurvey(format!(
                "survey '{}' must contain exactly one OPEN_ENDED question",
                prompt.survey_id
            )));
        }
        Ok(Self {
            closed: SurveySession::new(closed)?,
            prompt: SurveySession::new(prompt)?,
            stage: Stage::Closed,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn closed(&self) -> &SurveySession {
        &self.closed
    }

    pub fn prompt(&self) -> &SurveySession {
        &self.prompt
    }

    /// The session that navigation and recording currently act on.
    pub fn active(&self) -> &SurveySession {
        match self.stage {
            Stage::Closed => &self.closed,
            Stage::Prompt => &self.prompt,
        }
    }

    fn active_mut(&mut self) -> &mut SurveySession {
        match self.stage {
            Stage::Closed => &mut self.closed,
            Stage::Prompt => &mut self.prompt,
        }
    }

    pub fn record_answer(
        &mut self,
        position: usize,
        value: impl Into<AnswerValue>,
    ) -> Result<(), SessionError> {
        self.active_mut().record_answer(position, value)
    }

    pub fn answer_current(&mut self, value: impl Into<AnswerValue>) -> Result<(), SessionError> {
        self.active_mut().answer_current(value)
    }

    /// Steps forward; the last answered closed question leads into the prompt.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        match self.stage {
            Stage::Closed if self.closed.is_last() => {
                if !self.closed.is_empty() && self.closed.current_answer().is_none() {
                    return Err(SessionError::Unanswered {
                        question_id: self
                            .closed
                            .current()
                            .map(|question| question.question_id.clone())
                            .unwrap_or_default(),
                    });
                }
                self.stage = Stage::Prompt;
                Ok(())
            }
            Stage::Closed => self.closed.advance(),
            Stage::Prompt => Err(SessionError::NoNextQuestion),
        }
    }

    /// Steps back; leaving the prompt returns to the last closed question.
    pub fn retreat(&mut self) {
        match self.stage {
            Stage::Prompt => {
                self.stage = Stage::Closed;
                self.closed.seek_last();
            }
            Stage::Closed => self.closed.retreat(),
        }
    }

    pub fn answered_count(&self) -> usize {
        self.closed.answered_count() + self.prompt.answered_count()
    }

    pub fn len(&self) -> usize {
        self.closed.len() + self.prompt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Combined validation over both lists.
    pub fn validate(&self) -> ValidationResult {
        let mut result = self.closed.validate();
        let prompt = self.prompt.validate();
        result.missing.extend(prompt.missing);
        result.errors.extend(prompt.errors);
        result.valid = result.missing.is_empty() && result.errors.is_empty();
        result
    }

    pub fn is_complete(&self) -> bool {
        self.validate().valid
    }

    /// Closed records first, then the prompt record, each tagged with its own survey id.
    pub fn build_records(
        &self,
        respondent: &Respondent,
        phase: Phase,
    ) -> Result<Vec<AnswerRecord>, SessionError> {
        let validation = self.validate();
        if !validation.valid {
            return Err(SessionError::Incomplete(validation));
        }
        let mut records = self.closed.records_unchecked(respondent, phase);
        records.extend(self.prompt.records_unchecked(respondent, phase));
        Ok(records)
    }

    pub fn receipt(&self) -> Option<&SubmitReceipt> {
        self.prompt.receipt()
    }

    pub fn mark_submitted(&mut self, receipt: SubmitReceipt) {
        self.closed.mark_submitted(receipt.clone());
        self.prompt.mark_submitted(receipt);
    }
}
