use crate::answers::{AnswerRecord, Phase, Respondent, ValidationResult};
use crate::error::SessionError;
use crate::session::{SubmitReceipt, SurveySession};
use crate::two_phase::TwoPhaseSession;

/// Anything that can be turned into one answer batch.
pub trait Submittable {
    fn validate(&self) -> ValidationResult;
    fn build_records(
        &self,
        respondent: &Respondent,
        phase: Phase,
    ) -> Result<Vec<AnswerRecord>, SessionError>;
    fn receipt(&self) -> Option<&SubmitReceipt>;
    fn mark_submitted(&mut self, receipt: SubmitReceipt);
}

impl Submittable for SurveySession {
    fn validate(&self) -> ValidationResult {
        SurveySession::validate(self)
    }

    fn build_records(
        &self,
        respondent: &Respondent,
        phase: Phase,
    ) -> Result<Vec<AnswerRecord>, SessionError> {
        SurveySession::build_records(self, respondent, phase)
    }

    fn receipt(&self) -> Option<&SubmitReceipt> {
        SurveySession::receipt(self)
    }

    fn mark_submitted(&mut self, receipt: SubmitReceipt) {
        SurveySession::mark_submitted(self, receipt)
    }
}

impl Submittable for TwoPhaseSession {
    fn validate(&self) -> ValidationResult {
        TwoPhaseSession::validate(self)
    }

    fn build_records(
        &self,
        respondent: &Respondent,
        phase: Phase,
    ) -> Result<Vec<AnswerRecord>, SessionError> {
        TwoPhaseSession::build_records(self, respondent, phase)
    }

    fn receipt(&self) -> Option<&SubmitReceipt> {
        TwoPhaseSession::receipt(self)
    }

    fn mark_submitted(&mut self, receipt: SubmitReceipt) {
        TwoPhaseSession::mark_submitted(self, receipt)
    }
}
