//! Session boundaries: fetching questions at start and submitting the batch at the end.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use survey_spec::{
    AnswerRecord, Phase, Respondent, SubmitReceipt, Submittable, Survey, SurveySession,
    TwoPhaseSession,
};

use crate::api::{AnswerSink, QuestionSource};
use crate::error::SurveyError;

/// Returned when the answer sink accepted a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitResult {
    pub receipt: SubmitReceipt,
    pub records: Vec<AnswerRecord>,
}

/// Drives survey sessions for one respondent and phase.
///
/// Talks to the question source when a session starts and to the answer sink
/// when it is submitted; nothing is sent per question.
pub struct SurveyController {
    source: Arc<dyn QuestionSource>,
    sink: Arc<dyn AnswerSink>,
    respondent: Respondent,
    phase: Phase,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the submission future finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SurveyController {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        sink: Arc<dyn AnswerSink>,
        respondent: Respondent,
        phase: Phase,
    ) -> Self {
        Self {
            source,
            sink,
            respondent,
            phase,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn respondent(&self) -> &Respondent {
        &self.respondent
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetches the questions of `survey_id` and opens a session at the first one.
    ///
    /// Fails with [`SurveyError::FetchFailed`] when the source errors, and with
    /// [`SurveyError::Session`] carrying `InvalidSurvey` when the fetched survey
    /// repeats a question id or has a closed question without options.
    pub async fn start(&self, survey_id: &str) -> Result<SurveySession, SurveyError> {
        let survey = self.fetch(survey_id).await?;
        if survey.survey_id != survey_id {
            debug!(
                "requested survey {} but received {}",
                survey_id, survey.survey_id
            );
        }
        Ok(SurveySession::new(survey)?)
    }

    /// Like [`start`](Self::start), but yields [`SurveyError::Abandoned`] when
    /// `cancel` fires first. A fetch that resolves afterwards is dropped.
    pub async fn start_cancellable(
        &self,
        survey_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SurveySession, SurveyError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("survey {} abandoned before it loaded", survey_id);
                Err(SurveyError::Abandoned)
            }
            result = self.start(survey_id) => result,
        }
    }

    /// Fetches the scale list and then the open-ended prompt, one request at a time.
    pub async fn start_two_phase(
        &self,
        closed_survey_id: &str,
        prompt_survey_id: &str,
    ) -> Result<TwoPhaseSession, SurveyError> {
        let closed = self.fetch(closed_survey_id).await?;
        let prompt = self.fetch(prompt_survey_id).await?;
        Ok(TwoPhaseSession::new(closed, prompt)?)
    }

    async fn fetch(&self, survey_id: &str) -> Result<Survey, SurveyError> {
        self.source
            .fetch_survey(survey_id)
            .await
            .map_err(|source| SurveyError::FetchFailed {
                survey_id: survey_id.to_string(),
                source,
            })
    }

    /// Validates the session and hands its whole batch to the answer sink.
    ///
    /// Incomplete sessions fail without a network call. On any failure the
    /// session keeps its answers so the caller can resubmit.
    pub async fn submit<S>(&self, session: &mut S) -> Result<SubmitResult, SurveyError>
    where
        S: Submittable + Send + ?Sized,
    {
        if session.receipt().is_some() {
            return Err(SurveyError::AlreadySubmitted);
        }
        let validation = session.validate();
        if !validation.valid {
            return Err(SurveyError::ValidationFailed(validation));
        }
        let records = session
            .build_records(&self.respondent, self.phase)
            .map_err(|_| SurveyError::ValidationFailed(session.validate()))?;

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("submission refused: another batch is still outstanding");
            return Err(SurveyError::SubmissionInFlight);
        };

        if records.is_empty() {
            debug!("survey has no questions; nothing to submit");
        } else {
            self.sink
                .submit_answers(&records)
                .await
                .map_err(SurveyError::SubmitFailed)?;
        }

        let receipt = SubmitReceipt {
            token: Uuid::new_v4().to_string(),
            records: records.len(),
        };
        session.mark_submitted(receipt.clone());
        info!(
            "submitted {} {} answers for {}",
            receipt.records,
            self.phase.as_str(),
            self.respondent.utorid
        );
        Ok(SubmitResult { receipt, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use survey_spec::AnswerValue;
    use tokio::sync::Notify;

    use crate::error::ApiError;

    #[derive(Default)]
    struct FakeSource {
        surveys: Vec<Survey>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QuestionSource for FakeSource {
        async fn fetch_survey(&self, survey_id: &str) -> Result<Survey, ApiError> {
            self.calls.lock().unwrap().push(survey_id.to_string());
            if self.fail {
                return Err(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".into(),
                });
            }
            self.surveys
                .iter()
                .find(|survey| survey.survey_id == survey_id)
                .cloned()
                .ok_or_else(|| ApiError::Status {
                    status: StatusCode::NOT_FOUND,
                    body: String::new(),
                })
        }
    }

    #[derive(Default)]
    struct FakeSink {
        batches: Mutex<Vec<Vec<AnswerRecord>>>,
        reject: bool,
        gate: Option<Notify>,
    }

    #[async_trait]
    impl AnswerSink for FakeSink {
        async fn submit_answers(&self, records: &[AnswerRecord]) -> Result<(), ApiError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.reject {
                return Err(ApiError::Status {
                    status: StatusCode::BAD_REQUEST,
                    body: "invalid".into(),
                });
            }
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(())
        }
    }

    /// Parks every fetch until cancelled; used to model a slow network.
    struct PendingSource;

    #[async_trait]
    impl QuestionSource for PendingSource {
        async fn fetch_survey(&self, _survey_id: &str) -> Result<Survey, ApiError> {
            std::future::pending::<Result<Survey, ApiError>>().await
        }
    }

    fn scale_survey(id: &str) -> Survey {
        serde_json::from_value(json!({
            "survey_id": id,
            "questions": [{
                "question_id": "q1",
                "question": "Rate it",
                "question_type": "SCALE",
                "answers": [{ "value": 1, "text": "Low" }, { "value": 5, "text": "High" }]
            }]
        }))
        .unwrap()
    }

    fn prompt_survey(id: &str) -> Survey {
        serde_json::from_value(json!({
            "survey_id": id,
            "questions": [{
                "question_id": "open1",
                "question": "Anything else?",
                "question_type": "OPEN_ENDED"
            }]
        }))
        .unwrap()
    }

    fn controller(
        source: FakeSource,
        sink: Arc<FakeSink>,
        phase: Phase,
    ) -> (SurveyController, Arc<FakeSource>) {
        let source = Arc::new(source);
        let controller = SurveyController::new(
            source.clone(),
            sink,
            Respondent::new("doej").with_conversation("conv-9"),
            phase,
        );
        (controller, source)
    }

    #[tokio::test]
    async fn start_then_submit_sends_one_batch() {
        let sink = Arc::new(FakeSink::default());
        let source = FakeSource {
            surveys: vec![scale_survey("pre")],
            ..Default::default()
        };
        let (controller, _) = controller(source, sink.clone(), Phase::Pre);

        let mut session = controller.start("pre").await.expect("start");
        assert_eq!(session.current_index(), 0);
        session.record_answer(1, 5).unwrap();

        let result = controller.submit(&mut session).await.expect("submit");
        assert_eq!(result.receipt.records, 1);
        assert_eq!(session.receipt(), Some(&result.receipt));

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].answer, Some(AnswerValue::Integer(5)));
        assert_eq!(batches[0][0].survey_type, Phase::Pre);
        assert_eq!(batches[0][0].question_id, "q1");
    }

    #[tokio::test]
    async fn start_surfaces_fetch_failure() {
        let source = FakeSource {
            fail: true,
            ..Default::default()
        };
        let (controller, source) = controller(source, Arc::new(FakeSink::default()), Phase::Pre);

        let err = controller.start("pre").await.unwrap_err();
        assert!(matches!(err, SurveyError::FetchFailed { ref survey_id, .. } if survey_id == "pre"));
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn incomplete_session_is_not_sent() {
        let sink = Arc::new(FakeSink::default());
        let source = FakeSource {
            surveys: vec![scale_survey("pre")],
            ..Default::default()
        };
        let (controller, _) = controller(source, sink.clone(), Phase::Pre);

        let mut session = controller.start("pre").await.unwrap();
        let err = controller.submit(&mut session).await.unwrap_err();
        match err {
            SurveyError::ValidationFailed(validation) => assert_eq!(validation.missing, vec!["q1"]),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(sink.batches.lock().unwrap().is_empty());
        assert!(!controller.is_submitting());
    }

    #[tokio::test]
    async fn rejected_batch_keeps_answers_for_resubmission() {
        let rejecting = Arc::new(FakeSink {
            reject: true,
            ..Default::default()
        });
        let source = FakeSource {
            surveys: vec![scale_survey("pre")],
            ..Default::default()
        };
        let (controller, _) = controller(source, rejecting, Phase::Pre);
        let mut session = controller.start("pre").await.unwrap();
        session.record_answer(1, 1).unwrap();

        let err = controller.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, SurveyError::SubmitFailed(ApiError::Status { .. })));
        assert!(session.receipt().is_none());
        assert!(session.is_complete());

        let accepting = Arc::new(FakeSink::default());
        let retry = SurveyController::new(
            Arc::new(FakeSource::default()),
            accepting.clone(),
            Respondent::new("doej"),
            Phase::Pre,
        );
        retry.submit(&mut session).await.expect("resubmit");
        assert_eq!(accepting.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_submit_of_same_session_is_refused() {
        let sink = Arc::new(FakeSink::default());
        let source = FakeSource {
            surveys: vec![scale_survey("pre")],
            ..Default::default()
        };
        let (controller, _) = controller(source, sink.clone(), Phase::Pre);
        let mut session = controller.start("pre").await.unwrap();
        session.record_answer(1, 5).unwrap();

        controller.submit(&mut session).await.unwrap();
        let err = controller.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, SurveyError::AlreadySubmitted));
        assert_eq!(sink.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_submission_is_single_flight() {
        let sink = Arc::new(FakeSink {
            gate: Some(Notify::new()),
            ..Default::default()
        });
        let source = FakeSource {
            surveys: vec![scale_survey("pre")],
            ..Default::default()
        };
        let (controller, _) = controller(source, sink.clone(), Phase::Pre);
        let mut first = controller.start("pre").await.unwrap();
        let mut second = controller.start("pre").await.unwrap();
        first.record_answer(1, 1).unwrap();
        second.record_answer(1, 5).unwrap();

        let (first_result, second_result) = tokio::join!(controller.submit(&mut first), async {
            let result = controller.submit(&mut second).await;
            if let Some(gate) = &sink.gate {
                gate.notify_one();
            }
            result
        });

        assert!(first_result.is_ok());
        assert!(matches!(second_result, Err(SurveyError::SubmissionInFlight)));
        assert!(second.receipt().is_none());
        assert!(!controller.is_submitting());
        assert_eq!(sink.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_survey_submits_without_network_call() {
        let sink = Arc::new(FakeSink::default());
        let empty: Survey =
            serde_json::from_value(json!({ "survey_id": "empty", "questions": [] })).unwrap();
        let source = FakeSource {
            surveys: vec![empty],
            ..Default::default()
        };
        let (controller, _) = controller(source, sink.clone(), Phase::Pre);

        let mut session = controller.start("empty").await.unwrap();
        assert!(session.is_complete());
        let result = controller.submit(&mut session).await.expect("submit");
        assert!(result.records.is_empty());
        assert_eq!(result.receipt.records, 0);
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_rejects_survey_with_repeated_question_ids() {
        let repeated: Survey = serde_json::from_value(json!({
            "survey_id": "dup",
            "questions": [
                { "question_id": "q1", "question": "First", "question_type": "OPEN_ENDED" },
                { "question_id": "q1", "question": "Again", "question_type": "OPEN_ENDED" }
            ]
        }))
        .unwrap();
        let source = FakeSource {
            surveys: vec![repeated],
            ..Default::default()
        };
        let (controller, _) = controller(source, Arc::new(FakeSink::default()), Phase::Pre);

        let err = controller.start("dup").await.unwrap_err();
        assert!(matches!(
            err,
            SurveyError::Session(survey_spec::SessionError::InvalidSurvey(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_start_is_abandoned() {
        let controller = SurveyController::new(
            Arc::new(PendingSource),
            Arc::new(FakeSink::default()),
            Respondent::new("doej"),
            Phase::Pre,
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move { trigger.cancel() });

        let err = controller
            .start_cancellable("pre", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SurveyError::Abandoned));
    }

    #[tokio::test]
    async fn two_phase_batch_carries_both_survey_ids() {
        let sink = Arc::new(FakeSink::default());
        let source = FakeSource {
            surveys: vec![scale_survey("post-scale"), prompt_survey("post-prompt")],
            ..Default::default()
        };
        let (controller, source) = controller(source, sink.clone(), Phase::Post);

        let mut session = controller
            .start_two_phase("post-scale", "post-prompt")
            .await
            .expect("start");
        assert_eq!(
            *source.calls.lock().unwrap(),
            vec!["post-scale".to_string(), "post-prompt".to_string()]
        );

        session.record_answer(1, 5).unwrap();
        session.advance().unwrap();
        session.record_answer(1, "great").unwrap();
        controller.submit(&mut session).await.expect("submit");

        let batches = sink.batches.lock().unwrap();
        let batch = &batches[0];
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].survey_id, "post-scale");
        assert_eq!(batch[1].survey_id, "post-prompt");
        assert_eq!(batch[1].open_ended_answer.as_deref(), Some("great"));
        assert_eq!(batch[1].conversation_id.as_deref(), Some("conv-9"));
    }
}
