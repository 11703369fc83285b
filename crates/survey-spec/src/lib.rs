#![allow(missing_docs)]

pub mod answers;
pub mod error;
pub mod render;
pub mod schema;
pub mod session;
pub mod spec;
pub mod submit;
pub mod two_phase;
pub mod validate;

pub use answers::{Answer, AnswerRecord, Phase, Respondent, ValidationError, ValidationResult};
pub use error::SessionError;
pub use render::{
    RenderNavigation, RenderPayload, RenderProgress, RenderQuestion, RenderStatus,
    build_render_payload, build_two_phase_payload, render_json_ui, render_text,
};
pub use schema::{answer_batch_schema, survey_schema};
pub use session::{SubmitReceipt, SurveySession};
pub use spec::{AnswerOption, AnswerValue, Question, QuestionType, Survey};
pub use submit::Submittable;
pub use two_phase::{Stage, TwoPhaseSession};
pub use validate::{AnswerMap, validate, validate_json};
