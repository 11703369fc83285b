use schemars::schema_for;
use serde_json::Value;

use crate::answers::AnswerRecord;
use crate::spec::survey::Survey;

/// JSON schema of the body posted to the answer sink.
pub fn answer_batch_schema() -> Value {
    schema_for!(Vec<AnswerRecord>).to_value()
}

/// JSON schema of the survey details document.
pub fn survey_schema() -> Value {
    schema_for!(Survey).to_value()
}
