use serde_json::{Map, Value, json};

use crate::{
    answers::Answer,
    session::SurveySession,
    spec::question::{AnswerValue, QuestionType},
    two_phase::{Stage, TwoPhaseSession},
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// More input is required.
    NeedInput,
    /// Every question has a valid answer.
    Complete,
    /// The batch was accepted by the answer sink.
    Submitted,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Submitted => "submitted",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct RenderOption {
    pub value: AnswerValue,
    pub text: String,
    pub selected: bool,
}

/// The question under the cursor.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionType,
    pub position: usize,
    pub options: Vec<RenderOption>,
    pub current_value: Option<String>,
}

/// Which controls a front-end should enable.
#[derive(Debug, Clone, Copy)]
pub struct RenderNavigation {
    pub can_retreat: bool,
    pub can_advance: bool,
    pub can_submit: bool,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub survey_id: String,
    pub status: RenderStatus,
    pub progress: RenderProgress,
    pub question: Option<RenderQuestion>,
    pub navigation: RenderNavigation,
}

/// Build the renderer payload for a single-list session.
pub fn build_render_payload(session: &SurveySession) -> RenderPayload {
    let complete = session.is_complete();
    let submitted = session.is_submitted();
    RenderPayload {
        survey_id: session.survey_id().to_string(),
        status: status_for(complete, submitted),
        progress: RenderProgress {
            answered: session.answered_count(),
            total: session.len(),
        },
        question: current_question(session, 0),
        navigation: RenderNavigation {
            can_retreat: session.can_retreat(),
            can_advance: session.can_advance(),
            can_submit: session.is_last() && complete && !submitted,
        },
    }
}

/// Build the payload for a two-phase session; positions run across both lists.
pub fn build_two_phase_payload(session: &TwoPhaseSession) -> RenderPayload {
    let complete = session.is_complete();
    let submitted = session.receipt().is_some();
    let active = session.active();
    let (offset, can_retreat, can_advance) = match session.stage() {
        Stage::Closed => (
            0,
            active.can_retreat(),
            active.current_answer().is_some() || active.is_empty(),
        ),
        Stage::Prompt => (session.closed().len(), true, false),
    };
    RenderPayload {
        survey_id: active.survey_id().to_string(),
        status: status_for(complete, submitted),
        progress: RenderProgress {
            answered: session.answered_count(),
            total: session.len(),
        },
        question: current_question(active, offset),
        navigation: RenderNavigation {
            can_retreat,
            can_advance,
            can_submit: session.stage() == Stage::Prompt && complete && !submitted,
        },
    }
}

fn status_for(complete: bool, submitted: bool) -> RenderStatus {
    if submitted {
        RenderStatus::Submitted
    } else if complete {
        RenderStatus::Complete
    } else {
        RenderStatus::NeedInput
    }
}

fn current_question(session: &SurveySession, offset: usize) -> Option<RenderQuestion> {
    let question = session.current()?;
    let answer = session.current_answer();
    let selected = answer.and_then(Answer::value);
    Some(RenderQuestion {
        id: question.question_id.clone(),
        prompt: question.question.clone(),
        kind: question.question_type,
        position: offset + session.position(),
        options: question
            .answers
            .iter()
            .map(|option| RenderOption {
                value: option.value.clone(),
                text: option.text.clone(),
                selected: selected.is_some_and(|value| value == &option.value),
            })
            .collect(),
        current_value: answer.map(ToString::to_string),
    })
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let question = payload
        .question
        .as_ref()
        .map(|question| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(question.id.clone()));
            map.insert("prompt".into(), Value::String(question.prompt.clone()));
            map.insert("type".into(), Value::String(question.kind.as_str().into()));
            map.insert("position".into(), json!(question.position));
            if !question.options.is_empty() {
                let options = question
                    .options
                    .iter()
                    .map(|option| {
                        json!({
                            "value": option.value,
                            "text": option.text,
                            "selected": option.selected,
                        })
                    })
                    .collect::<Vec<_>>();
                map.insert("options".into(), Value::Array(options));
            }
            if let Some(current_value) = &question.current_value {
                map.insert(
                    "current_value".into(),
                    Value::String(current_value.clone()),
                );
            }
            Value::Object(map)
        })
        .unwrap_or(Value::Null);

    json!({
        "survey_id": payload.survey_id,
        "status": payload.status.as_str(),
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "question": question,
        "navigation": {
            "back": payload.navigation.can_retreat,
            "next": payload.navigation.can_advance,
            "submit": payload.navigation.can_submit,
        },
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));

    match &payload.question {
        Some(question) => {
            lines.push(format!(
                "{}/{} {}",
                question.position, payload.progress.total, question.prompt
            ));
            for option in &question.options {
                let marker = if option.selected { "*" } else { " " };
                lines.push(format!(" {} {} - {}", marker, option.value, option.text));
            }
            if question.kind == QuestionType::OpenEnded
                && let Some(text) = &question.current_value
            {
                lines.push(format!("  Current answer: {}", text));
            }
        }
        None => lines.push("This survey has no questions.".to_string()),
    }

    let mut actions = Vec::new();
    if payload.navigation.can_retreat {
        actions.push("back");
    }
    if payload.navigation.can_advance {
        actions.push("next");
    }
    if payload.navigation.can_submit {
        actions.push("submit");
    }
    if !actions.is_empty() {
        lines.push(format!("Actions: {}", actions.join(", ")));
    }

    lines.join("\n")
}
