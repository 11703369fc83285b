use std::io::{self, BufRead, Write};

use survey_client::{SubmitResult, SurveyController, SurveyError};
use survey_spec::{
    AnswerValue, QuestionType, RenderPayload, SessionError, Submittable, SurveySession,
    TwoPhaseSession, ValidationResult, build_render_payload, build_two_phase_payload,
    render_json_ui, render_text,
};

type WizardResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Output format for the session view.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// Session operations the interactive loop needs, for both session shapes.
pub trait InteractiveSession: Submittable + Send {
    fn payload(&self) -> RenderPayload;
    fn current_kind(&self) -> Option<QuestionType>;
    fn answer_current(&mut self, value: AnswerValue) -> Result<(), SessionError>;
    fn advance(&mut self) -> Result<(), SessionError>;
    fn retreat(&mut self);
}

impl InteractiveSession for SurveySession {
    fn payload(&self) -> RenderPayload {
        build_render_payload(self)
    }

    fn current_kind(&self) -> Option<QuestionType> {
        self.current().map(|question| question.question_type)
    }

    fn answer_current(&mut self, value: AnswerValue) -> Result<(), SessionError> {
        SurveySession::answer_current(self, value)
    }

    fn advance(&mut self) -> Result<(), SessionError> {
        SurveySession::advance(self)
    }

    fn retreat(&mut self) {
        SurveySession::retreat(self)
    }
}

impl InteractiveSession for TwoPhaseSession {
    fn payload(&self) -> RenderPayload {
        build_two_phase_payload(self)
    }

    fn current_kind(&self) -> Option<QuestionType> {
        self.active().current().map(|question| question.question_type)
    }

    fn answer_current(&mut self, value: AnswerValue) -> Result<(), SessionError> {
        TwoPhaseSession::answer_current(self, value)
    }

    fn advance(&mut self) -> Result<(), SessionError> {
        TwoPhaseSession::advance(self)
    }

    fn retreat(&mut self) {
        TwoPhaseSession::retreat(self)
    }
}

/// A line typed by the respondent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    Next,
    Back,
    Submit,
    Exit,
    Answer(String),
}

impl WizardCommand {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "next" | "n" => WizardCommand::Next,
            "back" | "b" | "previous" => WizardCommand::Back,
            "submit" | "done" => WizardCommand::Submit,
            "exit" | "quit" => WizardCommand::Exit,
            _ => WizardCommand::Answer(trimmed.to_string()),
        }
    }
}

/// Converts typed text into a token for the current question.
pub fn parse_answer(kind: QuestionType, raw: &str) -> AnswerValue {
    match kind {
        QuestionType::OpenEnded => AnswerValue::Text(raw.to_string()),
        QuestionType::Scale | QuestionType::MultipleChoice => raw
            .parse::<i64>()
            .map(AnswerValue::Integer)
            .unwrap_or_else(|_| AnswerValue::Text(raw.to_string())),
    }
}

/// Prints the session view and outcome messages.
pub struct WizardPresenter {
    mode: RenderMode,
}

impl WizardPresenter {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode }
    }

    pub fn show(&self, payload: &RenderPayload) {
        match self.mode {
            RenderMode::Text => println!("{}", render_text(payload)),
            RenderMode::Json => println!("{}", render_json_ui(payload)),
        }
    }

    /// Input marker printed before each read; JSON output stays one document per line.
    pub fn prompt_marker(&self) -> Option<&'static str> {
        match self.mode {
            RenderMode::Text => Some("> "),
            RenderMode::Json => None,
        }
    }

    pub fn show_session_error(&self, error: &SessionError) {
        eprintln!("Invalid input: {}", error);
    }

    pub fn show_submit_error(&self, error: &SurveyError) {
        eprintln!("{}", error);
        if let SurveyError::ValidationFailed(validation) = error {
            describe_validation(validation);
        }
    }

    pub fn show_submitted(&self, result: &SubmitResult) {
        println!(
            "Submitted {} answers (receipt {}).",
            result.receipt.records, result.receipt.token
        );
    }
}

/// Prints the missing and invalid entries of a validation result.
pub fn describe_validation(result: &ValidationResult) {
    if !result.missing.is_empty() {
        println!("Unanswered questions: {}", result.missing.join(", "));
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {} ({})", error.question_id, error.message, error.code);
        }
    }
}

/// Runs the prompt loop until the batch is accepted or the respondent exits.
///
/// Answering a question moves on to the next one when possible.
pub async fn run_session<S, R>(
    controller: &SurveyController,
    session: &mut S,
    presenter: &WizardPresenter,
    mut input: R,
) -> WizardResult<SubmitResult>
where
    S: InteractiveSession,
    R: BufRead,
{
    loop {
        presenter.show(&session.payload());
        if let Some(marker) = presenter.prompt_marker() {
            print!("{}", marker);
            io::stdout().flush()?;
        }

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err("input closed before the survey was submitted".into());
        }

        match WizardCommand::parse(&line) {
            WizardCommand::Exit => return Err("survey aborted by user".into()),
            WizardCommand::Back => session.retreat(),
            WizardCommand::Next => {
                if let Err(err) = session.advance() {
                    presenter.show_session_error(&err);
                }
            }
            WizardCommand::Submit => match controller.submit(session).await {
                Ok(result) => {
                    presenter.show_submitted(&result);
                    return Ok(result);
                }
                Err(err) => presenter.show_submit_error(&err),
            },
            WizardCommand::Answer(raw) => {
                let Some(kind) = session.current_kind() else {
                    eprintln!("This survey has no questions; type 'submit' to finish.");
                    continue;
                };
                match session.answer_current(parse_answer(kind, &raw)) {
                    Ok(()) => {
                        if session.payload().navigation.can_advance
                            && let Err(err) = session.advance()
                        {
                            presenter.show_session_error(&err);
                        }
                    }
                    Err(err) => presenter.show_session_error(&err),
                }
            }
        }
    }
}
