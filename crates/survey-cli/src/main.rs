mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use survey_client::{ClientConfig, http_controller};
use survey_spec::{Phase, Respondent, Survey, answer_batch_schema, survey_schema, validate_json};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wizard::{RenderMode, WizardPresenter, describe_validation, run_session};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based survey runner",
    long_about = "Runs pre/post surveys against the survey API and validates answer files offline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliPhase {
    Pre,
    Post,
}

impl From<CliPhase> for Phase {
    fn from(phase: CliPhase) -> Self {
        match phase {
            CliPhase::Pre => Phase::Pre,
            CliPhase::Post => Phase::Post,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaKind {
    /// Body posted to the answer endpoint.
    Batch,
    /// Survey details document.
    Survey,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a survey interactively and submit the batch.
    Run {
        /// Survey to load (the scale list when --prompt-survey-id is given).
        #[arg(long, value_name = "ID")]
        survey_id: String,
        /// Optional survey holding a single open-ended prompt shown after the scale list.
        #[arg(long, value_name = "ID")]
        prompt_survey_id: Option<String>,
        /// Respondent identifier recorded on every answer.
        #[arg(long, env = "SURVEY_UTORID")]
        utorid: String,
        /// Conversation the answers relate to (post surveys).
        #[arg(long, value_name = "ID")]
        conversation_id: Option<String>,
        #[arg(long, value_enum, default_value_t = CliPhase::Pre)]
        phase: CliPhase,
        /// Base URL of the survey API.
        #[arg(long, env = "SURVEY_API_URL")]
        api_url: String,
        #[arg(long, env = "SURVEY_API_TIMEOUT_SECS", default_value_t = 30)]
        timeout_secs: u64,
        /// Render output mode for the survey display.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate an answers file against survey details offline.
    Validate {
        /// Survey details JSON (as returned by /survey/details).
        #[arg(long, value_name = "QUESTIONS")]
        questions: PathBuf,
        /// JSON object mapping question ids to answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print a JSON schema.
    Schema {
        #[arg(long, value_enum, default_value_t = SchemaKind::Batch)]
        kind: SchemaKind,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Run {
            survey_id,
            prompt_survey_id,
            utorid,
            conversation_id,
            phase,
            api_url,
            timeout_secs,
            format,
        } => {
            let mut respondent = Respondent::new(utorid);
            if let Some(conversation_id) = conversation_id {
                respondent = respondent.with_conversation(conversation_id);
            }
            let config = ClientConfig::new(api_url).with_timeout_secs(timeout_secs);
            run_survey(
                config,
                respondent,
                phase.into(),
                survey_id,
                prompt_survey_id,
                format,
            )
            .await
        }
        Command::Validate { questions, answers } => run_validate(questions, answers),
        Command::Schema { kind } => run_schema(kind),
    }
}

async fn run_survey(
    config: ClientConfig,
    respondent: Respondent,
    phase: Phase,
    survey_id: String,
    prompt_survey_id: Option<String>,
    format: RenderMode,
) -> CliResult<()> {
    debug!(
        "starting {} survey {} against {}",
        phase.as_str(),
        survey_id,
        config.base_url
    );
    let controller = http_controller(config, respondent, phase)?;
    let presenter = WizardPresenter::new(format);
    let stdin = io::stdin();

    match prompt_survey_id {
        Some(prompt_id) => {
            let mut session = controller.start_two_phase(&survey_id, &prompt_id).await?;
            run_session(&controller, &mut session, &presenter, stdin.lock()).await?;
        }
        None => {
            let mut session = controller.start(&survey_id).await?;
            run_session(&controller, &mut session, &presenter, stdin.lock()).await?;
        }
    }
    Ok(())
}

fn run_validate(questions_path: PathBuf, answers_path: PathBuf) -> CliResult<()> {
    let survey: Survey = serde_json::from_str(&fs::read_to_string(questions_path)?)?;
    let answers: Value = serde_json::from_str(&fs::read_to_string(answers_path)?)?;

    let result = validate_json(&survey.normalized(), &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_schema(kind: SchemaKind) -> CliResult<()> {
    let schema = match kind {
        SchemaKind::Batch => answer_batch_schema(),
        SchemaKind::Survey => survey_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
