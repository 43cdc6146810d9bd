use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use polyglot::agent::prompt::PromptSet;
use polyglot::config::{AppConfig, ConfigOverrides, Provider};
use polyglot::format::{BlackFormatter, Formatter, PassthroughFormatter};
use polyglot::llm::{build_client, ModelClient};
use polyglot::output::{finish, read_source};
use polyglot::shutdown::wait_for_shutdown;
use polyglot::validate::PyCompileValidator;
use polyglot::workflow::{Orchestrator, RunOutcome, WorkflowState};

#[derive(Parser)]
#[command(
    name = "polyglot",
    about = "Translate a source file with an LLM and repair it until it compiles",
    after_help = "Examples:\n  polyglot --model-name gpt-4o --source Calculator.java --target calculator.py\n  polyglot --provider anthropic --model-name claude-sonnet-4-20250514 --source HelloWorld.java --target out/hello_world.py --max-iter 5"
)]
struct Cli {
    /// Path to the source file to translate
    #[arg(long)]
    source: PathBuf,

    /// Path the translated file is written to
    #[arg(long)]
    target: PathBuf,

    /// Model identifier, overriding the configured one
    #[arg(long)]
    model_name: Option<String>,

    /// Model provider: openai or anthropic
    #[arg(long)]
    provider: Option<String>,

    /// Maximum translate/repair attempts (default: 3)
    #[arg(long)]
    max_iter: Option<u32>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Write the translation without running the formatter
    #[arg(long)]
    no_format: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let overrides = ConfigOverrides {
        provider: cli.provider.as_deref().map(str::parse::<Provider>).transpose()?,
        model_name: cli.model_name,
        max_iterations: cli.max_iter,
    };
    let config = AppConfig::load(cli.config.as_deref(), &overrides)?;
    config.validate()?;

    tracing::info!(
        provider = ?config.model.provider,
        model = %config.model.name,
        endpoint = %config.model.endpoint(),
        "Using model"
    );

    let source = read_source(&cli.source).await?;

    let model: Arc<dyn ModelClient> = Arc::from(build_client(&config.model)?);
    let validator = Arc::new(PyCompileValidator::from_config(&config.tools));
    let prompts = Arc::new(PromptSet::from_config(&config.workflow));
    let orchestrator =
        Orchestrator::with_agents(model, validator, prompts, config.workflow.max_iterations)?;

    tracing::info!(
        from = %config.workflow.source_language,
        to = %config.workflow.target_language,
        "Starting translation workflow"
    );

    let state = tokio::select! {
        result = orchestrator.run(WorkflowState::new(source)) => result?,
        _ = wait_for_shutdown() => {
            tracing::warn!("Translation interrupted, nothing written");
            return Ok(ExitCode::FAILURE);
        }
    };

    let formatter: Box<dyn Formatter> = if cli.no_format {
        Box::new(PassthroughFormatter)
    } else {
        Box::new(BlackFormatter::from_config(&config.tools))
    };

    match finish(&state, formatter.as_ref(), &cli.target).await? {
        RunOutcome::Translated { iterations } => {
            tracing::info!(iterations, "Translation completed successfully");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Unresolved {
            iterations,
            code,
            message,
        } => {
            tracing::error!(iterations, code, "Translation failed after maximum retries");
            eprintln!("Last error:\n{message}");
            Ok(ExitCode::FAILURE)
        }
    }
}
