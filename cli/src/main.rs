//! CLI entrypoint for the LLM council
//!
//! Wires the layers together: configuration loading, gateway and search
//! adapters, the tool registry, the chosen pipeline, and the console
//! presenter consuming the event stream.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use council_application::{
    DebateInput, ExecutionStrategy, LlmGateway, RankingInput, RunDebateUseCase,
    RunRankingUseCase, ToolExecutorPort,
};
use council_domain::Question;
use council_infrastructure::{
    ConfigLoader, ConversationStore, OpenRouterGateway, TavilySearch, ToolRegistry,
};
use council_presentation::ConsolePresenter;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Deliberation protocol to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Answers, anonymous peer ranking, synthesis
    Ranking,
    /// Initial answers, critique-defense cycles, synthesis
    Debate,
}

/// Ask a panel of LLMs to deliberate on a question
#[derive(Debug, Parser)]
#[command(name = "council", version, about)]
struct Cli {
    /// The question to deliberate on
    #[arg(required = true)]
    question: Vec<String>,

    /// Deliberation protocol
    #[arg(long, value_enum, default_value = "ranking")]
    mode: Mode,

    /// Stream tokens one participant at a time instead of running the
    /// panel in parallel
    #[arg(long)]
    streaming: bool,

    /// Surface each participant's reasoning as ReAct steps
    #[arg(long)]
    react: bool,

    /// Critique-defense cycles after the initial round (debate mode)
    #[arg(long)]
    cycles: Option<u32>,

    /// Override the participant panel (repeatable)
    #[arg(long = "model", value_name = "MODEL")]
    models: Vec<String>,

    /// Override the chairman model
    #[arg(long)]
    chairman: Option<String>,

    /// Per-participant timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Do not write the finished run to the conversation store
    #[arg(long)]
    no_save: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("config error: {e}"))?
    };

    // Per-run settings: file values with CLI overrides on top
    let mut settings = config.run_settings();
    if !cli.models.is_empty() {
        settings.participants = cli.models.iter().map(|m| m.as_str().into()).collect();
    }
    if let Some(chairman) = &cli.chairman {
        settings.chairman = chairman.as_str().into();
    }
    if let Some(timeout) = cli.timeout {
        settings = settings.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(cycles) = cli.cycles {
        settings = settings.with_cycles(cycles);
    }
    if cli.react {
        settings = settings.with_react(true);
    }
    settings.validate().context("invalid run configuration")?;

    let question = Question::new(cli.question.join(" "))?;

    // Adapters
    let api_key = std::env::var("OPENROUTER_API_KEY").ok();
    if api_key.is_none() {
        bail!("OPENROUTER_API_KEY is not set");
    }
    let gateway: Arc<dyn LlmGateway> =
        Arc::new(OpenRouterGateway::new(&config.gateway.api_url, api_key)?);

    let tavily_key = std::env::var("TAVILY_API_KEY").ok();
    if tavily_key.is_none() {
        warn!("TAVILY_API_KEY is not set; web search will report itself unavailable");
    }
    let search = TavilySearch::new(reqwest_client()?, tavily_key)
        .with_max_results(config.search.max_results);
    let tools: Arc<dyn ToolExecutorPort> = Arc::new(ToolRegistry::with_search(search));

    let strategy = if cli.streaming {
        ExecutionStrategy::SequentialStreaming
    } else {
        ExecutionStrategy::BatchParallel
    };

    // Ctrl-C cancels the run; in-flight requests are dropped best-effort
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling run");
                cancel.cancel();
            }
        });
    }

    let presenter = ConsolePresenter::new(cli.streaming);
    let store =
        (!cli.no_save).then(|| ConversationStore::new(config.storage.data_dir.clone()));

    match cli.mode {
        Mode::Debate => {
            let use_case = RunDebateUseCase::new(gateway, tools);
            let input = DebateInput::new(question, settings)
                .with_strategy(strategy)
                .with_cancel(cancel);
            let (events, handle) = use_case.spawn(input);
            presenter.present(events).await;

            let outcome = handle.await.context("run task failed")??;
            if let Some(store) = store {
                let path = store.save_debate(&outcome)?;
                info!(path = %path.display(), "saved debate");
            }
        }
        Mode::Ranking => {
            let use_case = RunRankingUseCase::new(gateway, tools);
            let input = RankingInput::new(question, settings)
                .with_strategy(strategy)
                .with_cancel(cancel);
            let (events, handle) = use_case.spawn(input);
            presenter.present(events).await;

            let outcome = handle.await.context("run task failed")??;
            println!("\nAggregate peer ranking:");
            for (i, entry) in outcome.aggregate.iter().enumerate() {
                println!(
                    "  {}. {} (mean position {:.2}, {} votes)",
                    i + 1,
                    entry.model,
                    entry.mean_position,
                    entry.vote_count
                );
            }
            if let Some(store) = store {
                let path = store.save_ranking(&outcome)?;
                info!(path = %path.display(), "saved ranking");
            }
        }
    }

    Ok(())
}

fn reqwest_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")
}
