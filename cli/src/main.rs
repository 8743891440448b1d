//! CLI entrypoint for Agent Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::{
    AgentRegistry, AgentTaskExecutor, CouncilConfig, DecisionSink, DeliberateInput,
    DeliberationOrchestrator, DeliberationProgress, EventBus, ExecutorVoteSource,
    FormCouncilUseCase, NoDecisionSink, NoProgress, TaskScheduler, VoteHistoryStore,
};
use council_domain::{AgentId, DeliberationContext, TaskPriority};
use council_infrastructure::{
    CommandExecutor, ConfigLoader, FileConfig, JsonlDecisionLog, bootstrap_roster,
};
use council_presentation::{
    AgentOverview, Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting Agent Council");

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        println!();
        println!("{}", toml::to_string_pretty(&file_config)?);
        print!("{}", ConsoleFormatter::format_issues(&file_config.validate()));
        return Ok(());
    }

    let warnings = file_config.check()?;
    if !warnings.is_empty() {
        eprint!("{}", ConsoleFormatter::format_issues(&warnings));
    }

    let Some(command) = cli.command.clone() else {
        bail!("No command given. Run `agent-council --help` for usage.");
    };

    // === Dependency Injection ===
    let config = file_config.to_council_config();
    let events = EventBus::default();
    let registry = Arc::new(AgentRegistry::new(events.clone()));
    bootstrap_roster(&registry, &file_config.agents);

    match command {
        Command::Agents => {
            let rows = AgentOverview::collect(&registry);
            match cli.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                _ => print!("{}", ConsoleFormatter::format_agents(&rows)),
            }
        }
        Command::Form { query } => {
            let councils = council_use_case(&registry, &config);
            let formed = councils.execute(&query)?;
            match cli.output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&formed.council)?)
                }
                _ => print!("{}", ConsoleFormatter::format_council(&formed)),
            }
        }
        Command::Deliberate {
            query,
            max_turns,
            threshold,
        } => {
            let executor = build_executor(&file_config)?;
            let councils = Arc::new(council_use_case(&registry, &config));
            let formed = councils.execute(&query)?;
            if !cli.quiet && cli.output != OutputFormat::Json {
                print!("{}", ConsoleFormatter::format_council(&formed));
            }

            let history = Arc::new(VoteHistoryStore::new(config.history().capacity));
            let source = Arc::new(ExecutorVoteSource::new(executor));
            let orchestrator = DeliberationOrchestrator::new(
                councils,
                registry.clone(),
                history,
                source,
                events.clone(),
                config.consensus(),
                config.deliberation().clone(),
            )
            .with_sink(decision_sink(&file_config))
            .with_cancellation(cancel_on_ctrl_c());

            let mut input = DeliberateInput::new(formed.council.id.clone(), query.as_str())
                .with_context(DeliberationContext::query(query.as_str()));
            if let Some(max_turns) = max_turns {
                input = input.with_max_turns(max_turns);
            }
            if let Some(threshold) = threshold {
                input = input.with_threshold(threshold);
            }

            let progress: Box<dyn DeliberationProgress> = if cli.quiet {
                Box::new(NoProgress)
            } else {
                Box::new(ProgressReporter::new())
            };
            let outcome = orchestrator
                .execute_with_progress(input, progress.as_ref())
                .await?;
            let decision = outcome.decision();

            let output = match cli.output {
                OutputFormat::Full => ConsoleFormatter::format(decision),
                OutputFormat::Summary => ConsoleFormatter::format_summary(decision),
                OutputFormat::Json => ConsoleFormatter::format_json(decision),
            };
            println!("{}", output);
        }
        Command::Task {
            agent,
            task_type,
            priority,
            content,
        } => {
            run_task(
                &registry,
                build_executor(&file_config)?,
                events,
                agent,
                task_type,
                priority,
                content,
                cli.output,
            )
            .await?;
        }
    }

    Ok(())
}

fn council_use_case(registry: &Arc<AgentRegistry>, config: &CouncilConfig) -> FormCouncilUseCase {
    FormCouncilUseCase::new(
        registry.clone(),
        *config.formation(),
        config.cache_capacity(),
    )
}

fn build_executor(file_config: &FileConfig) -> Result<Arc<dyn AgentTaskExecutor>> {
    let executor = file_config
        .executor
        .as_ref()
        .context("No [executor] configured; add an executor command to council.toml")?;
    Ok(Arc::new(CommandExecutor::from_config(executor)))
}

fn decision_sink(file_config: &FileConfig) -> Arc<dyn DecisionSink> {
    let Some(path) = &file_config.logging.decision_log else {
        return Arc::new(NoDecisionSink);
    };
    match JsonlDecisionLog::new(path) {
        Some(log) => {
            info!("Recording decisions to {}", log.path().display());
            Arc::new(log)
        }
        None => {
            warn!("Decision log disabled");
            Arc::new(NoDecisionSink)
        }
    }
}

/// Cancel the returned token on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling at the next round boundary");
            on_signal.cancel();
        }
    });
    token
}

#[allow(clippy::too_many_arguments)]
async fn run_task(
    registry: &Arc<AgentRegistry>,
    executor: Arc<dyn AgentTaskExecutor>,
    events: EventBus,
    agent: String,
    task_type: String,
    priority: TaskPriority,
    content: String,
    output: OutputFormat,
) -> Result<()> {
    let agent_id = AgentId::new(agent);
    if !registry.contains(&agent_id) {
        bail!("Unknown agent '{}'. Run `agent-council agents` to list the roster.", agent_id);
    }

    let scheduler = TaskScheduler::new(registry.clone(), executor, events);
    let id = scheduler.create_task(agent_id, task_type, content, priority)?;
    scheduler.drain().await;

    let task = scheduler
        .get_task(&id)
        .with_context(|| format!("Task {id} disappeared"))?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&task)?),
        _ => print!("{}", ConsoleFormatter::format_task(&task)),
    }
    Ok(())
}

/// Initialise tracing from the `-v` count; `RUST_LOG` takes precedence.
///
/// With `--log-file`, a second plain-text layer writes through a
/// non-blocking appender. The returned guard must live until exit.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {e}"))?;

    Ok(guard)
}
