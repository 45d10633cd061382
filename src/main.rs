#![forbid(unsafe_code)]

//! `shipment-watch`: interactive observer for a fulfillment workflow.
//!
//! Starts (or attaches to) a workflow instance, prints every reconciled log
//! line, and accepts operator commands on stdin.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use shipment_watch::config::GlobalConfig;
use shipment_watch::engine::http::HttpEngine;
use shipment_watch::journal::writer::JsonlJournal;
use shipment_watch::models::log::TerminalKind;
use shipment_watch::monitor::{Monitor, MonitorSettings};
use shipment_watch::reconcile::events::WatchEvent;
use shipment_watch::reconcile::session::SessionUpdate;
use shipment_watch::{AppError, Result};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "shipment-watch", about = "Observe a fulfillment workflow", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch one workflow instance and accept operator commands on stdin.
    Watch(Target),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Start a new instance of this scenario.
    #[arg(long)]
    scenario: Option<String>,

    /// Attach to an existing instance.
    #[arg(long)]
    shipment: Option<String>,
}

/// Command typed by the operator while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OperatorCommand {
    Decide(String),
    Cancel,
    Pause,
    Resume,
    Quit,
}

fn parse_operator_command(line: &str) -> Option<OperatorCommand> {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    match verb.to_ascii_lowercase().as_str() {
        "decide" if !rest.trim().is_empty() => Some(OperatorCommand::Decide(rest.trim().to_owned())),
        "cancel" => Some(OperatorCommand::Cancel),
        "pause" => Some(OperatorCommand::Pause),
        "resume" => Some(OperatorCommand::Resume),
        "quit" | "exit" => Some(OperatorCommand::Quit),
        _ => None,
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("shipment-watch bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = GlobalConfig::load_from_path(&args.config)?;
    info!(base_url = %config.engine.base_url, "configuration loaded");

    let engine = Arc::new(HttpEngine::from_config(&config)?);
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let mut monitor = Monitor::new(engine, MonitorSettings::from_config(&config), tx);
    if let Some(dir) = &config.journal_dir {
        monitor = monitor.with_journal(Arc::new(JsonlJournal::new(dir.clone())?));
        info!(dir = %dir.display(), "journal enabled");
    }

    let Command::Watch(target) = &args.command;
    if let Some(scenario) = &target.scenario {
        let instance_id = monitor.create_instance(scenario).await?;
        println!("Started shipment {instance_id} (scenario {scenario})");
    } else if let Some(shipment) = &target.shipment {
        monitor.observe(shipment).await;
        println!("Watching shipment {shipment}");
    }
    println!("Commands: decide <option>, cancel, pause, resume, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else { break };
                if render(&event) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(&monitor, &line) {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed; watching without operator input");
                        stdin_open = false;
                    }
                    Err(err) => {
                        error!(%err, "failed to read stdin");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    monitor.stop().await;
    info!("shipment-watch shut down");
    Ok(())
}

/// Dispatch one stdin line. Returns `false` when the operator asked to quit.
///
/// The command runs on its own task; the dispatcher publishes while holding
/// the session lock, so the render loop must keep draining events meanwhile.
fn handle_line(monitor: &Monitor, line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    let Some(command) = parse_operator_command(line) else {
        println!("Unrecognized command: {}", line.trim());
        return true;
    };
    if command == OperatorCommand::Quit {
        return false;
    }

    let dispatcher = match monitor.dispatcher() {
        Ok(dispatcher) => dispatcher,
        Err(err) => {
            error!(%err, "no dispatcher available");
            return true;
        }
    };

    tokio::spawn(async move {
        let result = match command {
            OperatorCommand::Decide(label) => dispatcher.submit_decision(&label).await.map(drop),
            OperatorCommand::Cancel => dispatcher.cancel().await,
            OperatorCommand::Pause => dispatcher.set_paused(true).await,
            OperatorCommand::Resume => dispatcher.set_paused(false).await,
            OperatorCommand::Quit => Ok(()),
        };
        if let Err(err) = result {
            error!(%err, "operator command failed");
        }
    });
    true
}

/// Print one event. Returns `true` once the workflow has ended.
fn render(event: &WatchEvent) -> bool {
    match &event.update {
        SessionUpdate::Logged(entry) => {
            println!(
                "{} [{:<5}] {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.severity.tag(),
                entry.message
            );
            false
        }
        SessionUpdate::Progress(step) => {
            println!("         progress: {}", step.label());
            false
        }
        SessionUpdate::DecisionRequired(decision) => {
            println!("         decision required: {}", decision.details);
            for (index, option) in decision.options.iter().enumerate() {
                let mut line = format!("           {}. {}", index + 1, option.label);
                if let Some(cost) = option.cost {
                    line.push_str(&format!(" (${cost:.2})"));
                }
                if let Some(impact) = &option.time_impact {
                    line.push_str(&format!(" [{impact}]"));
                }
                println!("{line}");
            }
            false
        }
        SessionUpdate::Finished(banner) => {
            let title = match banner.kind {
                TerminalKind::Delivered => "DELIVERED",
                TerminalKind::Cancelled => "CANCELLED",
                TerminalKind::Halted => "HALTED",
            };
            let rule = "=".repeat(60);
            println!("{rule}\n  {title}: {}\n{rule}", banner.message);
            true
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
