#![forbid(unsafe_code)]

//! `shipment-watch-ctl`: one-shot companion for `shipment-watch`.
//!
//! Sends a single request to the workflow engine and prints the result.
//! Useful for scripted overrides while no interactive watcher is running.

use clap::{Parser, Subcommand};

use shipment_watch::config::GlobalConfig;
use shipment_watch::engine::http::HttpEngine;
use shipment_watch::engine::WorkflowEngine;
use shipment_watch::models::command::CommandToken;
use shipment_watch::reconcile::progress::{ProgressMapper, StatusMapping};
use shipment_watch::reconcile::translator;
use shipment_watch::Result;

#[derive(Debug, Parser)]
#[command(
    name = "shipment-watch-ctl",
    about = "One-shot commands against the shipment workflow engine",
    version,
    long_about = None
)]
struct Cli {
    /// Base URL of the workflow engine.
    #[arg(long, env = "SHIPMENT_WATCH_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current snapshot of a shipment.
    Status {
        /// Shipment (workflow instance) ID.
        shipment: String,
    },

    /// Submit a decision for the pending prompt.
    Decide {
        /// Shipment (workflow instance) ID.
        shipment: String,
        /// Offered option label, e.g. "Reroute shipment".
        label: String,
    },

    /// Withdraw a shipment.
    Cancel {
        /// Shipment (workflow instance) ID.
        shipment: String,
    },

    /// Pause a shipment.
    Pause {
        /// Shipment (workflow instance) ID.
        shipment: String,
    },

    /// Resume a paused shipment.
    Resume {
        /// Shipment (workflow instance) ID.
        shipment: String,
    },

    /// List every option label and the command it sends.
    Choices,
}

fn main() {
    let args = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to build tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn connect(base_url: String) -> Result<(GlobalConfig, HttpEngine)> {
    let config = GlobalConfig::for_base_url(base_url)?;
    let engine = HttpEngine::from_config(&config)?;
    Ok((config, engine))
}

async fn run(args: Cli) -> Result<()> {
    let base_url = args.base_url;

    match args.command {
        Command::Status { shipment } => {
            let (config, engine) = connect(base_url)?;
            let snapshot = engine.fetch_snapshot(&shipment).await?;
            let mapper = ProgressMapper::new(config.hitl.critical_halt_status.clone());
            let stage = match mapper.map_status(&snapshot.status) {
                StatusMapping::Known { step: Some(step), .. } => step.label(),
                StatusMapping::Known { step: None, .. } => "Halted",
                StatusMapping::Unknown => "Unknown",
            };
            println!("{shipment}: {} ({stage})", snapshot.status);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Decide { shipment, label } => {
            let token = translator::translate(&label)?;
            let (_, engine) = connect(base_url)?;
            if token.is_terminal() {
                engine.withdraw(&shipment).await?;
            } else {
                engine.submit_resolution(&shipment, token).await?;
            }
            println!("OK {token}");
        }
        Command::Cancel { shipment } => {
            let (_, engine) = connect(base_url)?;
            engine.withdraw(&shipment).await?;
            println!("OK {}", CommandToken::CancelOrder);
        }
        Command::Pause { shipment } => {
            let (_, engine) = connect(base_url)?;
            engine.set_paused(&shipment, true).await?;
            println!("OK paused");
        }
        Command::Resume { shipment } => {
            let (_, engine) = connect(base_url)?;
            engine.set_paused(&shipment, false).await?;
            println!("OK resumed");
        }
        Command::Choices => {
            for (label, token) in translator::CHOICE_TABLE {
                println!("{label:<42} {token}");
            }
        }
    }

    Ok(())
}
