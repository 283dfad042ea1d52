//! PK battle engine binary.
//!
//! Wires an event source, the battle core, and the notification sinks
//! together and runs the battle loop until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing, to stderr)
//! 2. Load configuration from `$PKBATTLE_CONFIG` or `pkbattle-config.json`
//! 3. Build the battle (gift catalog, round engine, bubbles, viewer grid)
//! 4. Spawn the event source (simulator or stdin) and the Ctrl-C watcher
//! 5. Start the first round if `runtime.auto_start` is set
//! 6. Run the battle loop, notifications going to the log and to stdout
//!    as JSON lines

mod error;
mod log_sink;
mod simulator;
mod stdin_source;

use std::path::{Path, PathBuf};

use pkbattle_core::battle::{Battle, Command};
use pkbattle_core::config::{BattleConfig, EventSourceKind};
use pkbattle_core::notify::FanOut;
use pkbattle_core::runner::{self, Inbound, RunOptions, RunSummary};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_sink::{JsonLinesSink, LogSink};
use crate::simulator::Simulator;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "PKBATTLE_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "pkbattle-config.json";

/// Bound on queued inbound messages.
const INBOUND_CAPACITY: usize = 1024;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading or battle construction fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Notifications own stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("pkbattle-engine starting");
    let summary = run().await?;
    info!(
        end_reason = ?summary.end_reason,
        events = summary.events_handled,
        "pkbattle-engine shutdown complete"
    );
    Ok(())
}

async fn run() -> Result<RunSummary, EngineError> {
    let config = load_config(&config_path())?;
    info!(
        round_minutes = config.round.duration_minutes,
        event_source = ?config.runtime.event_source,
        viewers_enabled = config.viewers.enabled,
        "Configuration loaded"
    );

    let mut battle = Battle::new(&config)?;
    let mut sink = build_sink(config.runtime.emit_json);
    let (tx, mut rx) = mpsc::channel::<Inbound>(INBOUND_CAPACITY);

    let source = match config.runtime.event_source {
        EventSourceKind::Simulated => {
            let simulator = Simulator::new(&config, battle.catalog());
            tokio::spawn(simulator::run_simulator(
                simulator,
                config.runtime.simulation_interval_ms,
                tx.clone(),
            ))
        }
        EventSourceKind::Stdin => {
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Err(e) = stdin_source::run_stdin_source(tx).await {
                    warn!(error = %e, "stdin source failed");
                }
            })
        }
    };

    let interrupt_tx = tx;
    let interrupt = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                let _ = interrupt_tx.send(Inbound::Command(Command::Shutdown)).await;
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    if config.runtime.auto_start {
        battle.apply(Command::Start, &mut sink);
    }

    let options = RunOptions::from_config(&config.runtime);
    let result = runner::run_battle(&mut battle, &mut rx, &mut sink, &options).await;
    source.abort();
    interrupt.abort();
    result.map_err(EngineError::from)
}

fn build_sink(emit_json: bool) -> FanOut {
    let sink = FanOut::new().with(Box::new(LogSink));
    if emit_json {
        sink.with(Box::new(JsonLinesSink::new(std::io::stdout())))
    } else {
        sink
    }
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration from `path`, or defaults when the file is absent.
fn load_config(path: &Path) -> Result<BattleConfig, EngineError> {
    if path.exists() {
        let config = BattleConfig::from_file(path)?;
        info!(path = %path.display(), "Config file loaded");
        Ok(config)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(BattleConfig::default())
    }
}
