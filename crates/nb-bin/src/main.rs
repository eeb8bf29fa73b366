//! `nbcore`: host-facing binary around the notebook state reducer.
//!
//! Reads one action envelope per line on stdin, reduces it against the current
//! state and writes the resulting outbound messages as JSON lines on stdout.
//! Logs go to a file so they never interleave with the protocol stream.

mod runtime;
mod store;
mod transport;

use anyhow::{Context, Result};
use clap::Parser;
use core_events::{EVENT_CHANNEL_CAP, LineEventSource};
use core_state::MainState;
use runtime::{NotebookRuntime, TraceObserver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::{LogSubscriber, Store};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nbcore", version, about = "Notebook state reducer over JSON lines")]
struct Args {
    /// Path to a notebook.toml (defaults to the discovered location).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Directory receiving `nbcore.log`.
    #[arg(long = "log-dir", default_value = ".")]
    log_dir: PathBuf,
}

const LOG_FILE: &str = "nbcore.log";

/// Route `tracing` output to `<dir>/nbcore.log`. `RUST_LOG` selects levels.
///
/// The returned guard flushes the background writer on drop; `None` when a
/// global subscriber was already installed.
fn init_file_logging(dir: &Path) -> Result<Option<WorkerGuard>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();
    Ok(installed.then_some(guard))
}

/// Record panics in the log file before the default hook prints them; stdout
/// belongs to the protocol, so the log is the only durable trace.
fn log_panics() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        tracing::error!(target: "runtime.panic", location = location.as_deref(), "reducer_panicked");
        previous(info);
    }));
}

/// Starting state: config-file defaults, no cells, optional edit cell.
fn initial_state(config: Option<PathBuf>) -> Result<Arc<MainState>> {
    let cfg = core_config::load_from(config)?;
    info!(
        target: "config",
        from_file = cfg.raw.is_some(),
        history_depth = cfg.effective_history_depth,
        edit_cell = cfg.edit_cell_enabled(),
        "config_loaded"
    );
    Ok(Arc::new(MainState::from_config(&cfg)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_file_logging(&args.log_dir)?;
    log_panics();
    info!(target: "runtime", version = env!("CARGO_PKG_VERSION"), "startup");
    let state = initial_state(args.config)?;

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let reader = LineEventSource::stdin().spawn(tx);

    let mut store = Store::new(state);
    store.subscribe(Box::new(LogSubscriber));
    let mut runtime = NotebookRuntime::new(store, rx, tokio::io::stdout())
        .with_observer(Box::new(TraceObserver))
        .with_reader(reader);
    let cause = runtime.run().await?;
    info!(target: "runtime", cause = cause.as_str(), "exit");
    Ok(())
}
