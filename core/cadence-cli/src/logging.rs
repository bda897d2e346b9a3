//! File logging for the terminal host.
//!
//! The terminal belongs to the timer display, so logs go to a daily rolling
//! file under `<root>/logs/`. `RUST_LOG` sets the filter; `CADENCE_DEBUG_LOG=1`
//! forces debug.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "cadence.log";

fn debug_forced() -> bool {
    env::var("CADENCE_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn env_filter() -> EnvFilter {
    if debug_forced() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber. Keep the guard alive for the life of the
/// process or buffered lines are lost on exit.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    if fs_err::create_dir_all(logs_dir).is_err() {
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}
