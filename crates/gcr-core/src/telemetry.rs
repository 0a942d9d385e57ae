//! Tracing setup for the `gcr` binary.
//!
//! Reports own stdout, and `gcr check --json` output must stay parseable,
//! so every log line goes to stderr. Logs stay quiet (WARN) unless the
//! operator passes `--verbose`; `RUST_LOG` overrides both.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default verbosity for the `--verbose` flag.
pub fn level_for(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Whether human-readable log lines may carry ANSI colour.
fn stderr_ansi() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

/// Initialise the global tracing subscriber.
///
/// `json` switches to newline-delimited JSON; `level` applies when
/// `RUST_LOG` is unset. Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_ansi(stderr_ansi()))
            .try_init()
            .ok();
    }
}
