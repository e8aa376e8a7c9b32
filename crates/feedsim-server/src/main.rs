//! Feed simulator binary.
//!
//! Replays a recorded contest event feed under manual operator control.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first CLI argument, else `feedsim.yaml`, else defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Load the event log (fatal on any malformed record)
//! 4. Capture the contest start clock and position the release cursor
//! 5. Serve until `Ctrl-C`

use std::path::PathBuf;
use std::sync::Arc;

use feedsim_engine::{EventLog, StartClock};
use feedsim_server::config::{FeedsimConfig, LoggingConfig};
use feedsim_server::error::AppError;
use feedsim_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, log loading or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = FeedsimConfig::resolve(config_path.as_deref()).map_err(AppError::from)?;

    init_logging(&config.logging);
    info!(
        log_path = %config.feed.log_path.display(),
        host = %config.server.host,
        port = config.server.port,
        "configuration loaded"
    );

    let log = EventLog::load(&config.feed.log_path).map_err(AppError::from)?;
    let start = StartClock::capture();
    let state = Arc::new(AppState::new(log, start));

    let status = state.status();
    info!(
        total_events = status.total_events,
        boundary = status.boundary,
        started_at = status.started_at,
        "event log loaded"
    );

    feedsim_server::start_server(&config.server, state)
        .await
        .map_err(AppError::from)?;

    info!("feedsim shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
