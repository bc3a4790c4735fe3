//! Structured logging configuration.
//!
//! The subscriber also collects records emitted through the `log` facade,
//! so the game library's logs land in the same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var and default to
/// `info` with noisy HTTP internals turned down.
///
/// # Example
///
/// ```no_run
/// use yz_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a connection lifecycle event with structured data
///
/// # Arguments
///
/// * `event_type` - What happened (`connected`, `replaced`, `closed`, ...)
/// * `participant` - Participant identifier from the handshake
/// * `connection_id` - Per-socket identifier
///
/// # Example
///
/// ```
/// use yz_server::logging::log_connection_event;
///
/// log_connection_event("connected", "alice", "6f1c0b8e");
/// ```
pub fn log_connection_event(event_type: &str, participant: &str, connection_id: &str) {
    tracing::info!(
        event_type = event_type,
        participant = participant,
        connection_id = connection_id,
        "CONNECTION: {}",
        event_type
    );
}
