//! Multi-table Yatzy server using the async actor model.
//!
//! Participants connect over WebSocket, are seated into tables by the
//! table manager, and each full table runs its game in its own actor.

use std::net::SocketAddr;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use yz_server::{api, config::ServerConfig, logging};

const HELP: &str = "\
Run a multi-table Yatzy server

USAGE:
  yz_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:9000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:9000)
  TURN_MODE                rotation | independent
  ROUNDS_PER_PARTICIPANT   Scoring actions per participant (1-13)
  BOT_DIFFICULTY           easy | medium | hard
  TURN_TIMEOUT_MS          Rotation-mode turn timeout
  TABLE_CAPACITY           Participants per table
  BOT_ROUND_DELAY_MS       Pause between independent-mode bot rounds
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    logging::init();

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;
    info!(
        "Starting Yatzy server at {} ({} mode, {} seats per table, {} bots)",
        config.bind,
        config.session.turn_mode,
        config.session.capacity,
        config.session.bot_difficulty
    );

    let state = api::AppState::new(config.session.clone())?;
    let table_manager = state.table_manager.clone();
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at ws://{}/ws. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    table_manager.shutdown().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
