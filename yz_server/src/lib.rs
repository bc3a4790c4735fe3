//! Transport shell for the Yatzy engine: an axum WebSocket endpoint, the
//! connection hub the tables deliver through, environment configuration and
//! logging setup.

pub mod api;
pub mod config;
pub mod logging;
