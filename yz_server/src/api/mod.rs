//! HTTP/WebSocket API for the Yatzy server.
//!
//! # Endpoints
//!
//! - `GET /ws?winzoId=<id>` - WebSocket connection to the participant's table
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use yz_server::api::{AppState, create_router};
//! use yatzy::table::SessionConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(SessionConfig::default())?;
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod hub;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use yatzy::table::{ConfigError, SessionConfig, TableManager};

use hub::ConnectionHub;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; both fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub table_manager: Arc<TableManager>,
    pub hub: Arc<ConnectionHub>,
}

impl AppState {
    /// Wire a table manager to a fresh connection hub.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let hub = Arc::new(ConnectionHub::new());
        let table_manager = Arc::new(TableManager::new(config, hub.clone())?);
        Ok(Self { table_manager, hub })
    }
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:9000/health
/// # {"status":"healthy","tables":3,"connections":5}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let tables = state.table_manager.active_table_count().await;
    let connections = state.hub.connection_count().await;

    Json(json!({
        "status": "healthy",
        "tables": tables,
        "connections": connections,
    }))
}
