//! Pintar Cilik · early-learning quiz backend
//!
//! - Axum HTTP + WebSocket API driving five-question rounds
//!   (counting, reading, logic) for children aged 3 to 10
//! - Optional hosted auth + persistence (Supabase), in-memory fallback
//! - Optional OpenAI parent report with fixed fallback text
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   APP_CONFIG_PATH      : path to TOML config (report prompts + quiz timing)
//!   OPENAI_API_KEY       : enables the AI report if present
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_REPORT_MODEL  : default "gpt-4o-mini"
//!   SUPABASE_URL         : hosted project URL (auth + persistence)
//!   SUPABASE_ANON_KEY    : public key; SUPABASE_SERVICE_ROLE_KEY preferred for persistence
//!   STATIC_DIR           : default "./static"
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod banks;
mod generators;
mod session;
mod rounds;
mod config;
mod store;
mod identity;
mod openai;
mod report;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: store, identity, OpenAI client, prompts, active rounds.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "pintarcilik", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "pintarcilik", active_rounds = state.rounds.len().await, "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "pintarcilik", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "pintarcilik", "Shutdown signal received");
}
