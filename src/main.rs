//! LifeMate · Personal-productivity dashboard backend
//!
//! - Axum HTTP + WebSocket API for the dashboard panels
//! - LLM-backed generation (quiz, study tasks, yoga advice, symptom notes) with
//!   defensive JSON extraction and bundled fallback content
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   LLM_PROVIDER       : "openai" (default) or "gemini"
//!   OPENAI_API_KEY     : enables the OpenAI provider
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL       : default "gpt-4o-mini"
//!   GEMINI_API_KEY     : enables the Gemini provider
//!   GEMINI_BASE_URL    : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL       : default "gemini-1.5-flash"
//!   YOUTUBE_API_KEY    : enables video enrichment for yoga advice
//!   NOTIFICATIONS_PATH : JSON file mirroring the notification history
//!   AGENT_CONFIG_PATH  : path to TOML config (prompt templates + generation settings)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod completion;
mod config;
mod domain;
mod extract;
mod logic;
mod notifications;
mod pipeline;
mod protocol;
mod routes;
mod schema;
mod seeds;
mod state;
mod streak;
mod tasks;
mod telemetry;
mod util;
mod validate;
mod video;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // One state for the process: generator, prompts, notification store, task board.
  let state = Arc::new(AppState::from_env());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lifemate", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "lifemate", error = %e, "Failed to listen for shutdown signal");
    return;
  }
  info!(target: "lifemate", "Shutdown signal received");
}
