//! SkillTrail · Learning Roadmap Backend
//!
//! - Axum HTTP API (assessment + roadmap generation)
//! - Optional model-provider integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 6001)
//!   MODEL_API_KEY     : enables model integration if present
//!   MODEL_BASE_URL    : default "https://api.openai.com/v1"
//!   MODEL_FAST      : default "gpt-4o-mini" (question generation)
//!   MODEL_STRONG      : default "gpt-4o" (roadmap generation)
//!   AGENT_CONFIG_PATH  : path to TOML config (prompts + optional question banks)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod sanitize;
mod gateway;
mod bank;
mod assess;
mod roadmap;
mod state;
mod protocol;
mod auth;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (in-memory stores, model gateway, prompts).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 6001.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 6001)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "skilltrail_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
