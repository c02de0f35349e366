//! Error types for the generation pipeline and their HTTP mapping.
//!
//! `ProviderError` carries the classification the retry loop needs
//! (transient vs permanent); `GenerationError` is the taxonomy the roadmap
//! and assessment paths surface to handlers. Raw model text never rides on
//! these types toward clients; diagnostics go to logs at the failure site.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failure from a single model-provider call.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
  pub message: String,
  /// HTTP status from the provider, if the failure had one.
  pub status: Option<u16>,
  /// Worth retrying (rate limit, server overload, transport failure).
  pub transient: bool,
  /// Set by the retry loop when the bound was hit on a transient error.
  pub retries_exhausted: bool,
}

impl ProviderError {
  pub fn transient(message: impl Into<String>, status: Option<u16>) -> Self {
    Self { message: message.into(), status, transient: true, retries_exhausted: false }
  }

  pub fn permanent(message: impl Into<String>, status: Option<u16>) -> Self {
    Self { message: message.into(), status, transient: false, retries_exhausted: false }
  }
}

/// Why a generation call failed, from request validation through schema
/// checks. `InvalidRequest` is the only variant produced before the model
/// call; everything else happens after.
#[derive(Clone, Debug, Error)]
pub enum GenerationError {
  #[error("invalid request: {0}")]
  InvalidRequest(String),
  #[error(transparent)]
  Provider(#[from] ProviderError),
  /// The sanitizer could not recover JSON from the raw output.
  #[error("unparseable model output: {diagnostic}")]
  ParseFailure { diagnostic: String },
  /// Parsed JSON did not satisfy the structural contract.
  #[error("schema mismatch: {reason}")]
  SchemaMismatch { reason: String },
}

/// JSON error response in the `{"error": ...}` / `{"message": ...}` shapes
/// the frontend expects.
#[derive(Debug)]
pub struct ApiError {
  pub status: StatusCode,
  pub body: serde_json::Value,
}

impl ApiError {
  pub fn error(status: StatusCode, msg: &str) -> Self {
    Self { status, body: json!({ "error": msg }) }
  }

  pub fn message(status: StatusCode, msg: &str) -> Self {
    Self { status, body: json!({ "message": msg }) }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(self.body)).into_response()
  }
}
