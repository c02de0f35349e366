//! Caller identity. The deployment fronts this service with a proxy that
//! authenticates users and forwards the verified id in `x-user-id`; handlers
//! only need presence and a non-blank value.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use tracing::warn;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, extracted from `x-user-id`.
#[derive(Clone, Debug)]
pub struct Caller {
  pub user_id: String,
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
      warn!(target: "skilltrail_backend", path = %parts.uri.path(), "Rejected request without x-user-id");
      return Err(ApiError::message(StatusCode::FORBIDDEN, "Unauthorized, token is required"));
    };
    let user_id = value.to_str().unwrap_or("").trim();
    if user_id.is_empty() {
      warn!(target: "skilltrail_backend", path = %parts.uri.path(), "Rejected request with blank x-user-id");
      return Err(ApiError::message(StatusCode::UNAUTHORIZED, "Token invalid"));
    }
    Ok(Caller { user_id: user_id.to_string() })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::Request;

  async fn extract(req: Request<()>) -> Result<Caller, ApiError> {
    let (mut parts, _) = req.into_parts();
    Caller::from_request_parts(&mut parts, &()).await
  }

  #[tokio::test]
  async fn missing_header_is_forbidden() {
    let req = Request::builder().uri("/api/roadmap/getMyroadmaps").body(()).unwrap();
    let err = extract(req).await.unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    assert_eq!(err.body["message"], "Unauthorized, token is required");
  }

  #[tokio::test]
  async fn blank_header_is_unauthorized() {
    let req = Request::builder()
      .uri("/api/assessment/questions")
      .header(USER_ID_HEADER, "   ")
      .body(())
      .unwrap();
    let err = extract(req).await.unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.body["message"], "Token invalid");
  }

  #[tokio::test]
  async fn present_header_yields_the_caller() {
    let req = Request::builder()
      .uri("/api/assessment/questions")
      .header(USER_ID_HEADER, " user-7 ")
      .body(())
      .unwrap();
    let caller = extract(req).await.unwrap();
    assert_eq!(caller.user_id, "user-7");
  }
}
