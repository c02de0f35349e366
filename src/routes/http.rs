//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures map onto the JSON error envelope.

use std::sync::Arc;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::assess;
use crate::auth::Caller;
use crate::error::{ApiError, GenerationError};
use crate::protocol::*;
use crate::roadmap::GenerationRequest;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(user = %caller.user_id))]
pub async fn http_post_questions(
  State(state): State<Arc<AppState>>,
  caller: Caller,
  Json(body): Json<QuestionsIn>,
) -> Result<impl IntoResponse, ApiError> {
  let topic = body.topic.as_deref().map(str::trim).unwrap_or("");
  if topic.is_empty() {
    return Err(ApiError::error(StatusCode::BAD_REQUEST, "Topic is required"));
  }
  let (questions, origin) = state.choose_questions(topic).await;
  info!(target: "assessment", user = %caller.user_id, %topic, count = questions.len(), %origin, "Question set served");
  Ok(Json(questions))
}

#[instrument(level = "info", skip(body), fields(user = %caller.user_id, answers = body.answers.len(), questions = body.questions.len()))]
pub async fn http_post_evaluate(
  caller: Caller,
  Json(body): Json<EvaluateIn>,
) -> impl IntoResponse {
  let result = assess::evaluate(&body.answers, &body.questions);
  info!(target: "assessment", user = %caller.user_id, score = result.score, level = result.level.as_str(), "Assessment evaluated");
  Json(result)
}

#[instrument(level = "info", skip(state, body), fields(user = %caller.user_id))]
pub async fn http_post_create_roadmap(
  State(state): State<Arc<AppState>>,
  caller: Caller,
  Json(body): Json<CreateRoadmapIn>,
) -> Result<impl IntoResponse, ApiError> {
  let duration = body.duration.map(|d| d.as_f64());
  let req = GenerationRequest::from_params(body.topic, duration, body.level, body.score, body.breakdown)
    .map_err(roadmap_error)?;
  let plan = state
    .create_roadmap(&caller.user_id, req)
    .await
    .map_err(roadmap_error)?;
  info!(target: "roadmap", user = %caller.user_id, id = %plan.id, days = plan.days.len(), "Roadmap created");
  Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(level = "info", skip(state), fields(user = %caller.user_id))]
pub async fn http_get_my_roadmaps(
  State(state): State<Arc<AppState>>,
  caller: Caller,
) -> impl IntoResponse {
  let plans = state.roadmaps_for_owner(&caller.user_id).await;
  info!(target: "roadmap", user = %caller.user_id, count = plans.len(), "Roadmap list served");
  Json(plans)
}

#[instrument(level = "info", skip(state), fields(user = %caller.user_id, %id))]
pub async fn http_get_roadmap(
  State(state): State<Arc<AppState>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  match state.get_roadmap(&id).await {
    Some(plan) => {
      info!(target: "roadmap", user = %caller.user_id, %id, "Roadmap served");
      Ok(Json(plan))
    }
    None => Err(ApiError::error(StatusCode::BAD_REQUEST, "Not Found")),
  }
}

/// Map generation failures onto wire responses. Validation problems are the
/// caller's fault; everything else is a 500 with a stable message.
fn roadmap_error(e: GenerationError) -> ApiError {
  match e {
    GenerationError::InvalidRequest(msg) => ApiError::error(StatusCode::BAD_REQUEST, &msg),
    GenerationError::SchemaMismatch { .. } => {
      ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid roadmap format from model")
    }
    GenerationError::Provider(_) | GenerationError::ParseFailure { .. } => {
      ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate roadmap")
    }
  }
}
