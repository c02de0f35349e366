//! Roadmap generation: request validation, the prompt contract, and the
//! deterministic checks a model plan must pass before we persist it.
//!
//! The model is the creative half; everything here is the strict half. A
//! plan that does not carry exactly the requested number of days, numbered
//! sequentially from 1, is rejected no matter how plausible it reads.

use serde_json::Value;
use tracing::{error, instrument};

use crate::config::Prompts;
use crate::domain::{DayPlan, ScoreBreakdown, SkillLevel};
use crate::error::GenerationError;
use crate::gateway::{Gateway, ModelTier, JSON_GUARD};
use crate::sanitize;
use crate::util::{fill_template, trunc_for_log};

pub const MAX_DURATION_DAYS: u32 = 365;

/// How much raw model output we keep in diagnostics and logs.
const RAW_DIAG_MAX: usize = 500;

/// Structural contract appended to the roadmap prompt.
const ROADMAP_SCHEMA_HINT: &str = r#"Return JSON with this exact structure:
{
  "topic": "string",
  "duration": number,
  "level": "Beginner" | "Intermediate" | "Advanced",
  "days": [
    {
      "dayNumber": 1,
      "estimatedTime": 120,
      "levels": [
        {
          "levelNumber": 1,
          "topics": [
            {
              "title": "string",
              "description": "string",
              "resources": ["string", "string"]
            }
          ]
        }
      ]
    }
  ]
}
Make "days" length equal to the provided duration."#;

/// A validated request to generate a roadmap.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
  pub topic: String,
  pub duration_days: u32,
  pub level: SkillLevel,
  pub score: Option<f64>,
  pub breakdown: Option<ScoreBreakdown>,
}

impl GenerationRequest {
  /// Validate raw API parameters. Rejections here never reach the model.
  pub fn from_params(
    topic: Option<String>,
    duration: Option<f64>,
    level: Option<String>,
    score: Option<f64>,
    breakdown: Option<ScoreBreakdown>,
  ) -> Result<Self, GenerationError> {
    let topic = topic.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let (Some(topic), Some(duration), Some(level)) = (topic, duration, level) else {
      return Err(GenerationError::InvalidRequest(
        "topic, duration and level are required".into(),
      ));
    };

    if !duration.is_finite()
      || duration.fract() != 0.0
      || duration < 1.0
      || duration > MAX_DURATION_DAYS as f64
    {
      return Err(GenerationError::InvalidRequest(format!(
        "duration must be a whole number of days between 1 and {MAX_DURATION_DAYS}"
      )));
    }

    let level = SkillLevel::parse(&level)
      .ok_or_else(|| GenerationError::InvalidRequest(format!("unknown level '{level}'")))?;

    Ok(Self { topic, duration_days: duration as u32, level, score, breakdown })
  }
}

/// The parts of a model plan we keep. Topic and level fall back to the
/// request when the model omits them.
#[derive(Clone, Debug)]
pub struct GeneratedPlan {
  pub topic: String,
  pub level: SkillLevel,
  pub days: Vec<DayPlan>,
}

/// (system, user) messages for the roadmap generation call.
pub fn build_roadmap_prompt(prompts: &Prompts, req: &GenerationRequest) -> (String, String) {
  let score_context = match (req.score, &req.breakdown) {
    (Some(score), Some(b)) => format!(
      "The learner scored {score}% on the placement assessment ({} correct: {} easy, {} medium, {} hard). Calibrate the early days to that result.",
      b.correct, b.easy_correct, b.medium_correct, b.hard_correct
    ),
    (Some(score), None) => format!(
      "The learner scored {score}% on the placement assessment. Calibrate the early days to that result."
    ),
    _ => String::new(),
  };
  let duration = req.duration_days.to_string();
  let filled = fill_template(
    &prompts.roadmap_user_template,
    &[
      ("topic", &req.topic),
      ("duration", &duration),
      ("level", req.level.as_str()),
      ("score_context", &score_context),
    ],
  );
  let user = format!("{filled}\n\n{ROADMAP_SCHEMA_HINT}\n\n{JSON_GUARD}");
  (prompts.roadmap_system.clone(), user)
}

/// Full pipeline: prompt, model call with retries, JSON recovery, plan
/// validation. Errors keep their class so the API layer can map them.
#[instrument(level = "info", skip(gateway, prompts, req), fields(topic = %req.topic, days = req.duration_days))]
pub async fn generate_plan(
  gateway: &Gateway,
  prompts: &Prompts,
  req: &GenerationRequest,
) -> Result<GeneratedPlan, GenerationError> {
  let (system, user) = build_roadmap_prompt(prompts, req);
  let raw = gateway.generate(ModelTier::Strong, &system, &user).await?;

  let Some(value) = sanitize::parse(&raw) else {
    error!(target: "roadmap", raw = %trunc_for_log(&raw, RAW_DIAG_MAX), "Model output was not recoverable JSON");
    return Err(GenerationError::ParseFailure { diagnostic: trunc_for_log(&raw, RAW_DIAG_MAX) });
  };

  match validate_plan(&value, req) {
    Ok(plan) => Ok(plan),
    Err(reason) => {
      error!(target: "roadmap", %reason, raw = %trunc_for_log(&raw, RAW_DIAG_MAX), "Model plan failed validation");
      Err(GenerationError::SchemaMismatch { reason })
    }
  }
}

/// Deterministic checks over a parsed plan. Day count must equal the
/// requested duration and day numbers must run 1..=n in order.
pub fn validate_plan(value: &Value, req: &GenerationRequest) -> Result<GeneratedPlan, String> {
  let obj = value.as_object().ok_or("expected a JSON object")?;
  let day_values = obj
    .get("days")
    .and_then(|d| d.as_array())
    .ok_or("missing \"days\" array")?;

  if day_values.len() != req.duration_days as usize {
    return Err(format!(
      "expected exactly {} days, model returned {}",
      req.duration_days,
      day_values.len()
    ));
  }

  let mut days = Vec::with_capacity(day_values.len());
  for (i, day_value) in day_values.iter().enumerate() {
    let day: DayPlan = serde_json::from_value(day_value.clone())
      .map_err(|e| format!("day {}: {}", i + 1, e))?;
    let expected = (i + 1) as u32;
    if day.day_number != expected {
      return Err(format!("day {expected} is numbered {}", day.day_number));
    }
    days.push(day);
  }

  let topic = obj
    .get("topic")
    .and_then(|t| t.as_str())
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .unwrap_or(req.topic.as_str())
    .to_string();
  let level = obj
    .get("level")
    .and_then(|l| l.as_str())
    .and_then(SkillLevel::parse)
    .unwrap_or(req.level);

  Ok(GeneratedPlan { topic, level, days })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ProviderError;
  use crate::gateway::{ModelClient, RetryPolicy};
  use async_trait::async_trait;
  use serde_json::json;
  use std::sync::Arc;
  use std::time::Duration;

  fn request(days: u32) -> GenerationRequest {
    GenerationRequest::from_params(
      Some("Python".into()),
      Some(days as f64),
      Some("Beginner".into()),
      None,
      None,
    )
    .unwrap()
  }

  fn day(n: u32) -> Value {
    json!({
      "dayNumber": n,
      "estimatedTime": 90,
      "levels": [{
        "levelNumber": 1,
        "topics": [{
          "title": format!("Step {n}"),
          "description": "Work through the basics.",
          "resources": ["https://docs.python.org/3/tutorial/", "https://docs.python.org/3/reference/"]
        }]
      }]
    })
  }

  #[test]
  fn from_params_requires_topic_duration_and_level() {
    for (topic, duration, level) in [
      (None, Some(5.0), Some("Beginner".to_string())),
      (Some("   ".to_string()), Some(5.0), Some("Beginner".to_string())),
      (Some("Python".to_string()), None, Some("Beginner".to_string())),
      (Some("Python".to_string()), Some(5.0), None),
    ] {
      let err = GenerationRequest::from_params(topic, duration, level, None, None).unwrap_err();
      assert!(matches!(err, GenerationError::InvalidRequest(_)), "{err}");
    }
  }

  #[test]
  fn from_params_rejects_bad_durations() {
    for duration in [0.0, -3.0, 5.5, 366.0, f64::NAN] {
      let err = GenerationRequest::from_params(
        Some("Python".into()),
        Some(duration),
        Some("Beginner".into()),
        None,
        None,
      )
      .unwrap_err();
      match err {
        GenerationError::InvalidRequest(msg) => assert!(msg.contains("whole number"), "{msg}"),
        other => panic!("unexpected error: {other}"),
      }
    }
    assert!(GenerationRequest::from_params(
      Some("Python".into()), Some(365.0), Some("Beginner".into()), None, None
    ).is_ok());
  }

  #[test]
  fn from_params_rejects_unknown_levels() {
    let err = GenerationRequest::from_params(
      Some("Python".into()),
      Some(5.0),
      Some("wizard".into()),
      None,
      None,
    )
    .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidRequest(_)));
  }

  #[test]
  fn validate_plan_enforces_the_exact_day_count() {
    let req = request(4);
    let plan = json!({"topic": "Python", "days": [day(1), day(2), day(3)]});
    let reason = validate_plan(&plan, &req).unwrap_err();
    assert!(reason.contains("expected exactly 4 days"), "{reason}");
  }

  #[test]
  fn validate_plan_enforces_sequential_day_numbers() {
    let req = request(2);
    let plan = json!({"days": [day(1), day(3)]});
    let reason = validate_plan(&plan, &req).unwrap_err();
    assert!(reason.contains("day 2 is numbered 3"), "{reason}");
  }

  #[test]
  fn validate_plan_rejects_non_objects() {
    let req = request(1);
    assert!(validate_plan(&json!([day(1)]), &req).is_err());
    assert!(validate_plan(&json!("a plan"), &req).is_err());
  }

  #[test]
  fn validate_plan_prefers_model_topic_and_level_but_backfills() {
    let req = request(1);

    let descriptive = json!({"topic": "Advanced Python", "level": "Advanced", "days": [day(1)]});
    let plan = validate_plan(&descriptive, &req).unwrap();
    assert_eq!(plan.topic, "Advanced Python");
    assert_eq!(plan.level, SkillLevel::Advanced);

    let bare = json!({"topic": "   ", "days": [day(1)]});
    let plan = validate_plan(&bare, &req).unwrap();
    assert_eq!(plan.topic, "Python");
    assert_eq!(plan.level, SkillLevel::Beginner);
  }

  #[test]
  fn roadmap_prompt_carries_the_contract() {
    let req = request(5);
    let (system, user) = build_roadmap_prompt(&Prompts::default(), &req);
    assert!(!system.is_empty());
    assert!(user.contains("Python"));
    assert!(user.contains('5'));
    assert!(user.contains("Make \"days\" length equal to the provided duration."));
    assert!(user.contains("Respond ONLY with valid JSON"));
    assert!(!user.contains("scored"));
  }

  #[test]
  fn roadmap_prompt_includes_assessment_context_when_present() {
    let breakdown = ScoreBreakdown { correct: 6, easy_correct: 3, medium_correct: 2, hard_correct: 1 };
    let req = GenerationRequest::from_params(
      Some("Python".into()),
      Some(5.0),
      Some("Intermediate".into()),
      Some(60.0),
      Some(breakdown),
    )
    .unwrap();
    let (_, user) = build_roadmap_prompt(&Prompts::default(), &req);
    assert!(user.contains("scored 60%"));
    assert!(user.contains("6 correct"));
  }

  struct FixedClient {
    response: String,
  }

  #[async_trait]
  impl ModelClient for FixedClient {
    async fn complete(&self, _tier: ModelTier, _system: &str, _user: &str) -> Result<String, ProviderError> {
      Ok(self.response.clone())
    }
  }

  fn gateway_with(response: &str) -> Gateway {
    Gateway::new(
      Arc::new(FixedClient { response: response.into() }),
      RetryPolicy { max_retries: 0, base_delay: Duration::from_millis(1) },
    )
  }

  #[tokio::test]
  async fn generate_plan_recovers_fenced_model_output() {
    let req = request(2);
    let body = json!({"topic": "Python", "level": "Beginner", "days": [day(1), day(2)]});
    let gateway = gateway_with(&format!("Here you go!\n```json\n{body}\n```"));

    let plan = generate_plan(&gateway, &Prompts::default(), &req).await.unwrap();

    assert_eq!(plan.days.len(), 2);
    assert_eq!(plan.days[1].day_number, 2);
    assert_eq!(plan.days[0].estimated_minutes, 90);
  }

  #[tokio::test]
  async fn generate_plan_reports_unrecoverable_output() {
    let req = request(1);
    let gateway = gateway_with("I cannot help with that request.");

    let err = generate_plan(&gateway, &Prompts::default(), &req).await.unwrap_err();

    match err {
      GenerationError::ParseFailure { diagnostic } => {
        assert!(diagnostic.contains("I cannot help"));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn generate_plan_rejects_wrong_day_counts() {
    let req = request(3);
    let body = json!({"topic": "Python", "days": [day(1), day(2)]});
    let gateway = gateway_with(&body.to_string());

    let err = generate_plan(&gateway, &Prompts::default(), &req).await.unwrap_err();
    assert!(matches!(err, GenerationError::SchemaMismatch { .. }));
  }
}
