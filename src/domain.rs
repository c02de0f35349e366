//! Domain models used by the backend: skill levels, question difficulty,
//! assessment results, and the persisted roadmap plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Learner proficiency tier, either self-reported or derived from an
/// assessment score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
  Beginner,
  Intermediate,
  Advanced,
}

impl SkillLevel {
  /// Lenient parse from request/model strings ("beginner", "Beginner", ...).
  pub fn parse(s: &str) -> Option<SkillLevel> {
    match s.trim().to_lowercase().as_str() {
      "beginner" => Some(SkillLevel::Beginner),
      "intermediate" => Some(SkillLevel::Intermediate),
      "advanced" => Some(SkillLevel::Advanced),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      SkillLevel::Beginner => "Beginner",
      SkillLevel::Intermediate => "Intermediate",
      SkillLevel::Advanced => "Advanced",
    }
  }
}

/// Question difficulty tier. Wire form is capitalized ("Easy"); lowercase
/// aliases tolerate sloppier model output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
  #[serde(alias = "easy")]
  Easy,
  #[serde(alias = "medium")]
  Medium,
  #[serde(alias = "hard")]
  Hard,
}

impl Difficulty {
  pub fn parse(s: &str) -> Option<Difficulty> {
    match s.trim().to_lowercase().as_str() {
      "easy" => Some(Difficulty::Easy),
      "medium" => Some(Difficulty::Medium),
      "hard" => Some(Difficulty::Hard),
      _ => None,
    }
  }
}

/// Per-difficulty tallies from one evaluated assessment. Missing wire
/// fields deserialize as zero, so partial client payloads still parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreBreakdown {
  pub correct: u32,
  pub easy_correct: u32,
  pub medium_correct: u32,
  pub hard_correct: u32,
}

/// One multiple-choice question. The shape is identical whether the set came
/// from the model or the static bank; callers cannot tell the source apart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
  #[serde(default)]
  pub id: u32,
  pub question: String,
  pub options: Vec<String>,
  #[serde(rename = "correct")]
  pub correct_index: u32,
  pub difficulty: Difficulty,
  #[serde(default)]
  pub explanation: String,
}

/// Outcome of scoring one submitted answer sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
  pub score: u32,
  pub level: SkillLevel,
  pub breakdown: ScoreBreakdown,
}

/// Persisted study plan. Created once per successful generation, owned by
/// the caller identity, never mutated after insert.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapPlan {
  pub id: String,
  pub user_id: String,
  pub topic: String,
  pub duration: u32,
  pub level: SkillLevel,
  pub days: Vec<DayPlan>,
  pub created_at: DateTime<Utc>,
}

/// One day of the plan. `day_number` is 1-based and must match the day's
/// position in the sequence; `estimated_minutes` travels as `estimatedTime`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
  pub day_number: u32,
  #[serde(rename = "estimatedTime", default)]
  pub estimated_minutes: u32,
  #[serde(default)]
  pub levels: Vec<LevelPlan>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPlan {
  pub level_number: u32,
  #[serde(default)]
  pub topics: Vec<TopicItem>,
}

/// A single study topic. `resources` holds up to two official-documentation
/// URLs, or the literal sentinel "Documentation not available".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopicItem {
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub resources: Vec<String>,
}
