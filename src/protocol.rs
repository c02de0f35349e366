//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{AssessmentQuestion, ScoreBreakdown};

/// Body of POST /api/assessment/questions.
#[derive(Debug, Deserialize)]
pub struct QuestionsIn {
    pub topic: Option<String>,
}

/// Body of POST /api/assessment/evaluate. `answers[i]` is the chosen option
/// index for `questions[i]`.
#[derive(Debug, Deserialize)]
pub struct EvaluateIn {
    #[serde(default)]
    pub answers: Vec<i64>,
    #[serde(default)]
    pub questions: Vec<AssessmentQuestion>,
}

/// A numeric wire field. Form-driven clients send durations either as a JSON
/// number or as the raw input string ("14"); unparseable text coerces to NaN
/// and fails range validation downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberIn {
    Number(f64),
    Text(String),
}

impl NumberIn {
    pub fn as_f64(&self) -> f64 {
        match self {
            NumberIn::Number(n) => *n,
            NumberIn::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }
}

/// Body of POST /api/roadmap/createRoadMap. Everything is optional here;
/// validation happens server-side so bad payloads get clean 400s.
#[derive(Debug, Deserialize)]
pub struct CreateRoadmapIn {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub duration: Option<NumberIn>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub breakdown: Option<ScoreBreakdown>,
}

/// Response of GET /api/health.
#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
