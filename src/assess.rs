//! Assessment scoring and question-set generation helpers.
//!
//! Scoring is pure arithmetic over the submitted answers; the level cutoffs
//! live here as named constants so the derivation is auditable.

use serde_json::Value;
use tracing::debug;

use crate::config::Prompts;
use crate::domain::{AssessmentQuestion, AssessmentResult, Difficulty, ScoreBreakdown, SkillLevel};
use crate::gateway::JSON_GUARD;
use crate::util::fill_template;

/// Scores below this are Beginner.
pub const BEGINNER_MAX: u32 = 40;
/// Scores from BEGINNER_MAX up to and including this are Intermediate;
/// everything above is Advanced.
pub const INTERMEDIATE_MAX: u32 = 75;
/// How many questions an assessment round asks for.
pub const QUESTION_COUNT: usize = 10;

/// Structural contract appended to the question-generation prompt.
const QUESTIONS_SCHEMA_HINT: &str = r#"Return JSON with this exact structure:
[
  {
    "id": 1,
    "question": "string",
    "options": ["string", "string", "string", "string"],
    "correct": 0,
    "difficulty": "Easy" | "Medium" | "Hard",
    "explanation": "string"
  }
]
Rules:
- Return a JSON array of questions only, no wrapper object.
- "options" must contain exactly 4 entries.
- "correct" is the 0-based index of the right option."#;

/// Grade one round of answers. `answers[i]` is the chosen option index for
/// `questions[i]`; missing or out-of-range entries count as wrong. The score
/// is an integer percentage, rounded half-up, 0 when there are no questions.
pub fn evaluate(answers: &[i64], questions: &[AssessmentQuestion]) -> AssessmentResult {
  let mut breakdown = ScoreBreakdown::default();
  for (i, question) in questions.iter().enumerate() {
    if answers.get(i) == Some(&(question.correct_index as i64)) {
      breakdown.correct += 1;
      match question.difficulty {
        Difficulty::Easy => breakdown.easy_correct += 1,
        Difficulty::Medium => breakdown.medium_correct += 1,
        Difficulty::Hard => breakdown.hard_correct += 1,
      }
    }
  }
  let score = if questions.is_empty() {
    0
  } else {
    ((breakdown.correct as f64 / questions.len() as f64) * 100.0).round() as u32
  };
  let level = level_for_score(score);
  debug!(target: "assessment", score, ?level, correct = breakdown.correct, total = questions.len(), "Scored assessment");
  AssessmentResult { score, level, breakdown }
}

pub fn level_for_score(score: u32) -> SkillLevel {
  if score < BEGINNER_MAX {
    SkillLevel::Beginner
  } else if score <= INTERMEDIATE_MAX {
    SkillLevel::Intermediate
  } else {
    SkillLevel::Advanced
  }
}

/// (system, user) messages asking the model for a fresh question set.
pub fn build_questions_prompt(prompts: &Prompts, topic: &str) -> (String, String) {
  let count = QUESTION_COUNT.to_string();
  let filled = fill_template(&prompts.questions_user_template, &[("topic", topic), ("count", &count)]);
  let user = format!("{filled}\n\n{QUESTIONS_SCHEMA_HINT}\n\n{JSON_GUARD}");
  (prompts.questions_system.clone(), user)
}

/// Check a parsed model response against the question contract. Any bad item
/// rejects the whole set; accepted items get ids reassigned 1..=n.
pub fn validate_generated_questions(value: &Value) -> Result<Vec<AssessmentQuestion>, String> {
  let items = value.as_array().ok_or("expected a JSON array of questions")?;
  if items.is_empty() {
    return Err("model returned an empty question list".into());
  }
  let mut out = Vec::with_capacity(items.len());
  for (i, item) in items.iter().enumerate() {
    let mut question: AssessmentQuestion = serde_json::from_value(item.clone())
      .map_err(|e| format!("question {}: {}", i + 1, e))?;
    if question.question.trim().is_empty() {
      return Err(format!("question {} has no text", i + 1));
    }
    if question.options.len() != 4 {
      return Err(format!("question {} needs 4 options, found {}", i + 1, question.options.len()));
    }
    if question.correct_index > 3 {
      return Err(format!("question {} has correct index {} out of range", i + 1, question.correct_index));
    }
    question.id = (i + 1) as u32;
    out.push(question);
  }
  Ok(out)
}
