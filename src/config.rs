//! Loading agent configuration (prompts + optional extra question banks)
//! from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub banks: Vec<BankTopicCfg>,
}

/// Extra fallback-bank entry accepted in TOML configuration.
/// A set registers only if every question is well-formed and the set holds
/// exactly ten items (the invariant the built-in banks also keep).
#[derive(Clone, Debug, Deserialize)]
pub struct BankTopicCfg {
  pub topic: String,
  #[serde(default)]
  pub questions: Vec<BankQuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BankQuestionCfg {
  pub question: String,
  pub options: Vec<String>,
  pub correct: u32,
  pub difficulty: String,
  #[serde(default)]
  pub explanation: String,
}

/// Prompts used for model-backed generation. Defaults are sensible for
/// general technical topics. You can override them in TOML if you need to
/// tune tone/structure; the schema contract itself is not overridable.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Roadmap generation
  pub roadmap_system: String,
  pub roadmap_user_template: String,
  // Assessment question generation
  pub questions_system: String,
  pub questions_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      roadmap_system: "You are an expert curriculum designer. Respond ONLY with strict JSON.".into(),
      roadmap_user_template: "Generate a {duration}-day learning roadmap for the topic \"{topic}\" for a learner with skill level \"{level}\".{score_context}\n\n- Each day should have 2-4 levels.\n- Each level should contain 1-3 topics.\n- Provide estimatedTime for each day (minutes).\n- For each day, include exactly 2 working documentation links from official sources only (e.g., MDN, React Docs, Python Docs).\n- Do not include links from blogs, personal websites, or unofficial sources.\n- If no valid documentation links are available, write \"Documentation not available\" instead of giving broken links.".into(),
      questions_system: "You are an expert technical interviewer. Respond ONLY with strict JSON.".into(),
      questions_user_template: "Generate exactly {count} multiple-choice questions to assess a learner's knowledge of \"{topic}\". Mix Easy, Medium and Hard difficulties. Each question needs 4 options, the zero-based index of the correct option, and a one-sentence explanation.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "skilltrail_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "skilltrail_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "skilltrail_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
