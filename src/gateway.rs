//! Model gateway: the chat-completions client plus the retry/backoff policy.
//!
//! A single attempt lives behind the `ModelClient` trait so the retry loop is
//! testable with scripted fakes and the HTTP client stays swappable. The
//! production impl speaks the OpenAI-compatible wire protocol and requests
//! plain text; JSON recovery happens downstream in `sanitize`.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::error::ProviderError;

/// Appended to every generation prompt. Models ignore it often enough that
/// the sanitizer exists.
pub const JSON_GUARD: &str = "RULES:\n- Respond ONLY with valid JSON. No extra text, no comments.\n- If unsure, return an empty JSON object {}.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TEMPERATURE: f32 = 0.7;

/// Which configured model a call should use. Question generation runs on the
/// fast model; roadmap generation on the strong one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelTier {
  Fast,
  Strong,
}

/// One completion attempt. No retries at this layer.
#[async_trait]
pub trait ModelClient: Send + Sync {
  async fn complete(&self, tier: ModelTier, system: &str, user: &str) -> Result<String, ProviderError>;
}

/// How transient failures are retried: the first call plus up to
/// `max_retries` retries, sleeping `base_delay * retry_number` before each
/// (2s, 4s, 6s with the defaults).
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_retries: 3, base_delay: Duration::from_secs(2) }
  }
}

/// Entry point for all model calls. Owns error classification handling via
/// the policy; constructed once at startup and injected through `AppState`.
#[derive(Clone)]
pub struct Gateway {
  client: Arc<dyn ModelClient>,
  policy: RetryPolicy,
}

impl Gateway {
  pub fn new(client: Arc<dyn ModelClient>, policy: RetryPolicy) -> Self {
    Self { client, policy }
  }

  /// Build the production gateway if MODEL_API_KEY is set; otherwise None.
  pub fn from_env() -> Option<Self> {
    let client = ChatClient::from_env()?;
    info!(target: "skilltrail_backend", base_url = %client.base_url, fast_model = %client.fast_model, strong_model = %client.strong_model, "Model gateway enabled.");
    Some(Self::new(Arc::new(client), RetryPolicy::default()))
  }

  /// Run one generation with the retry policy. Permanent errors surface
  /// immediately; a transient error that survives the bound comes back with
  /// `retries_exhausted` set.
  #[instrument(level = "info", skip(self, system, user), fields(?tier, user_len = user.len()))]
  pub async fn generate(&self, tier: ModelTier, system: &str, user: &str) -> Result<String, ProviderError> {
    let mut attempt: u32 = 0;
    loop {
      let started = std::time::Instant::now();
      match self.client.complete(tier, system, user).await {
        Ok(text) => {
          info!(target: "skilltrail_backend", attempt, elapsed = ?started.elapsed(), response_len = text.len(), "Model call succeeded");
          return Ok(text);
        }
        Err(e) if e.transient && attempt < self.policy.max_retries => {
          attempt += 1;
          let delay = self.policy.base_delay * attempt;
          warn!(target: "skilltrail_backend", attempt, max = self.policy.max_retries, status = ?e.status, ?delay, error = %e, "Transient provider error; retrying");
          tokio::time::sleep(delay).await;
        }
        Err(mut e) => {
          if e.transient {
            e.retries_exhausted = true;
            error!(target: "skilltrail_backend", attempt, status = ?e.status, error = %e, "Provider retries exhausted");
          } else {
            error!(target: "skilltrail_backend", attempt, status = ?e.status, error = %e, "Permanent provider error");
          }
          return Err(e);
        }
      }
    }
  }
}

/// Production chat-completions client.
#[derive(Clone)]
pub struct ChatClient {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

impl ChatClient {
  /// Construct the client if we find MODEL_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("MODEL_API_KEY").ok()?;
    let base_url =
      std::env::var("MODEL_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model = std::env::var("MODEL_FAST").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model = std::env::var("MODEL_STRONG").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model })
  }

  fn model_for(&self, tier: ModelTier) -> &str {
    match tier {
      ModelTier::Fast => &self.fast_model,
      ModelTier::Strong => &self.strong_model,
    }
  }
}

#[async_trait]
impl ModelClient for ChatClient {
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model_for(tier)))]
  async fn complete(&self, tier: ModelTier, system: &str, user: &str) -> Result<String, ProviderError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model_for(tier).to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: TEMPERATURE,
    };

    // Transport failures (timeout, refused, reset) are worth retrying.
    let res = self.client.post(&url)
      .header(USER_AGENT, "skilltrail-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| ProviderError::transient(format!("transport error: {e}"), None))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_provider_error(&body).unwrap_or(body);
      let message = format!("provider HTTP {status}: {msg}");
      return Err(match status {
        429 | 500 | 503 => ProviderError::transient(message, Some(status)),
        _ => ProviderError::permanent(message, Some(status)),
      });
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| ProviderError::permanent(format!("invalid provider response: {e}"), None))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Provider usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from a provider error body.
fn extract_provider_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
