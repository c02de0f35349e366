//! Recovery of JSON payloads from raw model output.
//!
//! Models wrap JSON in code fences, prepend prose, leave trailing commas, and
//! emit JS-style unquoted keys. This module is the single place where raw
//! model text becomes a `serde_json::Value`; callers never run their own
//! regexes over model output.
//!
//! The pipeline is ordered, and each step is a fallback for the previous one:
//! fence extraction, prose stripping, strict parse, outer bracket-span cut
//! (array preferred), three textual repairs, one strict re-parse. Anything
//! still unparseable is `None`, with a truncated diagnostic in the logs.
//! Repairs never rewrite quote styles; that can corrupt legitimate string
//! content containing apostrophes.

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::util::trunc_for_log;

const DIAG_MAX_BYTES: usize = 500;

/// Best-effort JSON recovery. Pure and deterministic; never panics, never
/// errors. `None` signals unrecoverable input.
pub fn parse(raw: &str) -> Option<Value> {
  let fenced = strip_code_fence(raw);
  let cleaned = strip_prose(fenced);

  if let Ok(v) = serde_json::from_str::<Value>(cleaned) {
    return Some(v);
  }

  let candidate = match bracket_span(cleaned) {
    Some(c) => c,
    None => {
      debug!(target: "skilltrail_backend", "No JSON bracket structure in model output");
      return None;
    }
  };

  let repaired = repair(candidate);
  match serde_json::from_str::<Value>(&repaired) {
    Ok(v) => Some(v),
    Err(e) => {
      warn!(
        target: "skilltrail_backend",
        error = %e,
        candidate = %trunc_for_log(&repaired, DIAG_MAX_BYTES),
        "Model output unrecoverable after repairs"
      );
      None
    }
  }
}

/// Interior of the first fenced code block if present, else the raw text.
fn strip_code_fence(raw: &str) -> &str {
  let fence = rx(r"(?is)```(?:json)?\s*(.*?)```");
  match fence.captures(raw).and_then(|c| c.get(1)) {
    Some(m) => m.as_str(),
    None => raw,
  }
}

/// Cut prose wrapping: everything before the first `{`/`[` and after the
/// last `}`/`]`. Empty result means the text had no bracket structure.
fn strip_prose(text: &str) -> &str {
  let text = text.trim();
  let start = match text.find(|c| c == '{' || c == '[') {
    Some(i) => i,
    None => return "",
  };
  let end = match text.rfind(|c| c == '}' || c == ']') {
    Some(i) => i,
    None => return "",
  };
  if end < start {
    return "";
  }
  &text[start..=end]
}

/// Outermost bracketed region, preferring an array span over an object span.
fn bracket_span(text: &str) -> Option<&str> {
  if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
    if start < end {
      return Some(&text[start..=end]);
    }
  }
  if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
    if start < end {
      return Some(&text[start..=end]);
    }
  }
  None
}

/// The three safe textual repairs: drop trailing commas before a closer,
/// quote bare identifier keys, collapse newlines to spaces.
fn repair(candidate: &str) -> String {
  let no_trailing = rx(r",(\s*[}\]])").replace_all(candidate, "${1}").into_owned();
  let quoted_keys = rx(r#"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:"#)
    .replace_all(&no_trailing, "${1}\"${2}\":")
    .into_owned();
  quoted_keys.replace("\r\n", " ").replace('\n', " ")
}

// A pattern that fails to compile degrades to a never-matching regex, so the
// repair it backs becomes a no-op instead of a panic.
fn rx(pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|_| Regex::new("$^").unwrap())
}
