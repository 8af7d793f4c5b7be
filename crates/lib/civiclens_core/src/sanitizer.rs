// @zen-component: CHAT-AnswerSanitizer
//
//! Answer extraction and cleanup.
//!
//! The upstream has returned text in more than one envelope shape, so
//! extraction walks an ordered list of strategies and takes the first
//! non-empty hit. Cleanup strips markup the client UI cannot render.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::gateway::ModelResponse;
use crate::outcome::Outcome;

/// Pulls candidate text out of an envelope.
type ExtractionStrategy = fn(&Value) -> Option<&str>;

/// Tried in order; the first non-empty result wins.
const EXTRACTION_STRATEGIES: &[ExtractionStrategy] = &[choice_message_content, output_text];

static EMPHASIS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").ok());
static CITATION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\[\d+\]").ok());

/// `choices[0].message.content`
fn choice_message_content(body: &Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// `output_text`
fn output_text(body: &Value) -> Option<&str> {
    body.get("output_text")?.as_str()
}

/// Returns the model's raw text, or `None` if no known shape has any.
pub fn extract_text(body: &Value) -> Option<&str> {
    EXTRACTION_STRATEGIES
        .iter()
        .filter_map(|strategy| strategy(body))
        .find(|text| !text.trim().is_empty())
}

/// Removes `**emphasis**` wrappers and `[n]` citation markers, then trims.
///
/// Repeats until nothing changes, so `clean(clean(x)) == clean(x)`.
pub fn clean(text: &str) -> String {
    let (Some(emphasis), Some(citation)) = (EMPHASIS.as_ref(), CITATION.as_ref()) else {
        return text.trim().to_string();
    };
    let mut current = text.to_string();
    loop {
        let unwrapped = emphasis.replace_all(&current, "$1");
        let next = citation.replace_all(&unwrapped, "").trim().to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Extracts and cleans the answer from an upstream envelope.
///
/// An envelope without usable text is a soft failure carrying the whole
/// envelope as diagnostics.
pub fn sanitize(response: &ModelResponse) -> Outcome<String> {
    let answer = extract_text(&response.body).map(clean).unwrap_or_default();
    if answer.is_empty() {
        Outcome::soft(response.body.clone())
    } else {
        Outcome::Success(answer)
    }
}

/// Interprets a chat reply, treating an upstream-reported error as a soft
/// failure rather than an answer.
///
/// Diagnostics are the upstream `error` object when present, otherwise the
/// envelope itself, otherwise just the status.
pub fn answer_from(response: &ModelResponse) -> Outcome<String> {
    if response.error().is_some() || !response.is_success_status() {
        let detail = match response.error() {
            Some(error) => error.clone(),
            None if !response.body.is_null() => response.body.clone(),
            None => serde_json::json!({ "status": response.status }),
        };
        return Outcome::soft(serde_json::json!({ "error": detail }));
    }
    sanitize(response)
}
