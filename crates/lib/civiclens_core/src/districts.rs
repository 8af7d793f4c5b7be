// @zen-component: ZIP-DistrictResolver
//
//! ZIP code → civic district resolution.
//!
//! The model is asked for a fixed JSON shape and its reply is decoded
//! defensively. Results are stamped `inferred: true`: nothing here checks
//! the districts against an authoritative source.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::conversation::MessageSequence;
use crate::gateway::{ChatGateway, ModelRequest, ModelResponse};
use crate::outcome::Outcome;
use crate::sanitizer::extract_text;

/// Output-format instructions sent as the system turn.
pub const DISTRICT_PROMPT: &str = r#"You are a civic data helper.
Return ONLY JSON like this:
{
 "zip": "94539",
 "normalized_city": "Fremont",
 "normalized_county": "Alameda",
 "districts": {
   "us_house": [{"id": "CA-17"}],
   "state_senate": [{"id": "SD-10"}],
   "state_assembly": [{"id": "AD-24"}]
 },
 "needs_address": false
}
If the ZIP isn't in California, say needs_address=true and add a "message".
No explanations, just JSON."#;

static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").ok());

/// Errors raised while validating a ZIP query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZipError {
    #[error("Enter 5 digits")]
    Invalid,
}

/// A syntactically valid US ZIP code: exactly five ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(raw: &str) -> Result<Self, ZipError> {
        if raw.len() == 5 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ZipError::Invalid)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// District lookup as reported by the model, plus `inferred: true`.
///
/// Kept as the raw JSON object so fields the model adds pass through
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictResult(Map<String, Value>);

impl DistrictResult {
    fn inferred(mut fields: Map<String, Value>) -> Self {
        fields.insert("inferred".to_string(), Value::Bool(true));
        Self(fields)
    }

    pub fn zip(&self) -> Option<&str> {
        self.0.get("zip").and_then(Value::as_str)
    }

    /// Whether the model says a street address is needed (e.g. non-CA ZIP).
    pub fn needs_address(&self) -> bool {
        self.0
            .get("needs_address")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Builds the single-turn structured request for `zip`.
pub fn district_request(config: &GatewayConfig, zip: &ZipCode) -> ModelRequest {
    ModelRequest::structured(
        config,
        MessageSequence::single_turn(DISTRICT_PROMPT, format!("ZIP: {zip}")),
    )
}

/// Removes Markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    match CODE_FENCE.as_ref() {
        Some(fence) => fence.replace_all(raw, "").trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Decodes the model's reply.
///
/// Anything that is not a JSON object after fence stripping is a soft
/// failure whose diagnostics are the raw, undecoded text.
pub fn interpret_reply(response: &ModelResponse) -> Outcome<DistrictResult> {
    let raw = extract_text(&response.body).unwrap_or_default();
    match serde_json::from_str::<Value>(&strip_code_fences(raw)) {
        Ok(Value::Object(fields)) => Outcome::Success(DistrictResult::inferred(fields)),
        Ok(_) | Err(_) => {
            warn!(status = response.status, "model reply was not a JSON object");
            Outcome::soft(Value::String(raw.to_string()))
        }
    }
}

/// Resolves `zip` through the gateway. Transport failures become a hard
/// failure carrying the error message.
pub async fn resolve(
    gateway: &dyn ChatGateway,
    config: &GatewayConfig,
    zip: &ZipCode,
) -> Outcome<DistrictResult> {
    info!(zip = %zip, "resolving districts");
    let request = district_request(config, zip);

    match gateway.complete(&request).await {
        Ok(response) => {
            let outcome = interpret_reply(&response);
            if let Outcome::Success(result) = &outcome {
                debug!(zip = %zip, needs_address = result.needs_address(), "districts resolved");
            }
            outcome
        }
        Err(e) => {
            warn!(zip = %zip, "district lookup failed: {e}");
            Outcome::hard(json!({ "error": e.to_string() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::conversation::Role;
    use crate::gateway::GatewayError;

    struct ScriptedGateway {
        reply: Result<ModelResponse, String>,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedGateway {
        fn replying(body: Value) -> Self {
            Self {
                reply: Ok(ModelResponse::new(200, body)),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, GatewayError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(GatewayError::Transport)
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn content(text: &str) -> Value {
        json!({"choices": [{"message": {"content": text}}]})
    }

    #[test]
    fn zip_validation() {
        assert!(ZipCode::parse("94539").is_ok());
        assert!(ZipCode::parse("00501").is_ok());
        assert_eq!(ZipCode::parse("1234"), Err(ZipError::Invalid));
        assert_eq!(ZipCode::parse("abcde"), Err(ZipError::Invalid));
        assert_eq!(ZipCode::parse("945390"), Err(ZipError::Invalid));
        assert_eq!(ZipCode::parse(" 9453"), Err(ZipError::Invalid));
        assert_eq!(ZipCode::parse("９４５３９"), Err(ZipError::Invalid));
        assert_eq!(ZipCode::parse(""), Err(ZipError::Invalid));
    }

    #[test]
    fn request_is_system_plus_zip() {
        let zip = ZipCode::parse("94539").unwrap();
        let req = district_request(&GatewayConfig::default(), &zip);
        let msgs = req.messages.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert!(msgs[0].content.contains("Return ONLY JSON"));
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[1].content, "ZIP: 94539");
        assert!(req.temperature.is_none());
    }

    #[test]
    fn fences_are_stripped() {
        assert!(CODE_FENCE.is_some());
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn object_reply_is_stamped_inferred() {
        let reply = "```json\n{\"zip\":\"94539\",\"districts\":{\"us_house\":[{\"id\":\"CA-17\"}]}}\n```";
        let resp = ModelResponse::new(200, content(reply));
        let Outcome::Success(result) = interpret_reply(&resp) else {
            panic!("expected success");
        };
        assert_eq!(result.zip(), Some("94539"));
        assert!(!result.needs_address());
        assert_eq!(
            result.into_value(),
            json!({
                "zip": "94539",
                "districts": {"us_house": [{"id": "CA-17"}]},
                "inferred": true
            })
        );
    }

    #[test]
    fn model_supplied_inferred_flag_is_overwritten() {
        let resp = ModelResponse::new(200, content("{\"zip\":\"10001\",\"needs_address\":true,\"inferred\":false}"));
        let Outcome::Success(result) = interpret_reply(&resp) else {
            panic!("expected success");
        };
        assert!(result.needs_address());
        assert_eq!(result.as_map()["inferred"], true);
    }

    #[test]
    fn prose_reply_is_a_parse_failure_with_raw_text() {
        let resp = ModelResponse::new(200, content("Sorry, I can't help with that."));
        assert_eq!(
            interpret_reply(&resp),
            Outcome::soft(Value::String("Sorry, I can't help with that.".into()))
        );
    }

    #[test]
    fn non_object_json_is_a_parse_failure() {
        let resp = ModelResponse::new(200, content("[1, 2]"));
        assert!(matches!(interpret_reply(&resp), Outcome::SoftFailure { .. }));
    }

    #[test]
    fn output_text_shape_is_accepted() {
        let resp = ModelResponse::new(200, json!({"output_text": "{\"zip\":\"94539\"}"}));
        assert!(interpret_reply(&resp).is_success());
    }

    #[tokio::test]
    async fn resolve_calls_gateway_once() {
        let gateway = ScriptedGateway::replying(content("{\"zip\":\"94539\"}"));
        let zip = ZipCode::parse("94539").unwrap();
        let outcome = resolve(&gateway, &GatewayConfig::default(), &zip).await;
        assert!(outcome.is_success());
        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages.messages()[1].content, "ZIP: 94539");
    }

    #[tokio::test]
    async fn resolve_maps_transport_failure_to_hard_failure() {
        let gateway = ScriptedGateway::failing("connection refused");
        let zip = ZipCode::parse("94539").unwrap();
        let outcome = resolve(&gateway, &GatewayConfig::default(), &zip).await;
        let Outcome::HardFailure { diagnostics, .. } = outcome else {
            panic!("expected hard failure");
        };
        assert_eq!(diagnostics["error"], "Upstream request failed: connection refused");
    }
}
