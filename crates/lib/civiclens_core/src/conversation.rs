// @zen-component: CHAT-ConversationNormalizer
//
//! Conversation normalization.
//!
//! Turns a client prompt plus whatever history the client sent into the
//! message list the upstream API accepts: one system turn, then strictly
//! alternating user/assistant turns, ending with the prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Instruction preamble sent as the system turn of every chat request.
pub const SYSTEM_PREAMBLE: &str = "You are a concise civic assistant for California voters. \
If user context includes 'Context: User districts — ...' or a proposition line, incorporate it. \
Keep answers short (<=6 sentences or 3–6 plain hyphen bullets). \
No bold markdown, no [1] style citations.";

/// Role of a message in the upstream wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message as sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The party that produced a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Parses a client-supplied role. Case and surrounding whitespace are
    /// ignored; anything other than `user` or `assistant` is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Speaker::User),
            "assistant" => Some(Speaker::Assistant),
            _ => None,
        }
    }

    pub fn role(self) -> Role {
        match self {
            Speaker::User => Role::User,
            Speaker::Assistant => Role::Assistant,
        }
    }
}

/// A cleaned history entry. `content` is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub content: String,
}

impl ConversationTurn {
    /// Coerces one loosely-shaped history entry.
    ///
    /// Returns `None` for entries without a recognised role or with empty
    /// content. Strings are used as-is, numbers and booleans by their text;
    /// null, objects and arrays carry no usable content.
    pub fn coerce(entry: &Value) -> Option<Self> {
        let speaker = entry.get("role").and_then(Value::as_str).and_then(Speaker::parse)?;
        let content = match entry.get("content")? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        if content.is_empty() {
            return None;
        }
        Some(Self { speaker, content })
    }

    fn into_message(self) -> Message {
        Message {
            role: self.speaker.role(),
            content: self.content,
        }
    }
}

/// Ordered messages ready for the gateway: a single leading system turn,
/// then alternating turns ending in a user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageSequence(Vec<Message>);

impl MessageSequence {
    /// A system turn followed by one user turn.
    pub fn single_turn(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self(vec![Message::system(system), Message::user(user)])
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Errors raised while building a conversation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Missing prompt")]
    EmptyPrompt,
}

/// Builds the system turn text, appending caller context when present.
pub fn system_prompt(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(ctx) => format!("{SYSTEM_PREAMBLE}\n\nContext:\n{ctx}"),
        None => SYSTEM_PREAMBLE.to_string(),
    }
}

/// Coerces the last `window` entries of a raw history value, dropping
/// unusable ones. A value that is not an array yields no turns.
///
/// The window is counted over raw entries, so entries dropped here do not
/// make room for older ones.
pub fn coerce_history(history: &Value, window: usize) -> Vec<ConversationTurn> {
    let entries = history.as_array().map(Vec::as_slice).unwrap_or_default();
    entries[entries.len().saturating_sub(window)..]
        .iter()
        .filter_map(ConversationTurn::coerce)
        .collect()
}

/// Builds the upstream message list for a chat request.
///
/// History is reduced with [`coerce_history`]. A turn whose speaker matches
/// the previously accepted turn is skipped. The prompt is
/// always the final user turn; a trailing user turn from history gives way
/// to it.
pub fn normalize(
    prompt: &str,
    history: &Value,
    context: Option<&str>,
    window: usize,
) -> Result<MessageSequence, NormalizeError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(NormalizeError::EmptyPrompt);
    }

    let turns = coerce_history(history, window);

    let mut accepted: Vec<ConversationTurn> = Vec::with_capacity(turns.len() + 1);
    for turn in turns {
        if accepted.last().is_some_and(|prev| prev.speaker == turn.speaker) {
            continue;
        }
        accepted.push(turn);
    }

    if accepted.last().is_some_and(|prev| prev.speaker == Speaker::User) {
        accepted.pop();
    }
    accepted.push(ConversationTurn {
        speaker: Speaker::User,
        content: prompt.to_string(),
    });

    let mut messages = Vec::with_capacity(accepted.len() + 1);
    messages.push(Message::system(system_prompt(context)));
    messages.extend(accepted.into_iter().map(ConversationTurn::into_message));
    Ok(MessageSequence(messages))
}
