//! Three-way result for operations whose callers always need something to
//! display.

use serde_json::Value;

/// Fixed answer shown whenever the model produced nothing usable.
pub const PLACEHOLDER_ANSWER: &str = "No response.";

/// Result of a model round trip.
///
/// `SoftFailure` means the transport worked but the payload was unusable;
/// `HardFailure` means the call itself failed. Both carry a displayable
/// placeholder plus diagnostics for the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    SoftFailure { placeholder: String, diagnostics: Value },
    HardFailure { placeholder: String, diagnostics: Value },
}

impl<T> Outcome<T> {
    /// Soft failure with the standard placeholder answer.
    pub fn soft(diagnostics: Value) -> Self {
        Outcome::SoftFailure {
            placeholder: PLACEHOLDER_ANSWER.to_string(),
            diagnostics,
        }
    }

    /// Hard failure with the standard placeholder answer.
    pub fn hard(diagnostics: Value) -> Self {
        Outcome::HardFailure {
            placeholder: PLACEHOLDER_ANSWER.to_string(),
            diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl Outcome<String> {
    /// The string a UI should render, whichever variant this is.
    pub fn display_text(&self) -> &str {
        match self {
            Outcome::Success(text) => text,
            Outcome::SoftFailure { placeholder, .. } | Outcome::HardFailure { placeholder, .. } => {
                placeholder
            }
        }
    }
}
