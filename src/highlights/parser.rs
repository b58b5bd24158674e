//! Turns raw model output into excerpt strings.
//!
//! Models often wrap the JSON array in prose or markdown fences, so a failed
//! strict parse falls back to the text between the first `[` and the last `]`.
//! Nothing is ever salvaged from non-JSON text.

use serde_json::Value;

use crate::error::ParseError;
use crate::types::Excerpt;

/// Parse a model response into trimmed, non-empty excerpt strings.
pub fn parse_excerpts(raw: &str) -> Result<Vec<Excerpt>, ParseError> {
    let value = match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => value,
        Err(_) => recover_bracketed(raw)?,
    };

    let Value::Array(items) = value else {
        return Err(ParseError::not_a_list(raw));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            _ => None,
        })
        .collect())
}

fn recover_bracketed(raw: &str) -> Result<Value, ParseError> {
    let flattened = raw.replace(['\n', '\r'], "");
    match (flattened.find('['), flattened.rfind(']')) {
        (Some(open), Some(close)) if close > open => {
            serde_json::from_str(&flattened[open..=close]).map_err(|_| ParseError::malformed(raw))
        }
        _ => Err(ParseError::malformed(raw)),
    }
}
