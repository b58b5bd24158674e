//! Text-generation model boundary.
//!
//! The pipeline only ever sees a model as text in, text out. `OllamaClient`
//! talks to a local Ollama server; tests substitute scripted generators.

mod ollama;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub use ollama::OllamaClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
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

/// Recognized generation parameters; unset values are left to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl GenerationOptions {
    /// No overrides at all.
    pub fn unset() -> Self {
        Self {
            format: None,
            temperature: None,
            top_p: None,
            top_k: None,
            repeat_penalty: None,
            num_predict: None,
        }
    }
}

impl Default for GenerationOptions {
    /// JSON output, moderate creativity, fairly wide sampling.
    fn default() -> Self {
        Self {
            format: Some("json".to_string()),
            temperature: Some(0.5),
            top_p: Some(0.9),
            top_k: Some(40),
            ..Self::unset()
        }
    }
}

/// A fallible remote text-generation call.
pub trait TextGenerator {
    fn generate(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ModelError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ModelError> {
        (**self).generate(model_id, messages, options)
    }
}
