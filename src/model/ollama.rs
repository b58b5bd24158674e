use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatMessage, GenerationOptions, TextGenerator};
use crate::error::ModelError;

/// Blocking client for an Ollama server's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    chat_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: SamplingOptions,
}

/// Everything except `format`, which Ollama takes at the top level.
#[derive(Serialize)]
struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

impl From<&GenerationOptions> for SamplingOptions {
    fn from(options: &GenerationOptions) -> Self {
        Self {
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            repeat_penalty: options.repeat_penalty,
            num_predict: options.num_predict,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ModelError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .map_err(|err| ModelError::Http(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            chat_url: format!("{}/api/chat", endpoint.trim_end_matches('/')),
        })
    }

    fn request_body<'a>(
        model_id: &'a str,
        messages: &'a [ChatMessage],
        options: &'a GenerationOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: model_id,
            messages,
            stream: false,
            format: options.format.as_deref(),
            options: SamplingOptions::from(options),
        }
    }
}

impl TextGenerator for OllamaClient {
    fn generate(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ModelError> {
        let body = Self::request_body(model_id, messages, options);
        debug!(model = model_id, url = %self.chat_url, "sending chat request");

        let response = self
            .client
            .post(&self.chat_url)
            .json(&body)
            .send()
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|err| ModelError::MalformedResponse(err.to_string()))?;
        Ok(parsed.message.content.trim().to_string())
    }
}

fn classify(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout(err.to_string())
    } else {
        ModelError::Http(err.to_string())
    }
}
