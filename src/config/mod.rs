use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::alignment::DEFAULT_SEARCH_WINDOW;
use crate::filters::DurationFilter;
use crate::model::GenerationOptions;
use crate::retry::RetryPolicy;
use crate::types::ChunkConfig;

/// Runtime-configurable pipeline settings, parsed from JSON. Every field has a
/// default so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(alias = "model_name")]
    pub model: String,
    /// Model for the yes/no relevance check; falls back to `model`.
    pub relevance_model: Option<String>,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub window_minutes: f64,
    pub overlap_seconds: f64,
    pub search_window: usize,
    pub min_length_sec: f64,
    pub max_length_sec: f64,
    pub min_words: usize,
    pub dedup_overlap_ratio: f64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub retry_on_parse_error: bool,
    pub use_cache: bool,
    pub relevance_filter: bool,
    #[serde(alias = "options")]
    pub generation: GenerationOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "yi:9b-chat-v1.5-q6_K".to_string(),
            relevance_model: None,
            endpoint: "http://localhost:11434".to_string(),
            request_timeout_secs: 300,
            window_minutes: 5.0,
            overlap_seconds: 60.0,
            search_window: DEFAULT_SEARCH_WINDOW,
            min_length_sec: 5.0,
            max_length_sec: 60.0,
            min_words: 8,
            dedup_overlap_ratio: 0.5,
            max_attempts: 3,
            retry_backoff_ms: 500,
            retry_on_parse_error: false,
            use_cache: true,
            relevance_filter: false,
            generation: GenerationOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::parse(&data)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("Failed to parse config JSON")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.model.trim().is_empty(), "model must not be empty");
        ensure!(
            self.window_minutes > 0.0,
            "window_minutes must be positive, got {}",
            self.window_minutes
        );
        ensure!(
            self.overlap_seconds >= 0.0 && self.overlap_seconds < self.window_minutes * 60.0,
            "overlap_seconds must be in [0, window) (got {} for a {}s window)",
            self.overlap_seconds,
            self.window_minutes * 60.0
        );
        ensure!(self.search_window >= 1, "search_window must be at least 1");
        ensure!(
            self.min_length_sec >= 0.0 && self.min_length_sec <= self.max_length_sec,
            "min_length_sec ({}) must be between 0 and max_length_sec ({})",
            self.min_length_sec,
            self.max_length_sec
        );
        ensure!(self.max_attempts >= 1, "max_attempts must be at least 1");
        ensure!(
            self.dedup_overlap_ratio > 0.0 && self.dedup_overlap_ratio <= 1.0,
            "dedup_overlap_ratio must be in (0, 1], got {}",
            self.dedup_overlap_ratio
        );
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be positive");
        Ok(())
    }

    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig::new(self.window_minutes, self.overlap_seconds)
    }

    pub fn duration_filter(&self) -> DurationFilter {
        DurationFilter {
            min_length_sec: self.min_length_sec,
            max_length_sec: self.max_length_sec,
            min_words: self.min_words,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn relevance_model(&self) -> &str {
        self.relevance_model.as_deref().unwrap_or(&self.model)
    }
}
