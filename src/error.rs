use std::path::PathBuf;

use thiserror::Error;

/// Longest slice of offending model output kept for diagnostics.
pub const SAMPLE_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error on transcript {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in transcript {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid transcript: {message}")]
    Invalid { message: String },
}

impl TranscriptError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request timed out: {0}")]
    Timeout(String),
    #[error("model request failed: {0}")]
    Http(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response was malformed: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("model output is not valid JSON: '{sample}...'")]
    Malformed { sample: String },
    #[error("model output is not a JSON list: '{sample}...'")]
    NotAList { sample: String },
}

impl ParseError {
    pub(crate) fn malformed(raw: &str) -> Self {
        Self::Malformed {
            sample: sample_of(raw),
        }
    }

    pub(crate) fn not_a_list(raw: &str) -> Self {
        Self::NotAList {
            sample: sample_of(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("excerpt has {words} words, at least {required} are needed")]
    TooShort { words: usize, required: usize },
    #[error("boundary snippets not found in order: '{start_snippet}' ... '{end_snippet}'")]
    NoMatch {
        start_snippet: String,
        end_snippet: String,
    },
}

/// Failure of one chunk's highlight request.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum TrimError {
    #[error("failed to spawn trim command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("trim command exited with {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode run metadata: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flatten newlines and collapse double spaces, then cut to `SAMPLE_CHARS`.
fn sample_of(raw: &str) -> String {
    raw.replace('\n', "")
        .replace("  ", "")
        .chars()
        .take(SAMPLE_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_flattened_and_truncated() {
        let raw = format!("line one\n  line two {}", "x".repeat(300));
        let ParseError::Malformed { sample } = ParseError::malformed(&raw) else {
            panic!("expected malformed");
        };
        assert!(sample.starts_with("line oneline two"));
        assert_eq!(sample.chars().count(), SAMPLE_CHARS);
    }
}
