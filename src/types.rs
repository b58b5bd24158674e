//! Core types for the podclip highlight pipeline

use serde::{Deserialize, Serialize};

/// A single aligned word from the transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub word: String,
    pub start: f64, // seconds
    pub end: f64,   // seconds
    #[serde(default)]
    pub score: f64,
}

/// A sentence or phrase level aggregate of word tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordToken>,
}

/// Transcription output for one recording
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub word_segments: Vec<WordToken>,
}

/// A time-bounded window of transcript segments sized for a model context
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Index of the first segment within the source transcript
    pub first_index: usize,
    pub segments: &'a [Segment],
}

impl<'a> Chunk<'a> {
    pub fn new(first_index: usize, segments: &'a [Segment]) -> Self {
        Self {
            first_index,
            segments,
        }
    }

    /// Source segment indices covered by this chunk
    pub fn segment_ids(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.segments.len()
    }

    /// Plain text of the chunk, timestamps omitted
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Word tokens of every segment, flattened in order
    pub fn tokens(&self) -> Vec<WordToken> {
        self.segments
            .iter()
            .flat_map(|segment| segment.words.iter().cloned())
            .collect()
    }

    pub fn start(&self) -> f64 {
        self.segments.first().map_or(0.0, |segment| segment.start)
    }

    pub fn end(&self) -> f64 {
        self.segments.last().map_or(0.0, |segment| segment.end)
    }
}

/// Untimed highlight text proposed by the model
pub type Excerpt = String;

/// A contiguous run of word tokens recovered for an excerpt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedSpan {
    pub words: Vec<WordToken>,
    pub start: f64,
    pub end: f64,
}

impl MappedSpan {
    /// Build a span from a non-empty token run; timing comes from the tokens only.
    pub fn from_tokens(words: Vec<WordToken>) -> Option<Self> {
        let start = words.first()?.start;
        let end = words.last()?.end;
        Some(Self { words, start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|word| word.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An accepted span that was trimmed into its own media file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub words: Vec<WordToken>,
    pub output_path: std::path::PathBuf,
}

/// Configuration for the time-window chunker
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub window_seconds: f64,
    pub overlap_seconds: f64,
}

impl ChunkConfig {
    pub fn new(window_minutes: f64, overlap_seconds: f64) -> Self {
        Self {
            window_seconds: window_minutes * 60.0,
            overlap_seconds,
        }
    }
}
