//! Transcript ingestion.
//!
//! Transcription and word alignment happen upstream; this module reads their
//! JSON output (or a cached copy), checks its shape once, and hands a
//! validated `Transcript` to the rest of the pipeline.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::TranscriptError;
use crate::types::{Segment, Transcript, WordToken};

/// Slack allowed between a segment's bounds and its words, and between
/// neighbouring words.
pub const TIMING_TOLERANCE: f64 = 0.01;

/// Read and validate a transcript JSON file.
pub fn load_transcript(path: &Path) -> Result<Transcript, TranscriptError> {
    let raw = fs::read_to_string(path).map_err(|source| TranscriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let transcript: Transcript = serde_json::from_str(&raw).map_err(|source| TranscriptError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let transcript = ingest(transcript)?;
    info!(
        path = %path.display(),
        segments = transcript.segments.len(),
        words = transcript.word_segments.len(),
        "loaded transcript"
    );
    Ok(transcript)
}

/// Write a transcript in the same JSON layout `load_transcript` reads.
pub fn save_transcript(path: &Path, transcript: &Transcript) -> Result<(), TranscriptError> {
    let io_err = |source: std::io::Error| TranscriptError::Io {
        path: path.to_path_buf(),
        source,
    };
    let encoded = serde_json::to_string(transcript).map_err(|source| TranscriptError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, encoded).map_err(io_err)
}

/// Normalize word text and enforce the timing invariants the aligner relies on.
/// An empty `word_segments` list is rebuilt from the segments' words.
pub fn ingest(mut transcript: Transcript) -> Result<Transcript, TranscriptError> {
    for (idx, segment) in transcript.segments.iter_mut().enumerate() {
        check_interval(segment.start, segment.end)
            .map_err(|reason| TranscriptError::invalid(format!("segment {idx}: {reason}")))?;
        for word in &mut segment.words {
            normalize_word(word)
                .map_err(|reason| TranscriptError::invalid(format!("segment {idx}: {reason}")))?;
        }
        check_segment_words(segment)
            .map_err(|reason| TranscriptError::invalid(format!("segment {idx}: {reason}")))?;
    }
    ensure_ordered(
        transcript.segments.iter().map(|segment| segment.start),
        "segments",
    )?;

    if transcript.word_segments.is_empty() {
        transcript.word_segments = transcript
            .segments
            .iter()
            .flat_map(|segment| segment.words.iter().cloned())
            .collect();
    } else {
        for (idx, word) in transcript.word_segments.iter_mut().enumerate() {
            normalize_word(word)
                .map_err(|reason| TranscriptError::invalid(format!("word_segments[{idx}]: {reason}")))?;
        }
    }
    ensure_ordered(
        transcript.word_segments.iter().map(|word| word.start),
        "word_segments",
    )?;

    Ok(transcript)
}

fn normalize_word(word: &mut WordToken) -> Result<(), String> {
    check_interval(word.start, word.end).map_err(|reason| format!("word '{}' {reason}", word.word))?;
    let trimmed = word.word.trim();
    if trimmed.len() != word.word.len() {
        word.word = trimmed.to_string();
    }
    Ok(())
}

/// Words must run in order without overlapping and span the segment.
fn check_segment_words(segment: &Segment) -> Result<(), String> {
    let (Some(first), Some(last)) = (segment.words.first(), segment.words.last()) else {
        return Ok(());
    };
    for pair in segment.words.windows(2) {
        if pair[1].start + TIMING_TOLERANCE < pair[0].end {
            return Err(format!(
                "word '{}' at {} starts before '{}' ends at {}",
                pair[1].word, pair[1].start, pair[0].word, pair[0].end
            ));
        }
    }
    if (segment.start - first.start).abs() > TIMING_TOLERANCE
        || (segment.end - last.end).abs() > TIMING_TOLERANCE
    {
        return Err(format!(
            "bounds {}-{} do not match its words {}-{}",
            segment.start, segment.end, first.start, last.end
        ));
    }
    Ok(())
}

fn check_interval(start: f64, end: f64) -> Result<(), String> {
    if !start.is_finite() || !end.is_finite() {
        return Err(format!("has non-finite timing {start}-{end}"));
    }
    if start > end {
        return Err(format!("starts after it ends ({start} > {end})"));
    }
    Ok(())
}

fn ensure_ordered(starts: impl Iterator<Item = f64>, label: &str) -> Result<(), TranscriptError> {
    let mut previous = f64::NEG_INFINITY;
    for (idx, start) in starts.enumerate() {
        if start < previous {
            return Err(TranscriptError::invalid(format!(
                "{label} out of order at index {idx} ({start} < {previous})"
            )));
        }
        previous = start;
    }
    Ok(())
}
