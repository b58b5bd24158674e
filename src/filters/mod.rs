//! Post-processing filters over aligned spans.
//!
//! Stages only ever shrink the candidate set. The cheap local checks run
//! first so the model-backed relevance filter sees as few spans as possible.

mod relevance;

use tracing::info;

use crate::types::MappedSpan;

pub use relevance::{is_affirmative, RelevanceFilter};

/// Bounds for the duration/structure filter; both duration ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationFilter {
    pub min_length_sec: f64,
    pub max_length_sec: f64,
    pub min_words: usize,
}

impl Default for DurationFilter {
    fn default() -> Self {
        Self {
            min_length_sec: 5.0,
            max_length_sec: 60.0,
            min_words: 8,
        }
    }
}

impl DurationFilter {
    pub fn accepts(&self, span: &MappedSpan) -> bool {
        let duration = span.duration();
        duration >= self.min_length_sec
            && duration <= self.max_length_sec
            && span.words.len() >= self.min_words
    }

    pub fn apply(&self, spans: Vec<MappedSpan>) -> Vec<MappedSpan> {
        let total = spans.len();
        let kept: Vec<MappedSpan> = spans.into_iter().filter(|span| self.accepts(span)).collect();
        info!(
            min_length_sec = self.min_length_sec,
            max_length_sec = self.max_length_sec,
            "duration filter kept {}/{}",
            kept.len(),
            total
        );
        kept
    }
}

/// Drop spans that mostly repeat an earlier one, as happens when the same
/// highlight is found in two overlapping chunks.
///
/// Spans are ordered by start time (stably, so earlier chunks win ties). A
/// span is dropped when its overlap with an already kept span covers at least
/// `min_overlap_ratio` of the shorter of the two.
pub fn dedup_overlapping(mut spans: Vec<MappedSpan>, min_overlap_ratio: f64) -> Vec<MappedSpan> {
    let total = spans.len();
    spans.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut kept: Vec<MappedSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        let duplicate = kept
            .iter()
            .any(|existing| overlap_ratio(existing, &span) >= min_overlap_ratio);
        if !duplicate {
            kept.push(span);
        }
    }
    info!("dedup kept {}/{}", kept.len(), total);
    kept
}

fn overlap_ratio(a: &MappedSpan, b: &MappedSpan) -> f64 {
    let overlap = a.end.min(b.end) - a.start.max(b.start);
    if overlap < 0.0 {
        return 0.0;
    }
    let shorter = a.duration().min(b.duration());
    if shorter <= 0.0 {
        1.0
    } else {
        overlap / shorter
    }
}
