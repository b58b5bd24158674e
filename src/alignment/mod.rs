//! Maps model excerpts back onto transcript word tokens.
//!
//! Models paraphrase punctuation and spacing, so whole-excerpt substring search
//! is unreliable. Instead the first and last `search_window` words of the
//! excerpt are matched, lowercased, against sliding windows of the transcript
//! tokens. The earliest start window wins, then the earliest end window after
//! it. Matching is exact: one differing word in a boundary snippet loses the
//! excerpt.

use std::ops::Range;

use crate::error::AlignError;
use crate::types::{MappedSpan, WordToken};

pub const DEFAULT_SEARCH_WINDOW: usize = 8;

/// Token range `[start, end)` matched by `excerpt`.
pub fn locate(excerpt: &str, tokens: &[WordToken], search_window: usize) -> Result<Range<usize>, AlignError> {
    let window = search_window.max(1);
    let words: Vec<&str> = excerpt.split_whitespace().collect();
    if words.len() < window {
        return Err(AlignError::TooShort {
            words: words.len(),
            required: window,
        });
    }

    let start_snippet = words[..window].join(" ").to_lowercase();
    let end_snippet = words[words.len() - window..].join(" ").to_lowercase();

    let lowered: Vec<String> = tokens
        .iter()
        .map(|token| token.word.trim().to_lowercase())
        .collect();
    let mut windows = lowered.windows(window).map(|slice| slice.join(" "));

    let start_idx = windows.position(|joined| joined == start_snippet);
    // `position` resumes right after the start match
    let end_idx = start_idx.and_then(|start| {
        windows
            .position(|joined| joined == end_snippet)
            .map(|offset| start + 1 + offset)
    });

    match (start_idx, end_idx) {
        (Some(start), Some(end)) if end > start => Ok(start..end + window),
        _ => Err(AlignError::NoMatch {
            start_snippet,
            end_snippet,
        }),
    }
}

/// Align `excerpt` to `tokens`; timing comes from the matched tokens only.
pub fn align(excerpt: &str, tokens: &[WordToken], search_window: usize) -> Result<MappedSpan, AlignError> {
    let range = locate(excerpt, tokens, search_window)?;
    let words = tokens[range].to_vec();
    // non-empty: the range always spans at least one window
    MappedSpan::from_tokens(words).ok_or(AlignError::NoMatch {
        start_snippet: String::new(),
        end_snippet: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str, spacing: f64) -> Vec<WordToken> {
        text.split_whitespace()
            .enumerate()
            .map(|(i, word)| WordToken {
                word: word.to_string(),
                start: i as f64 * spacing,
                end: (i + 1) as f64 * spacing,
                score: 0.9,
            })
            .collect()
    }

    const TRANSCRIPT: &str = "so I was telling him that the market never waits for anybody and \
        you have to move when the window opens because nobody hands you a second chance in \
        this business and that is the whole lesson really";

    #[test]
    fn recovers_known_fragment() {
        let tokens = tokens(TRANSCRIPT, 0.5);
        for (i, j) in [(0, 12), (3, 20), (10, 37), (5, 14)] {
            let excerpt = tokens[i..j]
                .iter()
                .map(|t| t.word.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let range = locate(&excerpt, &tokens, DEFAULT_SEARCH_WINDOW).unwrap();
            assert_eq!(range, i..j);
            let span = align(&excerpt, &tokens, DEFAULT_SEARCH_WINDOW).unwrap();
            assert_eq!(span.start, tokens[i].start);
            assert_eq!(span.end, tokens[j - 1].end);
            assert_eq!(span.words.len(), j - i);
        }
    }

    #[test]
    fn matching_ignores_case_and_extra_spacing() {
        let tokens = tokens(TRANSCRIPT, 1.0);
        let excerpt = "  The Market never waits for  anybody and you\nhave to move when the window opens ";
        let range = locate(excerpt, &tokens, DEFAULT_SEARCH_WINDOW).unwrap();
        assert_eq!(range, 6..21);
    }

    #[test]
    fn short_excerpt_is_rejected() {
        let tokens = tokens(TRANSCRIPT, 1.0);
        let err = locate("the market never waits", &tokens, DEFAULT_SEARCH_WINDOW).unwrap_err();
        assert_eq!(
            err,
            AlignError::TooShort {
                words: 4,
                required: 8
            }
        );
    }

    #[test]
    fn paraphrased_boundary_fails() {
        let tokens = tokens(TRANSCRIPT, 1.0);
        let excerpt = "the market never waits for anybody, and you have to move when the window opens";
        assert!(matches!(
            locate(excerpt, &tokens, DEFAULT_SEARCH_WINDOW),
            Err(AlignError::NoMatch { .. })
        ));
    }

    #[test]
    fn unknown_words_fail_without_guessing() {
        let tokens = tokens(TRANSCRIPT, 1.0);
        let excerpt = "completely different words that never occurred anywhere in this podcast at all";
        assert!(matches!(
            align(excerpt, &tokens, DEFAULT_SEARCH_WINDOW),
            Err(AlignError::NoMatch { .. })
        ));
    }

    #[test]
    fn end_snippet_must_follow_start() {
        let tokens = tokens(TRANSCRIPT, 1.0);
        // ending words appear only before the starting words
        let excerpt = "you have to move when the window opens so I was telling him that the market never";
        assert!(locate(excerpt, &tokens, DEFAULT_SEARCH_WINDOW).is_err());
    }

    #[test]
    fn excerpt_of_exactly_one_window_needs_a_later_repeat() {
        let tokens = tokens(TRANSCRIPT, 1.0);
        let excerpt = "the market never waits for anybody and you";
        assert!(locate(excerpt, &tokens, DEFAULT_SEARCH_WINDOW).is_err());
    }

    #[test]
    fn repeated_phrase_uses_first_occurrence() {
        let text = "one two three four five six seven eight nine ten \
                    one two three four five six seven eight nine ten";
        let tokens = tokens(text, 1.0);
        let range = locate(
            "one two three four five six seven eight nine ten",
            &tokens,
            DEFAULT_SEARCH_WINDOW,
        )
        .unwrap();
        assert_eq!(range, 0..10);
    }

    #[test]
    fn smaller_window_allows_short_excerpts() {
        let tokens = tokens(TRANSCRIPT, 1.0);
        let range = locate("the market never waits", &tokens, 2).unwrap();
        assert_eq!(range, 6..10);
    }
}
