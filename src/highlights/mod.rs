//! Highlight requests: prompt the model with a chunk's text and parse the
//! excerpts it proposes.
//!
//! Timestamps are left out of the prompt. The model reasons over
//! content only; timing is recovered later by aligning excerpts to the
//! transcript.

pub mod parser;

use tracing::{debug, info, warn};

use crate::cache::fingerprint;
use crate::context::RunContext;
use crate::error::{HighlightError, ModelError};
use crate::model::{ChatMessage, GenerationOptions, TextGenerator};
use crate::retry::{retry, RetryOutcome, RetryPolicy};
use crate::types::{Chunk, Excerpt};

pub use parser::parse_excerpts;

pub const SYSTEM_PROMPT: &str = "You are a podcast highlight extractor.";

/// Model settings for one highlight request.
#[derive(Debug, Clone, Copy)]
pub struct HighlightRequest<'a> {
    pub model_id: &'a str,
    pub options: &'a GenerationOptions,
    pub use_cache: bool,
}

pub struct HighlightRequester<'a, G> {
    generator: &'a G,
    ctx: &'a RunContext,
    policy: RetryPolicy,
    retry_on_parse_error: bool,
}

impl<'a, G: TextGenerator> HighlightRequester<'a, G> {
    pub fn new(generator: &'a G, ctx: &'a RunContext, policy: RetryPolicy) -> Self {
        Self {
            generator,
            ctx,
            policy,
            retry_on_parse_error: false,
        }
    }

    /// Also retry, with the cache bypassed, when a response fails to parse.
    pub fn with_parse_retries(mut self, enabled: bool) -> Self {
        self.retry_on_parse_error = enabled;
        self
    }

    /// One model call for `chunk`, served from the cache when allowed.
    /// Fresh responses are always written back to the cache.
    pub fn request(&self, chunk: &Chunk<'_>, request: &HighlightRequest<'_>) -> Result<String, ModelError> {
        let text = chunk.text();
        let key = fingerprint(request.model_id, &text);

        if request.use_cache {
            if let Some(hit) = self.ctx.cached_response(&key) {
                info!(key = %key, "using cached model output");
                return Ok(hit);
            }
        }

        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(build_prompt(&text))];
        let timer = self.ctx.timer("highlight request");
        let response = self
            .generator
            .generate(request.model_id, &messages, request.options)?;
        debug!(chars = response.len(), elapsed = %timer.finish(), "model responded");

        self.ctx.store_response(&key, &response);
        Ok(response)
    }

    /// Request and parse excerpts for `chunk` under the retry policy. Attempts
    /// after the first bypass cache reads so a bad cached response is not
    /// replayed.
    pub fn excerpts(
        &self,
        chunk: &Chunk<'_>,
        request: &HighlightRequest<'_>,
    ) -> RetryOutcome<Vec<Excerpt>, HighlightError> {
        let retry_on_parse_error = self.retry_on_parse_error;
        retry(
            self.policy,
            |err: &HighlightError| match err {
                HighlightError::Model(_) => true,
                HighlightError::Parse(_) => retry_on_parse_error,
            },
            |attempt| -> Result<Vec<Excerpt>, HighlightError> {
                let attempt_request = HighlightRequest {
                    use_cache: request.use_cache && attempt == 1,
                    ..*request
                };
                let raw = self.request(chunk, &attempt_request)?;
                let excerpts = parse_excerpts(&raw).inspect_err(|err| {
                    warn!("failed to parse model output: {err}");
                })?;
                Ok(excerpts)
            },
        )
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"You are an expert podcast highlight selector.

You will be given a continuous block of podcast transcript text (no timestamps).
Identify 0 to 4 emotionally or intellectually impactful highlights that:
- Are between 10 and 25 seconds long
- Make sense when viewed alone (self-contained, with enough setup and payoff)
- Contain meaningful insight, humor, tension, or emotional impact

Quote each highlight exactly as it appears in the transcript.
Return ONLY the highlighted text excerpts, as a JSON array of strings.
If no highlights are found, return [].

Transcript:
"""{text}"""
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::types::Segment;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::time::Duration;
    use tempfile::tempdir;

    struct Scripted {
        responses: RefCell<VecDeque<Result<String, ModelError>>>,
        calls: Cell<usize>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<&str, &str>>) -> Self {
            Self {
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(|e| ModelError::Http(e.to_string())))
                        .collect(),
                ),
                calls: Cell::new(0),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        fn generate(
            &self,
            _model_id: &str,
            messages: &[ChatMessage],
            _options: &GenerationOptions,
        ) -> Result<String, ModelError> {
            self.calls.set(self.calls.get() + 1);
            self.prompts
                .borrow_mut()
                .push(messages.last().map(|m| m.content.clone()).unwrap_or_default());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok("[]".to_string()))
        }
    }

    fn segments() -> Vec<Segment> {
        vec![Segment {
            start: 12.5,
            end: 14.0,
            text: " we shipped it on a friday ".to_string(),
            words: Vec::new(),
        }]
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn prompt_contains_text_without_timestamps() {
        let segments = segments();
        let generator = Scripted::new(vec![Ok("[]")]);
        let ctx = RunContext::default();
        let options = GenerationOptions::default();
        let request = HighlightRequest {
            model_id: "m",
            options: &options,
            use_cache: false,
        };
        HighlightRequester::new(&generator, &ctx, policy(1))
            .request(&Chunk::new(0, &segments), &request)
            .unwrap();
        let prompts = generator.prompts.borrow();
        assert!(prompts[0].contains("\"\"\"we shipped it on a friday\"\"\""));
        assert!(!prompts[0].contains("12.5"));
    }

    #[test]
    fn cached_request_calls_model_once() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(Some(ResponseCache::open(dir.path()).unwrap()));
        let segments = segments();
        let chunk = Chunk::new(0, &segments);
        let generator = Scripted::new(vec![Ok(r#"["a"]"#), Ok(r#"["b"]"#)]);
        let options = GenerationOptions::default();
        let request = HighlightRequest {
            model_id: "m",
            options: &options,
            use_cache: true,
        };
        let requester = HighlightRequester::new(&generator, &ctx, policy(1));

        assert_eq!(requester.request(&chunk, &request).unwrap(), r#"["a"]"#);
        assert_eq!(requester.request(&chunk, &request).unwrap(), r#"["a"]"#);
        assert_eq!(generator.calls.get(), 1);
    }

    #[test]
    fn model_failures_are_retried() {
        let segments = segments();
        let generator = Scripted::new(vec![Err("connection refused"), Ok(r#"[" first "]"#)]);
        let ctx = RunContext::default();
        let options = GenerationOptions::default();
        let request = HighlightRequest {
            model_id: "m",
            options: &options,
            use_cache: false,
        };
        let outcome = HighlightRequester::new(&generator, &ctx, policy(3))
            .excerpts(&Chunk::new(0, &segments), &request);
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(outcome.into_result().unwrap(), vec!["first"]);
    }

    #[test]
    fn parse_errors_are_not_retried_by_default() {
        let segments = segments();
        let generator = Scripted::new(vec![Ok("no json here"), Ok(r#"["late"]"#)]);
        let ctx = RunContext::default();
        let options = GenerationOptions::default();
        let request = HighlightRequest {
            model_id: "m",
            options: &options,
            use_cache: false,
        };
        let outcome = HighlightRequester::new(&generator, &ctx, policy(3))
            .excerpts(&Chunk::new(0, &segments), &request);
        assert!(matches!(
            outcome,
            RetryOutcome::Aborted {
                error: HighlightError::Parse(_),
                attempts: 1
            }
        ));
        assert_eq!(generator.calls.get(), 1);
    }

    #[test]
    fn parse_retry_bypasses_bad_cached_response() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(Some(ResponseCache::open(dir.path()).unwrap()));
        let segments = segments();
        let chunk = Chunk::new(0, &segments);
        let key = fingerprint("m", &chunk.text());
        ctx.store_response(&key, "garbage");

        let generator = Scripted::new(vec![Ok(r#"["fresh"]"#)]);
        let options = GenerationOptions::default();
        let request = HighlightRequest {
            model_id: "m",
            options: &options,
            use_cache: true,
        };
        let outcome = HighlightRequester::new(&generator, &ctx, policy(2))
            .with_parse_retries(true)
            .excerpts(&chunk, &request);

        assert_eq!(outcome.into_result().unwrap(), vec!["fresh"]);
        assert_eq!(generator.calls.get(), 1);
        assert_eq!(ctx.cached_response(&key).as_deref(), Some(r#"["fresh"]"#));
    }
}
