//! End-to-end highlight extraction for one recording.
//!
//! Chunk the transcript, ask the model for excerpts per chunk, align them
//! back to word timings, filter, then cut clips. Failures inside a chunk or
//! a single excerpt are logged and skipped; only output I/O aborts a run.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alignment::align;
use crate::chunking::chunk_by_time;
use crate::clips::{ClipAssembler, Trimmer};
use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::error::{AlignError, OutputError};
use crate::filters::{dedup_overlapping, RelevanceFilter};
use crate::highlights::{HighlightRequest, HighlightRequester};
use crate::model::TextGenerator;
use crate::retry::RetryOutcome;
use crate::types::{Chunk, Clip, MappedSpan, Transcript};

/// Candidate counts after each stage of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub chunks: usize,
    pub failed_chunks: usize,
    pub excerpts: usize,
    pub mapped: usize,
    pub after_duration: usize,
    pub after_dedup: usize,
    pub after_relevance: usize,
    pub clips_written: usize,
    pub trim_failures: usize,
    #[serde(skip)]
    pub clips: Vec<Clip>,
}

pub struct Pipeline<'a, G, T> {
    config: &'a PipelineConfig,
    generator: &'a G,
    trimmer: &'a T,
    ctx: &'a RunContext,
}

impl<'a, G: TextGenerator, T: Trimmer> Pipeline<'a, G, T> {
    pub fn new(config: &'a PipelineConfig, generator: &'a G, trimmer: &'a T, ctx: &'a RunContext) -> Self {
        Self {
            config,
            generator,
            trimmer,
            ctx,
        }
    }

    pub fn run(
        &self,
        transcript: &Transcript,
        source_media: &Path,
        output_dir: &Path,
        name_prefix: &str,
    ) -> Result<RunReport, OutputError> {
        let timer = self.ctx.timer("pipeline");
        let mut report = RunReport::default();

        let spans = self.candidate_spans(transcript, &mut report);

        let spans = self.config.duration_filter().apply(spans);
        report.after_duration = spans.len();

        let spans = dedup_overlapping(spans, self.config.dedup_overlap_ratio);
        report.after_dedup = spans.len();

        let spans = if self.config.relevance_filter {
            RelevanceFilter::new(
                self.generator,
                self.config.relevance_model(),
                self.config.retry_policy(),
            )
            .apply(spans)
        } else {
            spans
        };
        report.after_relevance = spans.len();

        let assembly = ClipAssembler::new(self.trimmer, output_dir, name_prefix).assemble(&spans, source_media)?;
        report.clips_written = assembly.clips.len();
        report.trim_failures = assembly.trim_failures;
        report.clips = assembly.clips;

        info!(
            chunks = report.chunks,
            excerpts = report.excerpts,
            clips = report.clips_written,
            elapsed = %timer.finish(),
            "run finished"
        );
        Ok(report)
    }

    /// Aligned spans for every excerpt the model proposed, in chunk order.
    pub fn candidate_spans(&self, transcript: &Transcript, report: &mut RunReport) -> Vec<MappedSpan> {
        let chunks = chunk_by_time(&transcript.segments, self.config.chunk_config());
        report.chunks = chunks.len();
        info!("split transcript into {} chunks", chunks.len());

        let requester = HighlightRequester::new(self.generator, self.ctx, self.config.retry_policy())
            .with_parse_retries(self.config.retry_on_parse_error);
        let request = HighlightRequest {
            model_id: &self.config.model,
            options: &self.config.generation,
            use_cache: self.config.use_cache,
        };

        let mut spans = Vec::new();
        for (position, chunk) in chunks.iter().enumerate() {
            debug!(
                chunk = position,
                segments = ?chunk.segment_ids(),
                start = chunk.start(),
                end = chunk.end(),
                "requesting highlights"
            );
            let excerpts = match requester.excerpts(chunk, &request) {
                RetryOutcome::Success { value, .. } => value,
                RetryOutcome::Exhausted { error, attempts } | RetryOutcome::Aborted { error, attempts } => {
                    warn!(
                        chunk = position,
                        start = chunk.start(),
                        end = chunk.end(),
                        attempts,
                        "no highlights for chunk: {error}"
                    );
                    report.failed_chunks += 1;
                    continue;
                }
            };
            report.excerpts += excerpts.len();
            spans.extend(self.align_chunk(chunk, position, &excerpts));
        }
        report.mapped = spans.len();
        info!("mapped {}/{} excerpts", report.mapped, report.excerpts);
        spans
    }

    fn align_chunk(&self, chunk: &Chunk<'_>, position: usize, excerpts: &[String]) -> Vec<MappedSpan> {
        let tokens = chunk.tokens();
        excerpts
            .iter()
            .filter_map(|excerpt| match align(excerpt, &tokens, self.config.search_window) {
                Ok(span) => Some(span),
                Err(err @ AlignError::TooShort { .. }) => {
                    warn!(chunk = position, "skipping excerpt: {err}");
                    None
                }
                Err(err @ AlignError::NoMatch { .. }) => {
                    warn!(chunk = position, "excerpt not found in transcript: {err}");
                    None
                }
            })
            .collect()
    }
}
