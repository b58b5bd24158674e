use std::ops::Range;

use crate::types::{ChunkConfig, Segment};

pub(super) struct WindowAccumulator<'a> {
    segments: &'a [Segment],
    config: ChunkConfig,
    chunks: Vec<Range<usize>>,
    current: Range<usize>,
    // segments before this index were carried over from the previous chunk
    fresh_from: usize,
    window_start: f64,
}

impl<'a> WindowAccumulator<'a> {
    pub(super) fn new(segments: &'a [Segment], config: ChunkConfig) -> Self {
        Self {
            segments,
            config,
            chunks: Vec::new(),
            current: 0..0,
            fresh_from: 0,
            window_start: segments.first().map_or(0.0, |segment| segment.start),
        }
    }

    pub(super) fn handle_segment(&mut self, idx: usize) {
        let segment = &self.segments[idx];
        if self.current.is_empty() {
            self.current = idx..idx + 1;
            self.fresh_from = idx;
            return;
        }
        if segment.end <= self.window_start + self.config.window_seconds {
            self.current.end = idx + 1;
            return;
        }

        let last_end = self.segments[self.current.end - 1].end;
        // a segment longer than the window opens its chunk alone, and a closed
        // chunk is never repeated in full
        let carry_from = if segment.end - segment.start > self.config.window_seconds {
            idx
        } else {
            self.carry_start(last_end).max(self.current.start + 1)
        };
        self.finish_chunk();
        self.window_start = last_end - self.config.overlap_seconds;
        self.current = carry_from..idx + 1;
        self.fresh_from = idx;
    }

    pub(super) fn finish_chunk(&mut self) {
        if self.current.is_empty() {
            return;
        }
        self.chunks.push(self.current.clone());
        self.current = self.current.end..self.current.end;
    }

    pub(super) fn into_ranges(self) -> Vec<Range<usize>> {
        self.chunks
    }

    /// First fresh segment of the current chunk that starts inside the overlap.
    /// Carried segments are never carried twice.
    fn carry_start(&self, last_end: f64) -> usize {
        let boundary = last_end - self.config.overlap_seconds;
        let fresh = &self.segments[self.fresh_from..self.current.end];
        self.fresh_from + fresh.partition_point(|segment| segment.start <= boundary)
    }
}
