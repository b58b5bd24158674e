mod accumulator;

#[cfg(test)]
mod tests;

use crate::types::{Chunk, ChunkConfig, Segment};

use accumulator::WindowAccumulator;

/// Split segments into time-bounded windows sized for the model context.
///
/// A segment joins the open chunk while it ends inside the current window.
/// When one does not, the chunk is closed and the next window starts
/// `overlap_seconds` before the closed chunk's last segment ended; segments of
/// the closed chunk that start inside that overlap are repeated at the head of
/// the next chunk. Segments longer than a window are never split.
pub fn chunk_by_time(segments: &[Segment], config: ChunkConfig) -> Vec<Chunk<'_>> {
    let mut accumulator = WindowAccumulator::new(segments, config);
    for idx in 0..segments.len() {
        accumulator.handle_segment(idx);
    }
    accumulator.finish_chunk();
    accumulator
        .into_ranges()
        .into_iter()
        .map(|range| Chunk::new(range.start, &segments[range]))
        .collect()
}
