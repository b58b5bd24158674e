use super::chunk_by_time;
use crate::types::{ChunkConfig, Segment};

fn segment(start: f64, end: f64) -> Segment {
    Segment {
        start,
        end,
        text: format!("segment {start}-{end}"),
        words: Vec::new(),
    }
}

fn even_segments(count: usize, length: f64) -> Vec<Segment> {
    (0..count)
        .map(|i| segment(i as f64 * length, (i + 1) as f64 * length))
        .collect()
}

fn ranges(segments: &[Segment], config: ChunkConfig) -> Vec<Vec<usize>> {
    chunk_by_time(segments, config)
        .iter()
        .map(|chunk| chunk.segment_ids().collect())
        .collect()
}

#[test]
fn test_empty_input_yields_no_chunks() {
    let chunks = chunk_by_time(&[], ChunkConfig::new(5.0, 60.0));
    assert!(chunks.is_empty());
}

#[test]
fn test_zero_overlap_partitions_segments() {
    let segments = even_segments(40, 7.5);
    let chunks = ranges(&segments, ChunkConfig::new(1.0, 0.0));

    assert!(chunks.len() > 1);
    let flattened: Vec<usize> = chunks.iter().flatten().copied().collect();
    assert_eq!(flattened, (0..segments.len()).collect::<Vec<_>>());
}

#[test]
fn test_long_segment_is_emitted_alone() {
    let segments = vec![segment(0.0, 10.0), segment(10.0, 100.0), segment(100.0, 110.0)];
    let chunks = ranges(&segments, ChunkConfig::new(1.0, 0.0));
    assert_eq!(chunks, vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn test_long_segment_is_emitted_alone_with_overlap() {
    let segments = vec![segment(0.0, 10.0), segment(10.0, 400.0), segment(400.0, 410.0)];
    let chunks = ranges(&segments, ChunkConfig::new(5.0, 60.0));
    assert_eq!(chunks, vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn test_short_chunk_is_not_carried_whole() {
    // the first chunk lies entirely inside the overlap
    let segments = vec![segment(0.0, 10.0), segment(10.0, 65.0), segment(65.0, 70.0)];
    let chunks = ranges(&segments, ChunkConfig::new(1.0, 30.0));
    assert_eq!(chunks, vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn test_final_partial_chunk_is_flushed() {
    let segments = even_segments(7, 10.0);
    let chunks = ranges(&segments, ChunkConfig::new(1.0, 0.0));
    assert_eq!(chunks, vec![vec![0, 1, 2, 3, 4, 5], vec![6]]);
}

#[test]
fn test_overlap_repeats_trailing_segments() {
    let segments = even_segments(12, 10.0);
    let chunks = ranges(&segments, ChunkConfig::new(1.0, 15.0));
    assert_eq!(
        chunks,
        vec![
            vec![0, 1, 2, 3, 4, 5],
            vec![5, 6, 7, 8, 9],
            vec![9, 10, 11],
        ]
    );
}

#[test]
fn test_carried_segment_is_not_carried_again() {
    let segments = vec![
        segment(0.0, 50.0),
        segment(55.0, 60.0),
        segment(60.0, 62.0),
        segment(62.0, 95.0),
    ];
    let chunks = ranges(&segments, ChunkConfig::new(1.0, 30.0));
    assert_eq!(chunks, vec![vec![0, 1], vec![1, 2], vec![2, 3]]);
}

#[test]
fn test_window_starts_at_first_segment() {
    let segments = vec![segment(300.0, 330.0), segment(330.0, 355.0)];
    let chunks = ranges(&segments, ChunkConfig::new(1.0, 0.0));
    assert_eq!(chunks, vec![vec![0, 1]]);
}

#[test]
fn test_every_segment_lands_in_one_or_two_consecutive_chunks() {
    // irregular lengths from a small linear congruential sequence
    let mut state: u64 = 17;
    let mut cursor = 0.0;
    let mut segments = Vec::new();
    for _ in 0..300 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let length = 1.0 + (state >> 33) as f64 % 40.0;
        segments.push(segment(cursor, cursor + length));
        cursor += length + 0.25;
    }

    for (minutes, overlap) in [(1.0, 0.0), (1.0, 20.0), (2.0, 59.0), (5.0, 60.0), (0.5, 29.0)] {
        let chunks = ranges(&segments, ChunkConfig::new(minutes, overlap));
        for idx in 0..segments.len() {
            let holders: Vec<usize> = chunks
                .iter()
                .enumerate()
                .filter(|(_, ids)| ids.contains(&idx))
                .map(|(chunk_idx, _)| chunk_idx)
                .collect();
            assert!(
                !holders.is_empty() && holders.len() <= 2,
                "segment {idx} appears in {holders:?} for ({minutes}, {overlap})"
            );
            if holders.len() == 2 {
                assert_eq!(holders[1], holders[0] + 1);
            }
        }
    }
}
