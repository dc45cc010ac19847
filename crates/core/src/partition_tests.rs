// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn ranges(chunks: &[(i32, i32)]) -> Vec<FrameRange> {
    chunks.iter().map(|&(s, e)| FrameRange::new(s, e)).collect()
}

#[parameterized(
    even_split = { 1, 6, 2, &[(1, 2), (3, 4), (5, 6)] },
    clamped_tail = { 1, 5, 2, &[(1, 2), (3, 4), (5, 5)] },
    one_frame_per_machine = { 1, 3, 1, &[(1, 1), (2, 2), (3, 3)] },
    single_frame_project = { 4, 4, 10, &[(4, 4)] },
    chunk_larger_than_range = { 1, 5, 100, &[(1, 5)] },
    chunk_equals_range = { 1, 5, 5, &[(1, 5)] },
)]
fn forward_partition(start: i32, end: i32, fpm: u32, expected: &[(i32, i32)]) {
    assert_eq!(
        plan_initial(FrameRange::new(start, end), fpm),
        ranges(expected)
    );
}

#[test]
fn forward_partition_near_i32_max_does_not_overflow() {
    let range = FrameRange::new(i32::MAX - 3, i32::MAX);
    let chunks = plan_initial(range, 3);
    assert_eq!(
        chunks,
        ranges(&[(i32::MAX - 3, i32::MAX - 1), (i32::MAX, i32::MAX)])
    );
}

#[parameterized(
    nothing_rendered = { 1, 10, &[], &[(1, 10)] },
    all_rendered = { 1, 4, &[1, 2, 3, 4], &[] },
    one_gap = { 1, 10, &[1, 2, 3, 5], &[(4, 4), (6, 10)] },
    alternating = { 1, 10, &[1, 3, 5, 7, 9], &[(2, 2), (4, 4), (6, 6), (8, 8), (10, 10)] },
    leading_gap = { 1, 6, &[4, 5, 6], &[(1, 3)] },
    trailing_gap = { 1, 6, &[1, 2, 3], &[(4, 6)] },
    rendered_outside_range_ignored = { 5, 8, &[1, 2, 9], &[(5, 8)] },
)]
fn residual_partition(start: i32, end: i32, rendered: &[i32], expected: &[(i32, i32)]) {
    let set: FrameSet = rendered.iter().copied().collect();
    assert_eq!(
        plan_residual(FrameRange::new(start, end), &set),
        ranges(expected)
    );
}

proptest! {
    /// Forward partitioning is a partition: chunks are contiguous,
    /// non-overlapping, ascending, and union to the original range.
    #[test]
    fn forward_partition_unions_to_range(
        start in -1000i32..1000,
        len in 0i32..500,
        fpm in 1u32..40,
    ) {
        let range = FrameRange::new(start, start + len);
        let chunks = plan_initial(range, fpm);

        prop_assert!(!chunks.is_empty());
        prop_assert_eq!(chunks[0].start, range.start);
        prop_assert_eq!(chunks[chunks.len() - 1].end, range.end);
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[1].start, pair[0].end + 1);
        }
        for chunk in &chunks {
            prop_assert!(chunk.len() <= fpm as usize);
        }
    }

    /// Residual sub-ranges cover exactly the unrendered frames, with
    /// maximal runs (no two adjacent sub-ranges could be merged).
    #[test]
    fn residual_partition_covers_complement(
        start in -100i32..100,
        len in 0i32..200,
        rendered in proptest::collection::btree_set(-150i32..350, 0..120),
    ) {
        let range = FrameRange::new(start, start + len);
        let set: FrameSet = rendered.iter().copied().collect();
        let runs = plan_residual(range, &set);

        let mut covered = FrameSet::new();
        for run in &runs {
            prop_assert!(run.start <= run.end);
            prop_assert!(range.contains(run.start) && range.contains(run.end));
            for frame in run.frames() {
                prop_assert!(!set.contains(frame));
                prop_assert!(covered.insert(frame), "runs overlap at {}", frame);
            }
        }
        for frame in range.frames() {
            if !set.contains(frame) {
                prop_assert!(covered.contains(frame), "frame {} left uncovered", frame);
            }
        }
        for pair in runs.windows(2) {
            prop_assert!(pair[1].start > pair[0].end + 1, "adjacent runs should merge");
        }
    }
}
