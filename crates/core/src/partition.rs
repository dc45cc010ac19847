// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame-range partitioning.
//!
//! Forward partitioning splits a project's range into per-machine chunks.
//! Residual partitioning splits the unrendered remainder of a failing job
//! into the minimum number of contiguous sub-ranges. Contiguous runs let
//! a renderer keep its loaded scene state between frames.

use crate::frames::{FrameRange, FrameSet};

/// Split `range` into contiguous chunks of at most `frames_per_machine`
/// frames, in ascending order. The last chunk is clamped to `range.end`.
///
/// Callers validate the inputs (`range.start <= range.end`,
/// `frames_per_machine >= 1`); see `ProjectSpec::validate`.
pub fn plan_initial(range: FrameRange, frames_per_machine: u32) -> Vec<FrameRange> {
    let step = frames_per_machine.max(1) as i64;
    let mut chunks = Vec::new();
    let mut start = range.start as i64;
    let end = range.end as i64;

    while start <= end {
        let chunk_end = (start + step - 1).min(end);
        chunks.push(FrameRange::new(start as i32, chunk_end as i32));
        start = chunk_end + 1;
    }

    chunks
}

/// Cover `range \ rendered` with the minimum number of contiguous
/// sub-ranges, emitted in ascending frame order.
///
/// Returns an empty vector when every frame of `range` is rendered.
pub fn plan_residual(range: FrameRange, rendered: &FrameSet) -> Vec<FrameRange> {
    let mut runs = Vec::new();
    let mut run_start: Option<i32> = None;

    for frame in range.frames() {
        if rendered.contains(frame) {
            if let Some(start) = run_start.take() {
                runs.push(FrameRange::new(start, frame - 1));
            }
        } else if run_start.is_none() {
            run_start = Some(frame);
        }
    }

    if let Some(start) = run_start {
        runs.push(FrameRange::new(start, range.end));
    }

    runs
}

#[cfg(test)]
#[path = "partition_tests.rs"]
mod tests;
