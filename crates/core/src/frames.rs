// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame ranges and rendered-frame progress sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A contiguous, inclusive range of frame indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: i32,
    pub end: i32,
}

impl FrameRange {
    /// Create a range. Callers validate `start <= end` (see `ProjectSpec`).
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Number of frames in the range.
    pub fn len(&self) -> usize {
        (self.end - self.start + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, frame: i32) -> bool {
        frame >= self.start && frame <= self.end
    }

    /// Iterate frames in ascending order.
    pub fn frames(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.start, self.end)
    }
}

/// Set of frame indices confirmed rendered for one job.
///
/// Grows monotonically; duplicate inserts are absorbed. Backed by an
/// ordered set so residual partitioning walks frames in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSet(BTreeSet<i32>);

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame. Returns true if it was not already present.
    pub fn insert(&mut self, frame: i32) -> bool {
        self.0.insert(frame)
    }

    pub fn contains(&self, frame: i32) -> bool {
        self.0.contains(&frame)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every frame of `range` is present.
    pub fn covers(&self, range: &FrameRange) -> bool {
        range.frames().all(|f| self.0.contains(&f))
    }

    /// Merge another set into this one.
    pub fn extend(&mut self, other: &FrameSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<i32> for FrameSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "frames_tests.rs"]
mod tests;
