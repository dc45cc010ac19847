// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    single = { 5, 5, 1 },
    short = { 1, 5, 5 },
    negative_start = { -3, 2, 6 },
)]
fn range_len(start: i32, end: i32, expected: usize) {
    assert_eq!(FrameRange::new(start, end).len(), expected);
}

#[test]
fn range_contains_bounds() {
    let r = FrameRange::new(10, 20);
    assert!(r.contains(10));
    assert!(r.contains(20));
    assert!(!r.contains(9));
    assert!(!r.contains(21));
}

#[test]
fn range_frames_ascending() {
    let r = FrameRange::new(3, 6);
    let frames: Vec<i32> = r.frames().collect();
    assert_eq!(frames, vec![3, 4, 5, 6]);
}

#[test]
fn set_insert_is_idempotent() {
    let mut set = FrameSet::new();
    assert!(set.insert(7));
    assert!(!set.insert(7));
    assert_eq!(set.len(), 1);
}

#[test]
fn set_covers_range() {
    let set: FrameSet = (1..=5).collect();
    assert!(set.covers(&FrameRange::new(1, 5)));
    assert!(set.covers(&FrameRange::new(2, 4)));
    assert!(!set.covers(&FrameRange::new(1, 6)));
}

#[test]
fn set_iterates_in_order() {
    let set: FrameSet = [9, 1, 5].into_iter().collect();
    let frames: Vec<i32> = set.iter().collect();
    assert_eq!(frames, vec![1, 5, 9]);
}

#[test]
fn set_extend_unions() {
    let mut a: FrameSet = [1, 2].into_iter().collect();
    let b: FrameSet = [2, 3].into_iter().collect();
    a.extend(&b);
    assert_eq!(a.len(), 3);
    assert!(a.contains(3));
}
