// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::JobId;

#[test]
fn uuid_gen_produces_unique_ids() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn sequential_gen_counts_up() {
    let gen = SequentialIdGen::new("job");
    assert_eq!(gen.next(), "job-1");
    assert_eq!(gen.next(), "job-2");
    assert_eq!(gen.next(), "job-3");
}

#[test]
fn sequential_gen_clones_share_counter() {
    let gen = SequentialIdGen::new("i");
    let clone = gen.clone();
    assert_eq!(gen.next(), "i-1");
    assert_eq!(clone.next(), "i-2");
}

#[test]
fn defined_id_roundtrips_and_compares() {
    let id = JobId::new("abc-123");
    assert_eq!(id.as_str(), "abc-123");
    assert_eq!(id, "abc-123");
    assert_eq!(id.to_string(), "abc-123");
    assert_eq!(id.short(3), "abc");
    assert_eq!(id.short(64), "abc-123");

    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"abc-123\"");
    let back: JobId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
