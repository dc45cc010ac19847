// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn displays_as_s3_url() {
    let src = S3Source::new("scenes", "castle/scene.blend");
    assert_eq!(src.to_string(), "s3://scenes/castle/scene.blend");
}

#[test]
fn output_prefix_layout() {
    let out = S3Source::output_prefix("drender-output", "proj-7");
    assert_eq!(out.bucket, "drender-output");
    assert_eq!(out.key, "proj-7/output/");
}

#[test]
fn serde_roundtrip() {
    let src = S3Source::new("b", "k");
    let json = serde_json::to_string(&src).unwrap();
    let back: S3Source = serde_json::from_str(&json).unwrap();
    assert_eq!(back, src);
}
