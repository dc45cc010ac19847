// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_bucket_follows_output_layout() {
    let storage = FakeStorageProvider::new();
    let bucket = storage.create_bucket(&ProjectId::new("castle")).await.unwrap();
    assert_eq!(bucket.bucket, "drender-output");
    assert_eq!(bucket.key, "castle/output/");

    // Idempotent per project id
    let again = storage.create_bucket(&ProjectId::new("castle")).await.unwrap();
    assert_eq!(again, bucket);
}

#[tokio::test]
async fn fake_exists_honors_missing_marks() {
    let storage = FakeStorageProvider::new();
    let present = S3Source::new("b", "frame-1.png");
    let absent = S3Source::new("b", "frame-2.png");
    storage.mark_missing(absent.clone());

    assert!(storage.exists(&present).await.unwrap());
    assert!(!storage.exists(&absent).await.unwrap());
    assert_eq!(storage.calls().len(), 2);
}
