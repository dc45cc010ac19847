// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store adapter.
//!
//! Two operations: create the per-project output bucket (idempotent on
//! the project id) and confirm a reported frame object actually exists
//! before the driver counts it as progress.

use async_trait::async_trait;
use drender_core::{ProjectId, S3Source};
use serde::Deserialize;
use thiserror::Error;

/// Errors from object-store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage API error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("operation timed out")]
    Timeout,
}

/// Object-store operations the driver depends on.
#[async_trait]
pub trait StorageProvider: Clone + Send + Sync + 'static {
    /// Create (or return) the output bucket for a project. The prefix
    /// layout is `<project>/output/`.
    async fn create_bucket(&self, project_id: &ProjectId) -> Result<S3Source, StorageError>;

    /// Check whether an object exists at the given address.
    async fn exists(&self, source: &S3Source) -> Result<bool, StorageError>;
}

/// Storage provider speaking JSON to a storage service endpoint.
#[derive(Clone)]
pub struct HttpStorageProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ExistsReply {
    exists: bool,
}

impl HttpStorageProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl StorageProvider for HttpStorageProvider {
    async fn create_bucket(&self, project_id: &ProjectId) -> Result<S3Source, StorageError> {
        let url = format!("{}/buckets", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "project_id": project_id }))
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Api(format!(
                "storage service returned {}",
                response.status()
            )));
        }

        response
            .json::<S3Source>()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))
    }

    async fn exists(&self, source: &S3Source) -> Result<bool, StorageError> {
        let url = format!("{}/objects", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("bucket", &source.bucket), ("key", &source.key)])
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Api(format!(
                "storage service returned {}",
                response.status()
            )));
        }

        response
            .json::<ExistsReply>()
            .await
            .map(|r| r.exists)
            .map_err(|e| StorageError::Transport(e.to_string()))
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStorageProvider, StorageCall};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Recorded call to FakeStorageProvider
    #[derive(Debug, Clone, PartialEq)]
    pub enum StorageCall {
        CreateBucket { project_id: ProjectId },
        Exists { source: S3Source },
    }

    /// Fake storage provider for testing.
    ///
    /// Every object exists unless marked missing. Buckets land in the
    /// `drender-output` bucket with the standard prefix layout.
    #[derive(Clone, Default)]
    pub struct FakeStorageProvider {
        inner: Arc<Mutex<FakeStorageState>>,
    }

    #[derive(Default)]
    struct FakeStorageState {
        calls: Vec<StorageCall>,
        missing: HashSet<S3Source>,
        bucket_error: Option<StorageError>,
    }

    impl FakeStorageProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<StorageCall> {
            self.inner.lock().calls.clone()
        }

        /// Make `exists` report false for this address.
        pub fn mark_missing(&self, source: S3Source) {
            self.inner.lock().missing.insert(source);
        }

        /// Set error to return on next create_bucket
        pub fn set_bucket_error(&self, error: StorageError) {
            self.inner.lock().bucket_error = Some(error);
        }
    }

    #[async_trait]
    impl StorageProvider for FakeStorageProvider {
        async fn create_bucket(&self, project_id: &ProjectId) -> Result<S3Source, StorageError> {
            let mut inner = self.inner.lock();
            inner.calls.push(StorageCall::CreateBucket {
                project_id: project_id.clone(),
            });
            if let Some(error) = inner.bucket_error.take() {
                return Err(error);
            }
            Ok(S3Source::output_prefix("drender-output", project_id.as_str()))
        }

        async fn exists(&self, source: &S3Source) -> Result<bool, StorageError> {
            let mut inner = self.inner.lock();
            inner.calls.push(StorageCall::Exists {
                source: source.clone(),
            });
            Ok(!inner.missing.contains(source))
        }
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
