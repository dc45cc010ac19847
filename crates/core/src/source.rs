// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store addresses

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of an object (or prefix) in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct S3Source {
    pub bucket: String,
    pub key: String,
}

impl S3Source {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Output prefix for a project's rendered frames: `<project>/output/`.
    pub fn output_prefix(bucket: impl Into<String>, project_id: &str) -> Self {
        Self {
            bucket: bucket.into(),
            key: format!("{}/output/", project_id),
        }
    }
}

impl fmt::Display for S3Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
