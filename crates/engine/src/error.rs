// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime error types

use crate::executor::ExecuteError;
use drender_core::{ProjectSpecError, SoftwareTag};
use drender_state::StateError;
use thiserror::Error;

/// Errors surfaced by driver operations.
///
/// Only `start_project` propagates failures to the caller; recovery
/// paths log and retry on the next health event instead.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid project request: {0}")]
    Spec(#[from] ProjectSpecError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("no machine image configured for software package '{0}'")]
    UnknownSoftware(SoftwareTag),

    #[error("project start failed: {0}")]
    Start(#[from] ExecuteError),
}
