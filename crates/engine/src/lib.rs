// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! drender-engine: the driver.
//!
//! Events enter through `Runtime::handle_event` on the driver loop;
//! handlers mutate the state store and return effects; the executor
//! runs effects, offloading cloud I/O onto a bounded pool and posting
//! completion events back onto the loop.

mod error;
mod executor;
mod runtime;
mod scheduler;
mod status;

pub use error::RuntimeError;
pub use executor::{ExecuteError, Executor};
pub use runtime::{Runtime, RuntimeConfig, RuntimeDeps};
pub use scheduler::Scheduler;
pub use status::{InstanceInfo, JobStatusEntry, ProjectStatus};
