// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! drender-adapters: seams to the outside world.
//!
//! The driver never talks to a cloud API, object store, worker, or
//! broker directly; it goes through the traits here. Each trait has an
//! HTTP/wire implementation and a recording fake for tests.

pub mod dispatch;
pub mod feed;
pub mod health;
pub mod machine;
pub mod storage;

pub use dispatch::{DispatchError, HttpJobDispatcher, JobDispatcher};
pub use feed::{ChannelFrameFeed, FrameFeed, FrameFeedHandle};
pub use health::{HealthProbe, HttpHealthProbe, ProbeError};
pub use machine::{
    HttpMachineProvider, InstanceRequest, InstanceResponse, MachineError, MachineProvider,
};
pub use storage::{HttpStorageProvider, StorageError, StorageProvider};

#[cfg(any(test, feature = "test-support"))]
pub use dispatch::{DispatchCall, FakeJobDispatcher};
#[cfg(any(test, feature = "test-support"))]
pub use health::FakeHealthProbe;
#[cfg(any(test, feature = "test-support"))]
pub use machine::{FakeMachineProvider, MachineCall};
#[cfg(any(test, feature = "test-support"))]
pub use storage::{FakeStorageProvider, StorageCall};
