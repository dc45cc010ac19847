// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake machine provider for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MachineError, MachineProvider};
use async_trait::async_trait;
use drender_core::{InstanceId, RenderInstance};
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded call to FakeMachineProvider
#[derive(Debug, Clone, PartialEq)]
pub enum MachineCall {
    Spawn { cloud_ami: String, count: u32 },
    Restart { instance_id: InstanceId },
    Terminate { instance_ids: Vec<InstanceId> },
}

/// Fake machine provider for testing.
///
/// Spawned instances get sequential ids (`i-1`, `i-2`, ...). Each
/// operation can be scripted to fail once.
#[derive(Clone, Default)]
pub struct FakeMachineProvider {
    inner: Arc<Mutex<FakeMachineState>>,
}

#[derive(Default)]
struct FakeMachineState {
    calls: Vec<MachineCall>,
    next_instance: u32,
    spawn_error: Option<MachineError>,
    restart_error: Option<MachineError>,
    terminate_error: Option<MachineError>,
}

impl FakeMachineProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MachineCall> {
        self.inner.lock().calls.clone()
    }

    /// Set error to return on next spawn
    pub fn set_spawn_error(&self, error: MachineError) {
        self.inner.lock().spawn_error = Some(error);
    }

    /// Set error to return on next restart
    pub fn set_restart_error(&self, error: MachineError) {
        self.inner.lock().restart_error = Some(error);
    }

    /// Set error to return on next terminate
    pub fn set_terminate_error(&self, error: MachineError) {
        self.inner.lock().terminate_error = Some(error);
    }
}

#[async_trait]
impl MachineProvider for FakeMachineProvider {
    async fn spawn(&self, cloud_ami: &str, count: u32) -> Result<Vec<RenderInstance>, MachineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MachineCall::Spawn {
            cloud_ami: cloud_ami.to_string(),
            count,
        });
        if let Some(error) = inner.spawn_error.take() {
            return Err(error);
        }
        let instances = (0..count)
            .map(|_| {
                inner.next_instance += 1;
                let n = inner.next_instance;
                RenderInstance::new(format!("i-{n}"), format!("192.0.2.{n}"), cloud_ami)
            })
            .collect();
        Ok(instances)
    }

    async fn restart(&self, instance_id: &InstanceId) -> Result<(), MachineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MachineCall::Restart {
            instance_id: instance_id.clone(),
        });
        match inner.restart_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn terminate(&self, instance_ids: &[InstanceId]) -> Result<(), MachineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MachineCall::Terminate {
            instance_ids: instance_ids.to_vec(),
        });
        match inner.terminate_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
