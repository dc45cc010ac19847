// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime for the DRender driver

mod handlers;
mod recovery;
mod start;

use crate::executor::Executor;
use crate::scheduler::Scheduler;
use crate::status::{self, ProjectStatus};
use drender_adapters::{HealthProbe, JobDispatcher, MachineProvider, StorageProvider};
use drender_core::{Clock, Event, ProjectId};
use drender_state::StateStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Driver tuning knobs. Defaults carry the stock intervals and
/// timeouts; deployments override via the daemon config file.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Liveness probe cadence per instance.
    pub heartbeat_interval: Duration,
    /// Budget for a single probe request.
    pub probe_timeout: Duration,
    /// Completion sweep cadence per project.
    pub sweep_interval: Duration,
    pub spawn_timeout: Duration,
    pub restart_timeout: Duration,
    pub terminate_timeout: Duration,
    /// Size of the bounded pool for blocking cloud work.
    pub cloud_parallelism: usize,
    /// Software package tag -> cloud machine image.
    pub ami_catalog: HashMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(10),
            spawn_timeout: Duration::from_secs(8 * 60),
            restart_timeout: Duration::from_secs(5 * 60),
            terminate_timeout: Duration::from_secs(8 * 60),
            cloud_parallelism: 10,
            ami_catalog: HashMap::new(),
        }
    }
}

/// Runtime provider dependencies
pub struct RuntimeDeps<M, S, P, D> {
    pub machines: M,
    pub storage: S,
    pub probe: P,
    pub dispatcher: D,
    pub state: Arc<Mutex<StateStore>>,
}

/// Runtime that coordinates the driver.
///
/// Generic over the provider seams and the clock so tests run against
/// fakes with controlled time.
pub struct Runtime<M, S, P, D, C: Clock> {
    pub(crate) executor: Executor<M, S, P, D, C>,
    pub(crate) state: Arc<Mutex<StateStore>>,
    pub(crate) config: RuntimeConfig,
}

impl<M, S, P, D, C> Runtime<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// Create a new runtime
    pub fn new(
        deps: RuntimeDeps<M, S, P, D>,
        clock: C,
        config: RuntimeConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        let state = Arc::clone(&deps.state);
        let executor = Executor::new(
            deps.machines,
            deps.storage,
            deps.probe,
            deps.dispatcher,
            Arc::new(Mutex::new(Scheduler::new())),
            clock,
            event_tx,
            &config,
        );
        Self {
            executor,
            state,
            config,
        }
    }

    /// Get a reference to the clock
    pub fn clock(&self) -> &C {
        self.executor.clock()
    }

    /// Get a shared reference to the scheduler (for deadline polling in
    /// the daemon loop)
    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        self.executor.scheduler()
    }

    /// Snapshot of one project, or `None` for an unknown id.
    pub fn project_status(&self, project_id: &ProjectId) -> Option<ProjectStatus> {
        status::project_status(&self.state.lock(), project_id)
    }

    /// Ids of every project the driver knows.
    pub fn project_ids(&self) -> Vec<ProjectId> {
        self.state.lock().project_ids()
    }

    /// Helper to read state under the lock
    pub(crate) fn lock_state<T>(&self, f: impl FnOnce(&StateStore) -> T) -> T {
        let guard = self.state.lock();
        f(&guard)
    }

    /// Helper to mutate state under the lock
    pub(crate) fn lock_state_mut<T>(&self, f: impl FnOnce(&mut StateStore) -> T) -> T {
        let mut guard = self.state.lock();
        f(&mut guard)
    }
}

#[cfg(test)]
#[path = "../runtime_tests/mod.rs"]
mod tests;
