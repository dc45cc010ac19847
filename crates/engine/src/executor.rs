// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor.
//!
//! Cloud operations block for minutes; they run on spawned tasks gated
//! by a semaphore (the bounded worker pool) and report completion by
//! posting an `Event` back to the driver loop. The executor holds no
//! reference to the state store.

use crate::runtime::RuntimeConfig;
use crate::scheduler::Scheduler;
use drender_adapters::{
    HealthProbe, JobDispatcher, MachineError, MachineProvider, StorageError, StorageProvider,
};
use drender_core::{Clock, Effect, Event, InstanceId, ProjectId, RenderInstance, S3Source};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};

/// How often a restarted machine is re-probed while waiting for it to
/// come back up.
const RESTART_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Errors that can occur during effect execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("machine provider error: {0}")]
    Machine(#[from] MachineError),

    #[error("storage provider error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Clone, Copy)]
struct Timeouts {
    spawn: Duration,
    restart: Duration,
    terminate: Duration,
    probe: Duration,
}

/// Executes effects using the configured providers
pub struct Executor<M, S, P, D, C: Clock> {
    machines: M,
    storage: S,
    probe: P,
    dispatcher: D,
    scheduler: Arc<Mutex<Scheduler>>,
    clock: C,
    /// Channel for posting completion events back to the driver loop
    event_tx: mpsc::Sender<Event>,
    /// Bounded pool for blocking cloud work
    cloud_permits: Arc<Semaphore>,
    timeouts: Timeouts,
}

impl<M, S, P, D, C> Executor<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// Create a new executor
    pub fn new(
        machines: M,
        storage: S,
        probe: P,
        dispatcher: D,
        scheduler: Arc<Mutex<Scheduler>>,
        clock: C,
        event_tx: mpsc::Sender<Event>,
        config: &RuntimeConfig,
    ) -> Self {
        Self {
            machines,
            storage,
            probe,
            dispatcher,
            scheduler,
            clock,
            event_tx,
            cloud_permits: Arc::new(Semaphore::new(config.cloud_parallelism)),
            timeouts: Timeouts {
                spawn: config.spawn_timeout,
                restart: config.restart_timeout,
                terminate: config.terminate_timeout,
                probe: config.probe_timeout,
            },
        }
    }

    /// Get a reference to the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Get a shared reference to the scheduler
    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        Arc::clone(&self.scheduler)
    }

    /// Execute a single effect with tracing.
    ///
    /// Cloud effects return immediately; their outcome arrives later as
    /// an event on the driver loop.
    pub async fn execute(&self, effect: Effect) {
        let span = tracing::info_span!("effect", effect = effect.name());
        let _guard = span.enter();
        tracing::debug!(fields = ?effect.fields(), "executing");

        match effect {
            Effect::ProbeInstance { instance } => self.probe_instance(instance),
            Effect::RestartMachine { instance, job_ids } => {
                self.restart_machine(instance, job_ids)
            }
            Effect::SpawnReplacement {
                cloud_ami,
                replaces,
                job_ids,
            } => self.spawn_replacement(cloud_ami, replaces, job_ids),
            Effect::TerminateMachines { instance_ids } => self.terminate_machines(instance_ids),
            Effect::VerifyFrame {
                job_id,
                frames,
                uri,
            } => self.verify_frame(job_id, frames, uri),
            Effect::DispatchJob { job, instance } => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    if let Err(e) = dispatcher.start_job(&job, &instance).await {
                        tracing::warn!(
                            job_id = %job.id,
                            instance_id = %instance.id,
                            error = %e,
                            "job dispatch failed; heartbeat will catch a wedged worker"
                        );
                    }
                });
            }
            Effect::SetTimer { id, duration } => {
                let now = self.clock.now();
                self.scheduler.lock().set_timer(id, duration, now);
            }
            Effect::CancelTimer { id } => {
                self.scheduler.lock().cancel_timer(id.as_str());
            }
        }
    }

    /// Execute multiple effects in order
    pub async fn execute_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute(effect).await;
        }
    }

    // === inline helpers for the start flow ===

    /// Spawn a fleet and wait for it, on a pool permit with the spawn
    /// timeout applied.
    pub async fn spawn_fleet(
        &self,
        cloud_ami: &str,
        count: u32,
    ) -> Result<Vec<RenderInstance>, ExecuteError> {
        let _permit = self.cloud_permits.acquire().await.ok();
        let instances = tokio::time::timeout(self.timeouts.spawn, self.machines.spawn(cloud_ami, count))
            .await
            .map_err(|_| MachineError::Timeout)??;
        Ok(instances)
    }

    /// Create the project's output bucket, on a pool permit with the
    /// spawn timeout applied.
    pub async fn provision_bucket(&self, project_id: &ProjectId) -> Result<S3Source, ExecuteError> {
        let _permit = self.cloud_permits.acquire().await.ok();
        let uri = tokio::time::timeout(self.timeouts.spawn, self.storage.create_bucket(project_id))
            .await
            .map_err(|_| StorageError::Timeout)??;
        Ok(uri)
    }

    // === spawned cloud tasks ===

    fn probe_instance(&self, instance: RenderInstance) {
        let probe = self.probe.clone();
        let event_tx = self.event_tx.clone();
        let budget = self.timeouts.probe;

        tokio::spawn(async move {
            let healthy = matches!(
                tokio::time::timeout(budget, probe.probe(&instance)).await,
                Ok(Ok(()))
            );
            let event = if healthy {
                Event::InstanceHealthy { instance }
            } else {
                Event::InstanceUnhealthy { instance }
            };
            send_event(&event_tx, event).await;
        });
    }

    fn restart_machine(&self, instance: RenderInstance, job_ids: Vec<drender_core::JobId>) {
        let machines = self.machines.clone();
        let probe = self.probe.clone();
        let event_tx = self.event_tx.clone();
        let permits = Arc::clone(&self.cloud_permits);
        let budget = self.timeouts.restart;
        let probe_budget = self.timeouts.probe;

        tokio::spawn(async move {
            let _permit = permits.acquire().await.ok();
            // Reboot, then poll the worker's status endpoint until it
            // answers again. The whole sequence shares one budget.
            let result = tokio::time::timeout(budget, async {
                machines.restart(&instance.id).await?;
                loop {
                    let probed = tokio::time::timeout(probe_budget, probe.probe(&instance)).await;
                    if matches!(probed, Ok(Ok(()))) {
                        return Ok::<(), MachineError>(());
                    }
                    tokio::time::sleep(RESTART_POLL_INTERVAL).await;
                }
            })
            .await;

            let event = match result {
                Ok(Ok(())) => Event::MachineRestarted { instance, job_ids },
                Ok(Err(e)) => Event::RestartFailed {
                    instance,
                    job_ids,
                    error: e.to_string(),
                },
                Err(_) => Event::RestartFailed {
                    instance,
                    job_ids,
                    error: MachineError::Timeout.to_string(),
                },
            };
            send_event(&event_tx, event).await;
        });
    }

    fn spawn_replacement(
        &self,
        cloud_ami: String,
        replaces: InstanceId,
        job_ids: Vec<drender_core::JobId>,
    ) {
        let machines = self.machines.clone();
        let event_tx = self.event_tx.clone();
        let permits = Arc::clone(&self.cloud_permits);
        let budget = self.timeouts.spawn;

        tokio::spawn(async move {
            let _permit = permits.acquire().await.ok();
            let result = tokio::time::timeout(budget, machines.spawn(&cloud_ami, 1)).await;

            let event = match result {
                Ok(Ok(mut instances)) if !instances.is_empty() => Event::ReplacementReady {
                    replaces,
                    instance: instances.remove(0),
                    job_ids,
                },
                Ok(Ok(_)) => Event::ReplacementFailed {
                    replaces,
                    job_ids,
                    error: "provider returned no instances".to_string(),
                },
                Ok(Err(e)) => Event::ReplacementFailed {
                    replaces,
                    job_ids,
                    error: e.to_string(),
                },
                Err(_) => Event::ReplacementFailed {
                    replaces,
                    job_ids,
                    error: MachineError::Timeout.to_string(),
                },
            };
            send_event(&event_tx, event).await;
        });
    }

    fn terminate_machines(&self, instance_ids: Vec<InstanceId>) {
        let machines = self.machines.clone();
        let event_tx = self.event_tx.clone();
        let permits = Arc::clone(&self.cloud_permits);
        let budget = self.timeouts.terminate;

        tokio::spawn(async move {
            let _permit = permits.acquire().await.ok();
            let result = tokio::time::timeout(budget, machines.terminate(&instance_ids)).await;

            let event = match result {
                Ok(Ok(())) => Event::MachinesTerminated { instance_ids },
                Ok(Err(e)) => Event::TerminateFailed {
                    instance_ids,
                    error: e.to_string(),
                },
                Err(_) => Event::TerminateFailed {
                    instance_ids,
                    error: MachineError::Timeout.to_string(),
                },
            };
            send_event(&event_tx, event).await;
        });
    }

    fn verify_frame(&self, job_id: drender_core::JobId, frames: Vec<i32>, uri: S3Source) {
        let storage = self.storage.clone();
        let event_tx = self.event_tx.clone();
        let permits = Arc::clone(&self.cloud_permits);

        tokio::spawn(async move {
            let _permit = permits.acquire().await.ok();
            let exists = match storage.exists(&uri).await {
                Ok(exists) => exists,
                Err(e) => {
                    // Treated as a miss; the worker retries the notification.
                    tracing::warn!(%job_id, %uri, error = %e, "existence check failed");
                    false
                }
            };
            send_event(
                &event_tx,
                Event::FrameVerified {
                    job_id,
                    frames,
                    uri,
                    exists,
                },
            )
            .await;
        });
    }
}

async fn send_event(event_tx: &mpsc::Sender<Event>, event: Event) {
    if event_tx.send(event).await.is_err() {
        tracing::warn!("driver loop gone, completion event dropped");
    }
}
