// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handlers: the driver's policies.

mod frames;
mod heartbeat;
mod sweep;

use super::Runtime;
use crate::error::RuntimeError;
use drender_adapters::{HealthProbe, JobDispatcher, MachineProvider, StorageProvider};
use drender_core::{Clock, Effect, Event};

impl<M, S, P, D, C> Runtime<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// Process one event on the driver loop.
    ///
    /// Returns follow-up events for the loop to enqueue. All state
    /// mutation happens inside the handlers, never in spawned tasks.
    pub async fn handle_event(&self, event: Event) -> Result<Vec<Event>, RuntimeError> {
        tracing::debug!(event = %event.log_summary(), "handling event");
        match event {
            Event::TimerFired { id } => self.handle_timer_fired(id).await,
            Event::InstanceHealthy { instance } => self.handle_instance_healthy(instance).await,
            Event::InstanceUnhealthy { instance } => {
                self.handle_instance_unhealthy(instance).await
            }
            Event::InstanceReplace { instance } => self.handle_instance_replace(instance).await,
            Event::InstanceKill { instance_id } => self.handle_instance_kill(instance_id).await,
            Event::InstanceCheck { instance_id } => self.handle_instance_check(instance_id).await,
            Event::MachineRestarted { instance, job_ids } => {
                self.handle_machine_restarted(instance, job_ids).await
            }
            Event::RestartFailed {
                instance,
                job_ids,
                error,
            } => self.handle_restart_failed(instance, job_ids, error).await,
            Event::ReplacementReady {
                replaces,
                instance,
                job_ids,
            } => {
                self.handle_replacement_ready(replaces, instance, job_ids)
                    .await
            }
            Event::ReplacementFailed {
                replaces,
                job_ids,
                error,
            } => {
                self.handle_replacement_failed(replaces, job_ids, error)
                    .await
            }
            Event::MachinesTerminated { instance_ids } => {
                self.handle_machines_terminated(instance_ids).await
            }
            Event::TerminateFailed {
                instance_ids,
                error,
            } => self.handle_terminate_failed(instance_ids, error).await,
            Event::FrameReported { record } => self.handle_frame_reported(record).await,
            Event::FrameVerified {
                job_id,
                frames,
                uri,
                exists,
            } => self.handle_frame_verified(job_id, frames, uri, exists).await,
        }
    }

    /// Route a fired timer to its component.
    async fn handle_timer_fired(
        &self,
        id: drender_core::TimerId,
    ) -> Result<Vec<Event>, RuntimeError> {
        if let Some(instance_id) = id.heartbeat_instance() {
            return self.handle_heartbeat_tick(instance_id).await;
        }
        if let Some(project_id) = id.sweep_project() {
            return self.handle_sweep_tick(project_id).await;
        }
        tracing::warn!(timer_id = %id, "fired timer matches no component");
        Ok(Vec::new())
    }

    /// Run a batch of effects, a convenience for the handlers.
    pub(crate) async fn run_effects(&self, effects: Vec<Effect>) {
        self.executor.execute_all(effects).await;
    }
}
