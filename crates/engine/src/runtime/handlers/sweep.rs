// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion sweeper: reap machines whose jobs are all rendered.

use super::Runtime;
use crate::error::RuntimeError;
use drender_adapters::{HealthProbe, JobDispatcher, MachineProvider, StorageProvider};
use drender_core::{Clock, Effect, Event, InstanceId, ProjectId, TimerId};

impl<M, S, P, D, C> Runtime<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// Sweep tick: find fully rendered instances, queue them for
    /// termination, and re-arm unless the project is finished.
    ///
    /// This handler is the sole owner of the sweep timer; it stops
    /// re-arming once the project is complete and its machines are gone.
    pub(crate) async fn handle_sweep_tick(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let Some(candidates) = self.lock_state(|state| {
            state
                .project(&project_id)
                .map(|_| state.instances_with_all_jobs_done(&project_id))
        }) else {
            tracing::debug!(%project_id, "sweep tick for forgotten project");
            return Ok(Vec::new());
        };

        let mut effects = self.queue_termination(&candidates);

        let finished = self.lock_state(|state| {
            state.is_project_complete(&project_id) && !state.project_has_live_instances(&project_id)
        });
        if finished {
            tracing::info!(%project_id, "project complete, sweeper stopping");
        } else {
            effects.push(Effect::SetTimer {
                id: TimerId::sweep(&project_id),
                duration: self.config.sweep_interval,
            });
        }

        self.run_effects(effects).await;
        Ok(Vec::new())
    }

    /// Queue instances for termination, emitting a terminate effect for
    /// the newly queued subset only. Ids already queued are in flight.
    pub(crate) fn queue_termination(&self, candidates: &[InstanceId]) -> Vec<Effect> {
        let newly = self.lock_state_mut(|state| state.try_queue_terminate(candidates));
        if newly.is_empty() {
            return Vec::new();
        }
        tracing::info!(instances = newly.len(), "queueing machines for termination");
        vec![Effect::TerminateMachines { instance_ids: newly }]
    }

    /// Provider acked the termination: drop the instances and their
    /// heartbeats.
    pub(crate) async fn handle_machines_terminated(
        &self,
        instance_ids: Vec<InstanceId>,
    ) -> Result<Vec<Event>, RuntimeError> {
        let mut effects = Vec::new();
        self.lock_state_mut(|state| {
            for instance_id in &instance_ids {
                if let Some(timer) = state.remove_instance(instance_id) {
                    effects.push(Effect::CancelTimer { id: timer });
                }
            }
        });
        tracing::info!(instances = instance_ids.len(), "machines terminated");
        self.run_effects(effects).await;
        Ok(Vec::new())
    }

    /// Termination failed. The pending entries stay so the sweeper
    /// cannot double-issue while the cloud sorts itself out.
    pub(crate) async fn handle_terminate_failed(
        &self,
        instance_ids: Vec<InstanceId>,
        error: String,
    ) -> Result<Vec<Event>, RuntimeError> {
        tracing::error!(
            instances = instance_ids.len(),
            error = %error,
            "termination failed"
        );
        Ok(Vec::new())
    }
}
