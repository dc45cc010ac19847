// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared recovery plumbing: job transition and rebinding.

use super::Runtime;
use drender_adapters::{HealthProbe, JobDispatcher, MachineProvider, StorageProvider};
use drender_core::{plan_residual, Clock, Effect, JobId, JobSeed, RenderInstance, TimerId};

impl<M, S, P, D, C> Runtime<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// Retire an instance and re-partition its unrendered work.
    ///
    /// Deactivates every active job on the instance, removes the
    /// instance (cancelling its heartbeat), then covers each job's
    /// unrendered frames with fresh residual sub-jobs. All of it under
    /// one state lock, so a job is never residual-partitioned while
    /// still active.
    ///
    /// Returns the residual job ids and the effects (timer
    /// cancellation) the caller must run.
    pub(crate) fn transition_jobs(
        &self,
        instance: &RenderInstance,
    ) -> (Vec<JobId>, Vec<Effect>) {
        let epoch_ms = self.clock().epoch_ms();
        let mut effects = Vec::new();

        let residual_ids = self.lock_state_mut(|state| {
            let active = state.active_jobs_of(&instance.id);
            for job in &active {
                if let Err(e) = state.deactivate_job(&job.id) {
                    tracing::error!(job_id = %job.id, error = %e, "deactivation failed");
                }
            }
            if let Some(timer) = state.remove_instance(&instance.id) {
                effects.push(Effect::CancelTimer { id: timer });
            }

            let mut residual_ids = Vec::new();
            for job in &active {
                let rendered = state.frames_rendered(&job.id);
                let seeds: Vec<JobSeed> = plan_residual(job.range, &rendered)
                    .into_iter()
                    .map(|range| JobSeed {
                        project_id: job.project_id.clone(),
                        range,
                        source: job.source.clone(),
                        output_uri: job.output_uri.clone(),
                        broker: job.broker.clone(),
                    })
                    .collect();
                if seeds.is_empty() {
                    continue;
                }
                match state.add_jobs(&job.project_id, seeds, epoch_ms) {
                    Ok(ids) => residual_ids.extend(ids),
                    Err(e) => {
                        tracing::error!(job_id = %job.id, error = %e, "residual partition lost")
                    }
                }
            }
            residual_ids
        });

        tracing::info!(
            instance_id = %instance.id,
            residual_jobs = residual_ids.len(),
            "transitioned jobs off instance"
        );
        (residual_ids, effects)
    }

    /// Register a (re)provisioned machine, bind the given jobs to it,
    /// and produce the dispatch and heartbeat effects.
    pub(crate) fn bind_and_start(
        &self,
        instance: &RenderInstance,
        job_ids: &[JobId],
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.lock_state_mut(|state| {
            state.add_instance(instance.clone());
            for job_id in job_ids {
                if let Err(e) = state.bind_instance(job_id, &instance.id) {
                    tracing::warn!(%job_id, error = %e, "bind failed, job left unassigned");
                    continue;
                }
                if let Some(job) = state.job(job_id) {
                    effects.push(Effect::DispatchJob {
                        job: job.clone(),
                        instance: instance.clone(),
                    });
                }
            }
            let timer = TimerId::heartbeat(&instance.id);
            if state
                .set_heartbeat_timer(&instance.id, timer.clone())
                .is_ok()
            {
                effects.push(Effect::SetTimer {
                    id: timer,
                    duration: self.config.heartbeat_interval,
                });
            }
        });
        effects
    }
}
