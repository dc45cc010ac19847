// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat policy: probe on tick, restart first, replace when the
//! restart fails. The pending-action queues make every leg
//! at-most-once while an attempt is in flight.

use super::Runtime;
use crate::error::RuntimeError;
use drender_adapters::{HealthProbe, JobDispatcher, MachineProvider, StorageProvider};
use drender_core::{Clock, Effect, Event, InstanceId, JobId, RenderInstance, TimerId};

impl<M, S, P, D, C> Runtime<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// Heartbeat tick: issue one probe. The next tick is armed only
    /// after the result returns, so probes never stack up behind a
    /// slow worker.
    pub(crate) async fn handle_heartbeat_tick(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let Some(instance) = self.lock_state(|state| state.instance(&instance_id).cloned())
        else {
            tracing::debug!(%instance_id, "heartbeat tick for forgotten instance");
            return Ok(Vec::new());
        };
        self.run_effects(vec![Effect::ProbeInstance { instance }])
            .await;
        Ok(Vec::new())
    }

    /// Probe an instance immediately, outside the cadence.
    pub(crate) async fn handle_instance_check(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<Event>, RuntimeError> {
        self.handle_heartbeat_tick(instance_id).await
    }

    pub(crate) async fn handle_instance_healthy(
        &self,
        instance: RenderInstance,
    ) -> Result<Vec<Event>, RuntimeError> {
        // Re-arm unless the instance was reaped while the probe ran.
        let still_known = self.lock_state(|state| state.instance(&instance.id).is_some());
        if still_known {
            self.run_effects(vec![Effect::SetTimer {
                id: TimerId::heartbeat(&instance.id),
                duration: self.config.heartbeat_interval,
            }])
            .await;
        }
        Ok(Vec::new())
    }

    /// First unhealthy report: soft recovery. Transition the jobs off
    /// the machine and ask the provider for a reboot.
    pub(crate) async fn handle_instance_unhealthy(
        &self,
        instance: RenderInstance,
    ) -> Result<Vec<Event>, RuntimeError> {
        let (known, queued) = self.lock_state_mut(|state| {
            let known = state.instance(&instance.id).is_some();
            let queued = known && state.try_queue_restart(&instance.id);
            (known, queued)
        });
        if !known {
            tracing::debug!(instance_id = %instance.id, "unhealthy report for forgotten instance");
            return Ok(Vec::new());
        }
        if !queued {
            tracing::debug!(
                instance_id = %instance.id,
                "recovery already in flight, dropping unhealthy report"
            );
            return Ok(Vec::new());
        }

        tracing::warn!(instance_id = %instance.id, "instance unhealthy, attempting restart");
        let (job_ids, mut effects) = self.transition_jobs(&instance);

        if job_ids.is_empty() {
            // Nothing left to render on it; just reap the machine.
            self.lock_state_mut(|state| state.dequeue_restart(&instance.id));
            effects.extend(self.queue_termination(&[instance.id.clone()]));
        } else {
            effects.push(Effect::RestartMachine { instance, job_ids });
        }
        self.run_effects(effects).await;
        Ok(Vec::new())
    }

    /// Operator-forced replacement: no restart attempt.
    pub(crate) async fn handle_instance_replace(
        &self,
        instance: RenderInstance,
    ) -> Result<Vec<Event>, RuntimeError> {
        let (known, queued) = self.lock_state_mut(|state| {
            let known = state.instance(&instance.id).is_some();
            let queued = known && state.try_queue_spawn(&instance.id);
            (known, queued)
        });
        if !known || !queued {
            tracing::debug!(
                instance_id = %instance.id,
                known,
                "replace request dropped"
            );
            return Ok(Vec::new());
        }

        let (job_ids, mut effects) = self.transition_jobs(&instance);
        effects.extend(self.queue_termination(&[instance.id.clone()]));

        if job_ids.is_empty() {
            self.lock_state_mut(|state| state.dequeue_spawn(&instance.id));
        } else {
            effects.push(Effect::SpawnReplacement {
                cloud_ami: instance.cloud_ami.clone(),
                replaces: instance.id.clone(),
                job_ids,
            });
        }
        self.run_effects(effects).await;
        Ok(Vec::new())
    }

    /// Operator kill: forced replacement by instance id.
    pub(crate) async fn handle_instance_kill(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let Some(instance) = self.lock_state(|state| state.instance(&instance_id).cloned())
        else {
            tracing::warn!(%instance_id, "kill request for unknown instance");
            return Ok(Vec::new());
        };
        self.handle_instance_replace(instance).await
    }

    /// Restart came back healthy: rebind the residual jobs to the same
    /// machine and resume monitoring.
    pub(crate) async fn handle_machine_restarted(
        &self,
        instance: RenderInstance,
        job_ids: Vec<JobId>,
    ) -> Result<Vec<Event>, RuntimeError> {
        tracing::info!(
            instance_id = %instance.id,
            jobs = job_ids.len(),
            "machine restarted, resuming jobs"
        );
        let effects = self.bind_and_start(&instance, &job_ids);
        self.lock_state_mut(|state| state.dequeue_restart(&instance.id));
        self.run_effects(effects).await;
        Ok(Vec::new())
    }

    /// Restart failed: escalate to a replacement machine. The dead
    /// machine is also handed to the terminator so it stops billing.
    pub(crate) async fn handle_restart_failed(
        &self,
        instance: RenderInstance,
        job_ids: Vec<JobId>,
        error: String,
    ) -> Result<Vec<Event>, RuntimeError> {
        tracing::warn!(
            instance_id = %instance.id,
            error = %error,
            "restart failed, escalating to replacement"
        );
        let queued = self.lock_state_mut(|state| {
            state.dequeue_restart(&instance.id);
            state.try_queue_spawn(&instance.id)
        });
        if !queued {
            tracing::debug!(
                instance_id = %instance.id,
                "replacement already in flight, dropping escalation"
            );
            return Ok(Vec::new());
        }

        let mut effects = self.queue_termination(&[instance.id.clone()]);
        effects.push(Effect::SpawnReplacement {
            cloud_ami: instance.cloud_ami.clone(),
            replaces: instance.id,
            job_ids,
        });
        self.run_effects(effects).await;
        Ok(Vec::new())
    }

    /// Replacement machine is up: bind all residual jobs to it.
    pub(crate) async fn handle_replacement_ready(
        &self,
        replaces: InstanceId,
        instance: RenderInstance,
        job_ids: Vec<JobId>,
    ) -> Result<Vec<Event>, RuntimeError> {
        tracing::info!(
            replaces = %replaces,
            instance_id = %instance.id,
            jobs = job_ids.len(),
            "replacement machine ready"
        );
        let effects = self.bind_and_start(&instance, &job_ids);
        self.lock_state_mut(|state| state.dequeue_spawn(&replaces));
        self.run_effects(effects).await;
        Ok(Vec::new())
    }

    /// Replacement spawn failed. The pending entry stays so no second
    /// spawn races this one; the frames stay covered by the unbound
    /// residual jobs, visible in status.
    pub(crate) async fn handle_replacement_failed(
        &self,
        replaces: InstanceId,
        job_ids: Vec<JobId>,
        error: String,
    ) -> Result<Vec<Event>, RuntimeError> {
        tracing::error!(
            replaces = %replaces,
            jobs = job_ids.len(),
            error = %error,
            "replacement spawn failed, residual jobs left unassigned"
        );
        Ok(Vec::new())
    }
}
