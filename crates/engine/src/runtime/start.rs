// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project start: partition, provision, bind, dispatch.

use super::Runtime;
use crate::error::RuntimeError;
use crate::status::ProjectStatus;
use drender_adapters::{HealthProbe, JobDispatcher, MachineProvider, StorageProvider};
use drender_core::{
    plan_initial, BrokerAddress, Clock, Effect, JobId, JobSeed, Project, ProjectSpec, TimerId,
};
use drender_state::StateError;

impl<M, S, P, D, C> Runtime<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// Accept a START request and drive it to a running fleet.
    ///
    /// Machines and the output bucket are provisioned concurrently;
    /// either failure fails the whole start, reaping anything already
    /// provisioned and forgetting the project so the id can be retried.
    pub async fn start_project(&self, spec: ProjectSpec) -> Result<ProjectStatus, RuntimeError> {
        spec.validate()?;
        let cloud_ami = self
            .config
            .ami_catalog
            .get(spec.software.as_str())
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownSoftware(spec.software.clone()))?;

        let epoch_ms = self.clock().epoch_ms();
        let project = Project::new(&spec, epoch_ms);
        let project_id = project.id.clone();
        let broker = BrokerAddress::new(spec.public_ip.clone());

        // Persist the project and its initial partition.
        let job_ids = self.lock_state_mut(|state| -> Result<Vec<JobId>, StateError> {
            state.set_broker(broker.clone())?;
            state.add_project(project.clone())?;
            let seeds: Vec<JobSeed> = plan_initial(project.range, project.frames_per_machine)
                .into_iter()
                .map(|range| JobSeed {
                    project_id: project_id.clone(),
                    range,
                    source: project.source.clone(),
                    output_uri: None,
                    broker: broker.clone(),
                })
                .collect();
            state.add_jobs(&project_id, seeds, epoch_ms)
        })?;

        let count = job_ids.len() as u32;
        tracing::info!(
            project_id = %project_id,
            jobs = count,
            range = %project.range,
            software = %project.software,
            "starting project"
        );

        // One machine per job, and the output bucket, side by side.
        let (machines, bucket) = tokio::join!(
            self.executor.spawn_fleet(&cloud_ami, count),
            self.executor.provision_bucket(&project_id),
        );

        let (instances, output_uri) = match (machines, bucket) {
            (Ok(instances), Ok(output_uri)) => (instances, output_uri),
            (Ok(instances), Err(error)) => {
                tracing::warn!(
                    project_id = %project_id,
                    fleet = instances.len(),
                    "bucket creation failed after spawn, reaping fleet"
                );
                let instance_ids = instances.iter().map(|i| i.id.clone()).collect();
                self.executor
                    .execute(Effect::TerminateMachines { instance_ids })
                    .await;
                self.lock_state_mut(|state| state.remove_project(&project_id));
                return Err(error.into());
            }
            (Err(error), _) => {
                // Bucket creation is idempotent per project id; a
                // half-created bucket needs no cleanup.
                self.lock_state_mut(|state| state.remove_project(&project_id));
                return Err(error.into());
            }
        };

        // Bind instances pairwise, attach the output URI everywhere,
        // arm heartbeats and the sweep, then dispatch STARTs.
        let mut effects = Vec::new();
        self.lock_state_mut(|state| -> Result<(), StateError> {
            state.set_project_output(&project_id, output_uri.clone())?;
            for (job_id, instance) in job_ids.iter().zip(&instances) {
                state.add_instance(instance.clone());
                state.bind_instance(job_id, &instance.id)?;
                state.bind_output_uri(job_id, output_uri.clone())?;
            }
            for instance in &instances {
                let timer = TimerId::heartbeat(&instance.id);
                state.set_heartbeat_timer(&instance.id, timer.clone())?;
                effects.push(Effect::SetTimer {
                    id: timer,
                    duration: self.config.heartbeat_interval,
                });
            }
            effects.push(Effect::SetTimer {
                id: TimerId::sweep(&project_id),
                duration: self.config.sweep_interval,
            });
            for (job_id, instance) in job_ids.iter().zip(&instances) {
                if let Some(job) = state.job(job_id) {
                    effects.push(Effect::DispatchJob {
                        job: job.clone(),
                        instance: instance.clone(),
                    });
                }
            }
            Ok(())
        })?;
        self.executor.execute_all(effects).await;

        self.project_status(&project_id)
            .ok_or(RuntimeError::State(StateError::UnknownProject(project_id)))
    }
}
