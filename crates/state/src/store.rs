// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state store: sole authority for domain state.

use drender_core::{
    BrokerAddress, FrameSet, IdGen, InstanceId, JobId, JobSeed, Project, ProjectId, RenderInstance,
    RenderJob, S3Source, TimerId, UuidIdGen,
};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors from state-store preconditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("project already present: {0}")]
    ProjectExists(ProjectId),

    #[error("unknown project: {0}")]
    UnknownProject(ProjectId),

    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    #[error("unknown instance: {0}")]
    UnknownInstance(InstanceId),

    #[error("duplicate job id: {0}")]
    DuplicateJob(JobId),

    #[error("frame {frame} outside job {job_id} range")]
    FrameOutOfRange { job_id: JobId, frame: i32 },

    #[error("project {0} output URI already bound")]
    OutputAlreadyBound(ProjectId),

    #[error("broker already initialized with host {current}, refusing {requested}")]
    BrokerMismatch { current: String, requested: String },
}

/// Authoritative in-memory store for projects, jobs, instances, frame
/// progress, pending-action queues, and heartbeat-timer bookkeeping.
///
/// The pending queues are dedup sets, not FIFOs: membership means a
/// recovery or termination action is already in flight for that
/// instance, so an equal action must not be enqueued again.
pub struct StateStore {
    projects: IndexMap<ProjectId, Project>,
    jobs: IndexMap<JobId, RenderJob>,
    project_jobs: HashMap<ProjectId, Vec<JobId>>,
    instances: IndexMap<InstanceId, RenderInstance>,
    progress: HashMap<JobId, FrameSet>,
    pending_spawn: HashSet<InstanceId>,
    pending_restart: HashSet<InstanceId>,
    pending_terminate: HashSet<InstanceId>,
    heartbeat_timers: HashMap<InstanceId, TimerId>,
    broker: Option<BrokerAddress>,
    id_gen: Arc<dyn IdGen>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_id_gen(UuidIdGen)
    }

    /// Create a store with a caller-supplied job-id generator.
    pub fn with_id_gen(id_gen: impl IdGen + 'static) -> Self {
        Self {
            projects: IndexMap::new(),
            jobs: IndexMap::new(),
            project_jobs: HashMap::new(),
            instances: IndexMap::new(),
            progress: HashMap::new(),
            pending_spawn: HashSet::new(),
            pending_restart: HashSet::new(),
            pending_terminate: HashSet::new(),
            heartbeat_timers: HashMap::new(),
            broker: None,
            id_gen: Arc::new(id_gen),
        }
    }

    // === projects ===

    pub fn add_project(&mut self, project: Project) -> Result<(), StateError> {
        if self.projects.contains_key(&project.id) {
            return Err(StateError::ProjectExists(project.id));
        }
        self.project_jobs.insert(project.id.clone(), Vec::new());
        self.projects.insert(project.id.clone(), project);
        Ok(())
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn project_ids(&self) -> Vec<ProjectId> {
        self.projects.keys().cloned().collect()
    }

    /// Attach the output URI to a project, once.
    ///
    /// Re-binding the same URI is a no-op; a different URI is rejected.
    pub fn set_project_output(
        &mut self,
        id: &ProjectId,
        uri: S3Source,
    ) -> Result<(), StateError> {
        let project = self
            .projects
            .get_mut(id)
            .ok_or_else(|| StateError::UnknownProject(id.clone()))?;
        match &project.output_uri {
            None => {
                project.output_uri = Some(uri);
                Ok(())
            }
            Some(existing) if *existing == uri => Ok(()),
            Some(_) => Err(StateError::OutputAlreadyBound(id.clone())),
        }
    }

    /// Forget a project and everything hanging off it (failed-start cleanup).
    pub fn remove_project(&mut self, id: &ProjectId) {
        if let Some(job_ids) = self.project_jobs.remove(id) {
            for job_id in job_ids {
                self.jobs.shift_remove(&job_id);
                self.progress.remove(&job_id);
            }
        }
        self.projects.shift_remove(id);
    }

    // === jobs ===

    /// Persist partitioned jobs, assigning each a fresh id. Jobs start
    /// active and unbound.
    pub fn add_jobs(
        &mut self,
        project_id: &ProjectId,
        seeds: Vec<JobSeed>,
        epoch_ms: u64,
    ) -> Result<Vec<JobId>, StateError> {
        if !self.projects.contains_key(project_id) {
            return Err(StateError::UnknownProject(project_id.clone()));
        }

        let mut ids = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let id = JobId::new(self.id_gen.next());
            if self.jobs.contains_key(&id) {
                return Err(StateError::DuplicateJob(id));
            }
            self.jobs.insert(id.clone(), seed.into_job(id.clone(), epoch_ms));
            self.progress.insert(id.clone(), FrameSet::new());
            if let Some(index) = self.project_jobs.get_mut(project_id) {
                index.push(id.clone());
            }
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn job(&self, id: &JobId) -> Option<&RenderJob> {
        self.jobs.get(id)
    }

    pub fn bind_instance(
        &mut self,
        job_id: &JobId,
        instance_id: &InstanceId,
    ) -> Result<(), StateError> {
        if !self.instances.contains_key(instance_id) {
            return Err(StateError::UnknownInstance(instance_id.clone()));
        }
        let job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StateError::UnknownJob(job_id.clone()))?;
        job.instance_id = Some(instance_id.clone());
        Ok(())
    }

    pub fn bind_output_uri(
        &mut self,
        job_id: &JobId,
        uri: S3Source,
    ) -> Result<(), StateError> {
        let job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StateError::UnknownJob(job_id.clone()))?;
        job.output_uri = Some(uri);
        Ok(())
    }

    /// Deactivate a job. Idempotent; the job and its frame progress stay
    /// behind as history. There is no way back to active.
    pub fn deactivate_job(&mut self, job_id: &JobId) -> Result<(), StateError> {
        let job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StateError::UnknownJob(job_id.clone()))?;
        job.is_active = false;
        Ok(())
    }

    /// Active jobs currently bound to an instance (reverse index,
    /// computed on demand).
    pub fn active_jobs_of(&self, instance_id: &InstanceId) -> Vec<RenderJob> {
        self.jobs
            .values()
            .filter(|j| j.is_active && j.instance_id.as_ref() == Some(instance_id))
            .cloned()
            .collect()
    }

    pub fn all_jobs(&self, project_id: &ProjectId) -> Vec<RenderJob> {
        self.all_job_ids(project_id)
            .into_iter()
            .filter_map(|id| self.jobs.get(&id).cloned())
            .collect()
    }

    pub fn all_job_ids(&self, project_id: &ProjectId) -> Vec<JobId> {
        self.project_jobs
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    // === frame progress ===

    /// Record a confirmed frame. Returns true if newly recorded.
    ///
    /// Deactivated jobs still record: a worker superseded mid-recovery
    /// may deliver late frames and those count toward completion.
    pub fn record_frame(&mut self, job_id: &JobId, frame: i32) -> Result<bool, StateError> {
        let job = self
            .jobs
            .get(job_id)
            .ok_or_else(|| StateError::UnknownJob(job_id.clone()))?;
        if !job.range.contains(frame) {
            return Err(StateError::FrameOutOfRange {
                job_id: job_id.clone(),
                frame,
            });
        }
        Ok(self.progress.entry(job_id.clone()).or_default().insert(frame))
    }

    pub fn frames_rendered(&self, job_id: &JobId) -> FrameSet {
        self.progress.get(job_id).cloned().unwrap_or_default()
    }

    pub fn frame_count(&self, job_id: &JobId) -> usize {
        self.progress.get(job_id).map_or(0, FrameSet::len)
    }

    /// True iff the union of rendered frames across all jobs of the
    /// project (deactivated included) covers the project's range.
    pub fn is_project_complete(&self, project_id: &ProjectId) -> bool {
        let Some(project) = self.projects.get(project_id) else {
            return false;
        };
        let mut rendered = FrameSet::new();
        for job_id in self.all_job_ids(project_id) {
            if let Some(progress) = self.progress.get(&job_id) {
                rendered.extend(progress);
            }
        }
        rendered.covers(&project.range)
    }

    // === instances ===

    pub fn add_instance(&mut self, instance: RenderInstance) {
        self.instances.insert(instance.id.clone(), instance);
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&RenderInstance> {
        self.instances.get(id)
    }

    /// Instances hosting at least one active job of the project, with
    /// every active job on them (any project) fully rendered.
    pub fn instances_with_all_jobs_done(&self, project_id: &ProjectId) -> Vec<InstanceId> {
        let mut done = Vec::new();
        for instance_id in self.instances.keys() {
            let active: Vec<&RenderJob> = self
                .jobs
                .values()
                .filter(|j| j.is_active && j.instance_id.as_ref() == Some(instance_id))
                .collect();
            let hosts_project = active.iter().any(|j| j.project_id == *project_id);
            if !hosts_project {
                continue;
            }
            let all_done = active.iter().all(|j| {
                self.progress
                    .get(&j.id)
                    .is_some_and(|p| p.covers(&j.range))
            });
            if all_done {
                done.push(instance_id.clone());
            }
        }
        done
    }

    /// True while any live instance still hosts an active job of the
    /// project. Drives the sweep timer's stop condition.
    pub fn project_has_live_instances(&self, project_id: &ProjectId) -> bool {
        self.jobs.values().any(|j| {
            j.is_active
                && j.project_id == *project_id
                && j.instance_id
                    .as_ref()
                    .is_some_and(|id| self.instances.contains_key(id))
        })
    }

    /// Drop an instance and its monitoring state. Returns the heartbeat
    /// timer that must be cancelled, if one was armed. Also clears the
    /// pending-terminate entry so a later sweep can queue again.
    pub fn remove_instance(&mut self, id: &InstanceId) -> Option<TimerId> {
        self.instances.shift_remove(id);
        self.pending_terminate.remove(id);
        self.heartbeat_timers.remove(id)
    }

    // === pending-action queues ===

    /// Returns true iff no spawn is already in flight for this instance.
    pub fn try_queue_spawn(&mut self, id: &InstanceId) -> bool {
        self.pending_spawn.insert(id.clone())
    }

    pub fn dequeue_spawn(&mut self, id: &InstanceId) {
        self.pending_spawn.remove(id);
    }

    /// Returns true iff no restart is already in flight for this instance.
    pub fn try_queue_restart(&mut self, id: &InstanceId) -> bool {
        self.pending_restart.insert(id.clone())
    }

    pub fn dequeue_restart(&mut self, id: &InstanceId) {
        self.pending_restart.remove(id);
    }

    /// Queue instances for termination, returning only the newly added
    /// subset (ids already in flight are filtered out).
    pub fn try_queue_terminate(&mut self, ids: &[InstanceId]) -> Vec<InstanceId> {
        ids.iter()
            .filter(|id| self.pending_terminate.insert((*id).clone()))
            .cloned()
            .collect()
    }

    pub fn has_pending_spawn(&self, id: &InstanceId) -> bool {
        self.pending_spawn.contains(id)
    }

    pub fn has_pending_restart(&self, id: &InstanceId) -> bool {
        self.pending_restart.contains(id)
    }

    pub fn has_pending_terminate(&self, id: &InstanceId) -> bool {
        self.pending_terminate.contains(id)
    }

    // === heartbeat timers ===

    pub fn set_heartbeat_timer(
        &mut self,
        instance_id: &InstanceId,
        timer: TimerId,
    ) -> Result<(), StateError> {
        if !self.instances.contains_key(instance_id) {
            return Err(StateError::UnknownInstance(instance_id.clone()));
        }
        self.heartbeat_timers.insert(instance_id.clone(), timer);
        Ok(())
    }

    pub fn heartbeat_timer(&self, instance_id: &InstanceId) -> Option<&TimerId> {
        self.heartbeat_timers.get(instance_id)
    }

    // === broker singleton ===

    /// Set the broker coordinates, once per driver lifetime. A later
    /// START naming the same host is accepted; a different host fails.
    pub fn set_broker(&mut self, broker: BrokerAddress) -> Result<(), StateError> {
        match &self.broker {
            None => {
                self.broker = Some(broker);
                Ok(())
            }
            Some(current) if current.host == broker.host => Ok(()),
            Some(current) => Err(StateError::BrokerMismatch {
                current: current.host.clone(),
                requested: broker.host,
            }),
        }
    }

    pub fn broker(&self) -> Option<&BrokerAddress> {
        self.broker.as_ref()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
