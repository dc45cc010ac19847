// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame reconciliation: verify the object landed, then record.

use super::Runtime;
use crate::error::RuntimeError;
use drender_adapters::{HealthProbe, JobDispatcher, MachineProvider, StorageProvider};
use drender_core::{Clock, Effect, Event, FrameRecord, JobId, S3Source};
use drender_state::StateError;

impl<M, S, P, D, C> Runtime<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    /// A worker reported rendered frames. Kick off the existence check;
    /// nothing is recorded until the object store confirms.
    pub(crate) async fn handle_frame_reported(
        &self,
        record: FrameRecord,
    ) -> Result<Vec<Event>, RuntimeError> {
        let job = self.lock_state(|state| state.job(&record.job_id).cloned());
        let Some(job) = job else {
            tracing::warn!(job_id = %record.job_id, "frame report for unknown job, dropping");
            return Ok(Vec::new());
        };

        // Prefer the URI the worker reported; fall back to the job's
        // bound output prefix.
        let Some(uri) = record.output_uri.clone().or_else(|| job.output_uri.clone()) else {
            tracing::warn!(job_id = %job.id, "frame report without output URI, dropping");
            return Ok(Vec::new());
        };

        self.run_effects(vec![Effect::VerifyFrame {
            job_id: job.id,
            frames: record.frames(),
            uri,
        }])
        .await;
        Ok(Vec::new())
    }

    /// Existence check finished. A miss drops the update (the worker
    /// retries the notification); a hit records every confirmed frame.
    /// Frames may arrive out of order and for deactivated jobs; both
    /// are fine.
    pub(crate) async fn handle_frame_verified(
        &self,
        job_id: JobId,
        frames: Vec<i32>,
        uri: S3Source,
        exists: bool,
    ) -> Result<Vec<Event>, RuntimeError> {
        if !exists {
            tracing::warn!(%job_id, %uri, "reported frame missing from store, dropping");
            return Ok(Vec::new());
        }

        self.lock_state_mut(|state| {
            for frame in frames {
                match state.record_frame(&job_id, frame) {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(%job_id, frame, "duplicate frame absorbed")
                    }
                    Err(e @ StateError::FrameOutOfRange { .. }) => {
                        tracing::warn!(%job_id, frame, error = %e, "frame rejected")
                    }
                    Err(e) => tracing::warn!(%job_id, frame, error = %e, "frame dropped"),
                }
            }
        });
        Ok(Vec::new())
    }
}
