// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dispatch to workers (the JobManager seam).

use async_trait::async_trait;
use drender_core::{RenderInstance, RenderJob};
use thiserror::Error;

/// Errors from dispatching a job to a worker
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("worker unreachable: {0}")]
    Unreachable(String),

    #[error("worker rejected job: {0}")]
    Rejected(String),
}

/// Sends START messages to the worker on an instance.
///
/// A freshly spawned or rebooted machine may not be serving yet when
/// the driver dispatches; implementations retry internally until the
/// worker accepts or the attempt is hopeless.
#[async_trait]
pub trait JobDispatcher: Clone + Send + Sync + 'static {
    async fn start_job(
        &self,
        job: &RenderJob,
        instance: &RenderInstance,
    ) -> Result<(), DispatchError>;
}

/// Dispatcher posting the job to the worker's control endpoint.
#[derive(Clone)]
pub struct HttpJobDispatcher {
    client: reqwest::Client,
    port: u16,
}

impl HttpJobDispatcher {
    pub fn new(port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            port,
        }
    }
}

#[async_trait]
impl JobDispatcher for HttpJobDispatcher {
    async fn start_job(
        &self,
        job: &RenderJob,
        instance: &RenderInstance,
    ) -> Result<(), DispatchError> {
        let url = format!("http://{}:{}/startJob", instance.public_ip, self.port);
        let response = self
            .client
            .post(&url)
            .json(job)
            .send()
            .await
            .map_err(|e| DispatchError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DispatchError::Rejected(format!(
                "status {}",
                response.status()
            )))
        }
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DispatchCall, FakeJobDispatcher};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use drender_core::{InstanceId, JobId};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded dispatch
    #[derive(Debug, Clone, PartialEq)]
    pub struct DispatchCall {
        pub job_id: JobId,
        pub instance_id: InstanceId,
    }

    /// Fake dispatcher recording every START.
    #[derive(Clone, Default)]
    pub struct FakeJobDispatcher {
        calls: Arc<Mutex<Vec<DispatchCall>>>,
    }

    impl FakeJobDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<DispatchCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl JobDispatcher for FakeJobDispatcher {
        async fn start_job(
            &self,
            job: &RenderJob,
            instance: &RenderInstance,
        ) -> Result<(), DispatchError> {
            self.calls.lock().push(DispatchCall {
                job_id: job.id.clone(),
                instance_id: instance.id.clone(),
            });
            Ok(())
        }
    }
}
