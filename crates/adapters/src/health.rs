// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker liveness probing.

use async_trait::async_trait;
use drender_core::RenderInstance;
use thiserror::Error;

/// Port workers expose their status endpoint on.
pub const NODE_STATUS_PORT: u16 = 8080;

/// Errors from a liveness probe
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe request failed: {0}")]
    Unreachable(String),

    #[error("worker returned status {0}")]
    BadStatus(u16),
}

/// Liveness probe invoked by the heartbeat scheduler.
///
/// The probe reports only healthy/unhealthy; the driver decides what
/// recovery action follows.
#[async_trait]
pub trait HealthProbe: Clone + Send + Sync + 'static {
    async fn probe(&self, instance: &RenderInstance) -> Result<(), ProbeError>;
}

/// Probe via `GET /nodeStatus` on the worker's public IP.
#[derive(Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
    port: u16,
}

impl HttpHealthProbe {
    pub fn new() -> Self {
        Self::with_port(NODE_STATUS_PORT)
    }

    pub fn with_port(port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            port,
        }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, instance: &RenderInstance) -> Result<(), ProbeError> {
        let url = format!("http://{}:{}/nodeStatus", instance.public_ip, self.port);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProbeError::BadStatus(response.status().as_u16()))
        }
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHealthProbe;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use drender_core::InstanceId;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Fake probe: healthy by default, instances can be marked down.
    #[derive(Clone, Default)]
    pub struct FakeHealthProbe {
        down: Arc<Mutex<HashSet<InstanceId>>>,
        probes: Arc<Mutex<Vec<InstanceId>>>,
    }

    impl FakeHealthProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn mark_down(&self, id: &InstanceId) {
            self.down.lock().insert(id.clone());
        }

        pub fn mark_up(&self, id: &InstanceId) {
            self.down.lock().remove(id);
        }

        /// Instances probed so far, in order.
        pub fn probed(&self) -> Vec<InstanceId> {
            self.probes.lock().clone()
        }
    }

    #[async_trait]
    impl HealthProbe for FakeHealthProbe {
        async fn probe(&self, instance: &RenderInstance) -> Result<(), ProbeError> {
            self.probes.lock().push(instance.id.clone());
            if self.down.lock().contains(&instance.id) {
                Err(ProbeError::Unreachable("marked down".to_string()))
            } else {
                Ok(())
            }
        }
    }
}
