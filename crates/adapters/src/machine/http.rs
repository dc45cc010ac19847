// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the resource service.

use super::{InstanceRequest, InstanceResponse, MachineError, MachineProvider};
use async_trait::async_trait;
use drender_core::{InstanceId, RenderInstance};

/// Machine provider speaking `InstanceRequest` JSON to a resource
/// service endpoint.
#[derive(Clone)]
pub struct HttpMachineProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMachineProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, request: &InstanceRequest) -> Result<InstanceResponse, MachineError> {
        let url = format!("{}/instances", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| MachineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MachineError::Api(format!(
                "resource service returned {}",
                response.status()
            )));
        }

        response
            .json::<InstanceResponse>()
            .await
            .map_err(|e| MachineError::Transport(e.to_string()))
    }
}

#[async_trait]
impl MachineProvider for HttpMachineProvider {
    async fn spawn(&self, cloud_ami: &str, count: u32) -> Result<Vec<RenderInstance>, MachineError> {
        let response = self
            .send(&InstanceRequest::SpawnMachines {
                cloud_ami: cloud_ami.to_string(),
                count,
            })
            .await?;

        let instances = response
            .instances
            .ok_or_else(|| MachineError::Api(response.message.clone()))?;
        if instances.len() != count as usize {
            return Err(MachineError::Shortfall {
                requested: count,
                returned: instances.len(),
            });
        }
        Ok(instances)
    }

    async fn restart(&self, instance_id: &InstanceId) -> Result<(), MachineError> {
        self.send(&InstanceRequest::RestartMachines {
            instances: vec![instance_id.clone()],
        })
        .await
        .map(|_| ())
    }

    async fn terminate(&self, instance_ids: &[InstanceId]) -> Result<(), MachineError> {
        self.send(&InstanceRequest::TerminateMachines {
            instances: instance_ids.to_vec(),
        })
        .await
        .map(|_| ())
    }
}
