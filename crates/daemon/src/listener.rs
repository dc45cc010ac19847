// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the control socket.
//!
//! Runs in a spawned task, accepting connections and handling them
//! without blocking the driver loop. Control messages become events on
//! the bus; project START/STATUS are answered synchronously.

use std::sync::Arc;

use drender_adapters::{
    FrameFeedHandle, HealthProbe, JobDispatcher, MachineProvider, StorageProvider,
};
use drender_core::{Clock, Event};
use drender_engine::Runtime;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::event_bus::EventBus;
use crate::protocol::{
    HeartbeatAction, ProjectAction, ProjectResponse, Request, Response,
};
use crate::protocol_wire::{self, ProtocolError, DEFAULT_TIMEOUT};

/// Shared daemon context for all request handlers.
pub struct ListenCtx<M, S, P, D, C: Clock> {
    pub runtime: Arc<Runtime<M, S, P, D, C>>,
    pub event_bus: EventBus,
    pub frames: FrameFeedHandle,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<M, S, P, D, C: Clock> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<M, S, P, D, C>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl<M, S, P, D, C> Listener<M, S, P, D, C>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock + 'static,
{
    /// Create a new listener.
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx<M, S, P, D, C>>) -> Self {
        Self { socket, ctx }
    }

    /// Run the listener loop, spawning a task per connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
                                    debug!("client disconnected")
                                }
                                ConnectionError::Protocol(ProtocolError::Timeout) => {
                                    warn!("connection timeout")
                                }
                                _ => error!("connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection<M, S, P, D, C>(
    stream: UnixStream,
    ctx: &ListenCtx<M, S, P, D, C>,
) -> Result<(), ConnectionError>
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol_wire::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    debug!(request = ?request, "received request");

    let response = handle_request(request, ctx).await;
    protocol_wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;

    Ok(())
}

/// Handle a single request and build its response.
pub async fn handle_request<M, S, P, D, C>(
    request: Request,
    ctx: &ListenCtx<M, S, P, D, C>,
) -> Response
where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    match request {
        Request::Ping => Response::Pong,

        Request::Project { request } => match request.action {
            ProjectAction::Start => {
                let id = request.id.clone();
                let Some(spec) = request.into_spec() else {
                    return Response::Error {
                        message: format!("START for '{id}' is missing source or software"),
                    };
                };
                match ctx.runtime.start_project(spec).await {
                    Ok(status) => Response::Project {
                        response: status.into(),
                    },
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
            ProjectAction::Status => {
                let response = ctx
                    .runtime
                    .project_status(&request.id)
                    .map(ProjectResponse::from)
                    .unwrap_or_else(|| ProjectResponse::empty(request.id));
                Response::Project { response }
            }
        },

        Request::Heartbeat { heartbeat } => {
            let event = match heartbeat.action {
                HeartbeatAction::StartNewMachine => Event::InstanceReplace {
                    instance: heartbeat.instance,
                },
                HeartbeatAction::RestartMachine => Event::InstanceUnhealthy {
                    instance: heartbeat.instance,
                },
                HeartbeatAction::KillMachine => Event::InstanceKill {
                    instance_id: heartbeat.instance.id,
                },
                HeartbeatAction::HeartbeatCheck => Event::InstanceCheck {
                    instance_id: heartbeat.instance.id,
                },
            };
            ctx.event_bus.send(event).await;
            Response::Ok
        }

        Request::Frame { frame } => {
            ctx.frames.publish(frame.into()).await;
            Response::Ok
        }

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
