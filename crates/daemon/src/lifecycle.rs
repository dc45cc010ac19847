// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, the driver loop, shutdown.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use drender_adapters::{
    ChannelFrameFeed, FrameFeed, FrameFeedHandle, HealthProbe, HttpHealthProbe,
    HttpJobDispatcher, HttpMachineProvider, HttpStorageProvider, JobDispatcher, MachineProvider,
    StorageProvider,
};
use drender_core::{Clock, Event, SystemClock};
use drender_engine::{Runtime, RuntimeDeps};
use drender_state::StateStore;
use fs2::FileExt;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{error, info};

use crate::config::Config;
use crate::event_bus::{EventBus, EventReader};

/// Driver runtime with the concrete wire adapters.
pub type DaemonRuntime = Runtime<
    HttpMachineProvider,
    HttpStorageProvider,
    HttpHealthProbe,
    HttpJobDispatcher,
    SystemClock,
>;

/// Poll cadence of the loop when no timer is armed.
const IDLE_TICK: Duration = Duration::from_secs(1);

/// Errors during daemon lifecycle
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another daemon already holds {0}")]
    LockFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): held to maintain the exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub runtime: Arc<DaemonRuntime>,
    pub event_bus: EventBus,
}

/// Result of daemon startup.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The control socket, to be wrapped in a Listener task
    pub listener: UnixListener,
    /// Event reader for the driver loop
    pub event_reader: EventReader,
    /// Producer handle for the frame feed (given to the listener)
    pub frame_handle: FrameFeedHandle,
    /// The frame feed the driver loop consumes
    pub frame_feed: ChannelFrameFeed,
}

/// Bring the daemon up: lock, socket, adapters, runtime.
pub fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Single-process authority: take the pid-file lock or bail.
    // Truncation waits until the lock is held so a losing second daemon
    // cannot clobber the winner's pid.
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed(config.lock_path.display().to_string()))?;
    lock_file.set_len(0)?;
    write!(lock_file, "{}", std::process::id())?;

    // A stale socket from a crashed daemon would block the bind.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)?;

    let (event_bus, event_reader) = EventBus::new(256);
    let (frame_handle, frame_feed) = ChannelFrameFeed::new(256);

    let settings = &config.settings;
    let runtime = Runtime::new(
        RuntimeDeps {
            machines: HttpMachineProvider::new(settings.cloud.resource_url.clone()),
            storage: HttpStorageProvider::new(settings.cloud.storage_url.clone()),
            probe: HttpHealthProbe::with_port(settings.cloud.worker_port),
            dispatcher: HttpJobDispatcher::new(settings.cloud.worker_port),
            state: Arc::new(Mutex::new(StateStore::new())),
        },
        SystemClock,
        settings.runtime_config(),
        event_bus.sender(),
    );

    info!(
        socket = %config.socket_path.display(),
        "daemon state initialized"
    );

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            runtime: Arc::new(runtime),
            event_bus,
        },
        listener,
        event_reader,
        frame_handle,
        frame_feed,
    })
}

impl DaemonState {
    /// Shutdown the daemon gracefully.
    ///
    /// In-flight projects are lost by design; workers keep rendering and
    /// a restarted driver starts from an empty store.
    pub fn shutdown(&mut self) {
        info!("shutting down daemon");
        let _ = std::fs::remove_file(&self.config.socket_path);
        let _ = std::fs::remove_file(&self.config.lock_path);
    }
}

/// The driver loop: events, frame records, and timer ticks, one at a
/// time on this task. All state mutation happens here.
pub async fn run_driver_loop<M, S, P, D, C, F>(
    runtime: Arc<Runtime<M, S, P, D, C>>,
    event_bus: EventBus,
    mut events: EventReader,
    mut feed: F,
    shutdown: Arc<Notify>,
) where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
    F: FrameFeed,
{
    let scheduler = runtime.scheduler();
    let mut feed_open = true;

    loop {
        let deadline = scheduler.lock().next_deadline();
        let timer_tick = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                None => tokio::time::sleep(IDLE_TICK).await,
            }
        };

        tokio::select! {
            _ = shutdown.notified() => break,

            maybe_event = events.recv() => match maybe_event {
                Some(event) => dispatch(&runtime, &event_bus, event).await,
                None => break,
            },

            record = feed.next(), if feed_open => match record {
                Some(record) => {
                    dispatch(&runtime, &event_bus, Event::FrameReported { record }).await
                }
                None => {
                    info!("frame feed closed");
                    feed_open = false;
                }
            },

            _ = timer_tick => {
                let now = runtime.clock().now();
                let fired = scheduler.lock().fired_timers(now);
                for event in fired {
                    dispatch(&runtime, &event_bus, event).await;
                }
            }
        }
    }
}

async fn dispatch<M, S, P, D, C>(
    runtime: &Runtime<M, S, P, D, C>,
    event_bus: &EventBus,
    event: Event,
) where
    M: MachineProvider,
    S: StorageProvider,
    P: HealthProbe,
    D: JobDispatcher,
    C: Clock,
{
    match runtime.handle_event(event).await {
        Ok(follow_ups) => {
            for event in follow_ups {
                event_bus.send(event).await;
            }
        }
        Err(e) => error!(error = %e, "event handling failed"),
    }
}
