// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod frames;
mod recovery;
mod start;
mod sweep;

use crate::runtime::{Runtime, RuntimeConfig, RuntimeDeps};
use drender_adapters::{
    FakeHealthProbe, FakeJobDispatcher, FakeMachineProvider, FakeStorageProvider,
};
use drender_core::test_support::project_spec;
use drender_core::{
    Event, FakeClock, FrameRecord, JobId, ProjectId, SequentialIdGen, TimerId,
};
use drender_state::StateStore;
use std::sync::Arc;
use std::time::Duration;

use crate::status::ProjectStatus;
use parking_lot::Mutex;
use tokio::sync::mpsc;

pub(crate) type TestRuntime =
    Runtime<FakeMachineProvider, FakeStorageProvider, FakeHealthProbe, FakeJobDispatcher, FakeClock>;

/// Runtime over fakes with a captive completion-event channel. Tests
/// inject events directly and `pump` the loop until quiet.
pub(crate) struct Harness {
    pub runtime: TestRuntime,
    pub machines: FakeMachineProvider,
    pub storage: FakeStorageProvider,
    pub probe: FakeHealthProbe,
    pub dispatcher: FakeJobDispatcher,
    pub clock: FakeClock,
    pub state: Arc<Mutex<StateStore>>,
    rx: mpsc::Receiver<Event>,
}

impl Harness {
    pub fn new() -> Self {
        let machines = FakeMachineProvider::new();
        let storage = FakeStorageProvider::new();
        let probe = FakeHealthProbe::new();
        let dispatcher = FakeJobDispatcher::new();
        let clock = FakeClock::new();
        let state = Arc::new(Mutex::new(StateStore::with_id_gen(SequentialIdGen::new(
            "job",
        ))));
        let (event_tx, rx) = mpsc::channel(64);

        let mut config = RuntimeConfig::default();
        config
            .ami_catalog
            .insert("blender".to_string(), "ami-blender".to_string());

        let runtime = Runtime::new(
            RuntimeDeps {
                machines: machines.clone(),
                storage: storage.clone(),
                probe: probe.clone(),
                dispatcher: dispatcher.clone(),
                state: Arc::clone(&state),
            },
            clock.clone(),
            config,
            event_tx,
        );

        Self {
            runtime,
            machines,
            storage,
            probe,
            dispatcher,
            clock,
            state,
            rx,
        }
    }

    /// Start a project and expect success.
    pub async fn start(&self, id: &str, start: i32, end: i32, fpm: u32) -> ProjectStatus {
        self.runtime
            .start_project(project_spec(id, start, end, fpm))
            .await
            .unwrap()
    }

    /// Feed completion events from spawned tasks back into the runtime
    /// until the loop goes quiet.
    pub async fn pump(&mut self) {
        loop {
            match tokio::time::timeout(Duration::from_millis(250), self.rx.recv()).await {
                Ok(Some(event)) => {
                    self.runtime.handle_event(event).await.unwrap();
                }
                _ => break,
            }
        }
    }

    /// Inject one event and pump the fallout.
    pub async fn send(&mut self, event: Event) {
        self.runtime.handle_event(event).await.unwrap();
        self.pump().await;
    }

    /// Report frames for a job as the broker would, with the batch
    /// field carrying everything but the last frame.
    pub async fn report_frames(&mut self, job_id: &JobId, frames: &[i32]) {
        let (last, batch) = match frames.split_last() {
            Some((last, batch)) => (*last, batch.to_vec()),
            None => return,
        };
        self.send(Event::FrameReported {
            record: FrameRecord {
                job_id: job_id.clone(),
                last_frame_rendered: last,
                output_uri: None,
                frames_rendered: batch,
            },
        })
        .await;
    }

    /// Render every frame of a job.
    pub async fn render_job(&mut self, job_id: &JobId) {
        let range = self
            .state
            .lock()
            .job(job_id)
            .map(|j| j.range)
            .unwrap();
        let frames: Vec<i32> = range.frames().collect();
        self.report_frames(job_id, &frames).await;
    }

    /// Fire the sweep timer for a project, consuming the scheduler
    /// entry the way a real firing does.
    pub async fn sweep(&mut self, project: &str) {
        let id = TimerId::sweep(&ProjectId::new(project));
        self.runtime.scheduler().lock().cancel_timer(id.as_str());
        self.send(Event::TimerFired { id }).await;
    }

    pub fn job_ids(&self, project: &str) -> Vec<JobId> {
        self.state.lock().all_job_ids(&ProjectId::new(project))
    }

    pub fn has_timer(&self, id: &str) -> bool {
        self.runtime.scheduler().lock().has_timer(id)
    }
}
