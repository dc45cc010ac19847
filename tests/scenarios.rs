// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end driver scenarios over fake providers.
//!
//! Each test plays a full project lifecycle against the runtime with a
//! captive event channel standing in for the daemon loop.

use std::sync::Arc;
use std::time::Duration;

use drender_adapters::{
    FakeHealthProbe, FakeJobDispatcher, FakeMachineProvider, FakeStorageProvider, MachineCall,
};
use drender_core::test_support::project_spec;
use drender_core::{
    Event, FakeClock, FrameRecord, InstanceId, JobId, ProjectId, S3Source, SequentialIdGen,
    TimerId,
};
use drender_engine::{Runtime, RuntimeConfig, RuntimeDeps};
use drender_state::StateStore;
use parking_lot::Mutex;
use tokio::sync::mpsc;

type TestRuntime =
    Runtime<FakeMachineProvider, FakeStorageProvider, FakeHealthProbe, FakeJobDispatcher, FakeClock>;

struct Driver {
    runtime: TestRuntime,
    machines: FakeMachineProvider,
    storage: FakeStorageProvider,
    state: Arc<Mutex<StateStore>>,
    rx: mpsc::Receiver<Event>,
}

impl Driver {
    fn new() -> Self {
        let machines = FakeMachineProvider::new();
        let storage = FakeStorageProvider::new();
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
                probe: FakeHealthProbe::new(),
                dispatcher: FakeJobDispatcher::new(),
                state: Arc::clone(&state),
            },
            FakeClock::new(),
            config,
            event_tx,
        );

        Self {
            runtime,
            machines,
            storage,
            state,
            rx,
        }
    }

    /// Drive completion events back through the loop until quiet.
    async fn pump(&mut self) {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(250), self.rx.recv()).await
        {
            self.runtime.handle_event(event).await.unwrap();
        }
    }

    async fn send(&mut self, event: Event) {
        self.runtime.handle_event(event).await.unwrap();
        self.pump().await;
    }

    async fn report_frame(&mut self, job_id: &JobId, frame: i32) {
        self.send(Event::FrameReported {
            record: FrameRecord {
                job_id: job_id.clone(),
                last_frame_rendered: frame,
                output_uri: None,
                frames_rendered: vec![],
            },
        })
        .await;
    }

    fn job_ids(&self, project: &str) -> Vec<JobId> {
        self.state.lock().all_job_ids(&ProjectId::new(project))
    }

    fn instance(&self, id: &str) -> drender_core::RenderInstance {
        self.state
            .lock()
            .instance(&InstanceId::new(id))
            .cloned()
            .unwrap()
    }

    fn is_complete(&self, project: &str) -> bool {
        self.state
            .lock()
            .is_project_complete(&ProjectId::new(project))
    }
}

/// Scenario 1: three machines render [1..2], [3..4], [5..5]; the
/// sweeper reaps all of them and the store ends with no instances.
#[tokio::test(start_paused = true)]
async fn happy_path_project_runs_to_completion() {
    let mut d = Driver::new();
    let status = d
        .runtime
        .start_project(project_spec("happy", 1, 5, 2))
        .await
        .unwrap();
    assert_eq!(status.jobs.len(), 3);

    let jobs = d.job_ids("happy");
    d.report_frame(&jobs[0], 1).await;
    d.report_frame(&jobs[0], 2).await;
    d.report_frame(&jobs[1], 3).await;
    d.report_frame(&jobs[1], 4).await;
    assert!(!d.is_complete("happy"));
    d.report_frame(&jobs[2], 5).await;
    assert!(d.is_complete("happy"));

    d.send(Event::TimerFired {
        id: TimerId::sweep(&ProjectId::new("happy")),
    })
    .await;

    let state = d.state.lock();
    for n in 1..=3 {
        assert!(state.instance(&InstanceId::new(format!("i-{n}"))).is_none());
    }
    drop(state);

    let status = d
        .runtime
        .project_status(&ProjectId::new("happy"))
        .unwrap();
    assert!(status.is_complete);
    assert_eq!(status.jobs.iter().map(|j| j.frames_rendered).sum::<usize>(), 5);
}

/// Scenario 2: one job [1..10] crashes after frames {1,2,3,5}; the
/// residual sub-jobs [4..4] and [6..10] land on one replacement and the
/// project still completes.
#[tokio::test(start_paused = true)]
async fn mid_job_crash_recovers_via_replacement() {
    let mut d = Driver::new();
    d.runtime
        .start_project(project_spec("crash", 1, 10, 10))
        .await
        .unwrap();
    let original = d.job_ids("crash")[0].clone();
    for frame in [1, 2, 3, 5] {
        d.report_frame(&original, frame).await;
    }

    // Restart is refused, forcing the replacement path.
    d.machines
        .set_restart_error(drender_adapters::MachineError::Timeout);
    let failed = d.instance("i-1");
    d.send(Event::InstanceUnhealthy { instance: failed }).await;

    let jobs = d.job_ids("crash");
    assert_eq!(jobs.len(), 3);
    {
        let state = d.state.lock();
        let ranges: Vec<(i32, i32)> = jobs[1..]
            .iter()
            .map(|id| {
                let job = state.job(id).unwrap();
                (job.range.start, job.range.end)
            })
            .collect();
        assert_eq!(ranges, vec![(4, 4), (6, 10)]);
        for id in &jobs[1..] {
            assert_eq!(
                state.job(id).unwrap().instance_id,
                Some(InstanceId::new("i-2"))
            );
        }
    }

    // The replacement renders the rest.
    d.report_frame(&jobs[1], 4).await;
    for frame in 6..=10 {
        d.report_frame(&jobs[2], frame).await;
    }
    assert!(d.is_complete("crash"));
}

/// Scenario 3: duplicate unhealthy reports issue exactly one restart.
#[tokio::test(start_paused = true)]
async fn duplicate_failure_reports_recover_once() {
    let mut d = Driver::new();
    d.runtime
        .start_project(project_spec("dup", 1, 10, 10))
        .await
        .unwrap();

    let failed = d.instance("i-1");
    d.runtime
        .handle_event(Event::InstanceUnhealthy {
            instance: failed.clone(),
        })
        .await
        .unwrap();
    d.runtime
        .handle_event(Event::InstanceUnhealthy { instance: failed })
        .await
        .unwrap();
    d.pump().await;

    let restarts = d
        .machines
        .calls()
        .iter()
        .filter(|c| matches!(c, MachineCall::Restart { .. }))
        .count();
    assert_eq!(restarts, 1);
}

/// Scenario 4: a frame notification for a deactivated job still counts
/// toward completion.
#[tokio::test(start_paused = true)]
async fn stale_frame_notification_counts() {
    let mut d = Driver::new();
    d.runtime
        .start_project(project_spec("stale", 1, 2, 2))
        .await
        .unwrap();
    let job = d.job_ids("stale")[0].clone();
    d.report_frame(&job, 1).await;

    d.state.lock().deactivate_job(&job).unwrap();
    d.report_frame(&job, 2).await;

    assert!(d.is_complete("stale"));
}

/// Scenario 5: the store stays untouched when the object store denies
/// a reported frame.
#[tokio::test(start_paused = true)]
async fn storage_miss_discards_report() {
    let mut d = Driver::new();
    d.runtime
        .start_project(project_spec("miss", 1, 10, 10))
        .await
        .unwrap();
    let job = d.job_ids("miss")[0].clone();
    d.storage
        .mark_missing(S3Source::output_prefix("drender-output", "miss"));

    d.report_frame(&job, 7).await;

    assert_eq!(d.state.lock().frame_count(&job), 0);
}

/// Scenario 6: rendered set {1,3,5,7,9} over [1..10] leaves five
/// single-frame residual sub-jobs.
#[tokio::test(start_paused = true)]
async fn non_contiguous_progress_fragments_residuals() {
    let mut d = Driver::new();
    d.runtime
        .start_project(project_spec("frag", 1, 10, 10))
        .await
        .unwrap();
    let original = d.job_ids("frag")[0].clone();
    for frame in [1, 3, 5, 7, 9] {
        d.report_frame(&original, frame).await;
    }

    let failed = d.instance("i-1");
    d.send(Event::InstanceUnhealthy { instance: failed }).await;

    let jobs = d.job_ids("frag");
    let state = d.state.lock();
    let ranges: Vec<(i32, i32)> = jobs[1..]
        .iter()
        .map(|id| {
            let job = state.job(id).unwrap();
            (job.range.start, job.range.end)
        })
        .collect();
    assert_eq!(
        ranges,
        vec![(2, 2), (4, 4), (6, 6), (8, 8), (10, 10)]
    );
}
