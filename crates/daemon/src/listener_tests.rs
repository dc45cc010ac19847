// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{InstanceHeartbeat, JobFrameMsg, ProjectRequest};
use drender_adapters::{
    ChannelFrameFeed, FakeHealthProbe, FakeJobDispatcher, FakeMachineProvider,
    FakeStorageProvider, FrameFeed,
};
use drender_core::test_support::instance;
use drender_core::{FakeClock, ProjectId, S3Source, SequentialIdGen, SoftwareTag};
use drender_engine::{RuntimeConfig, RuntimeDeps};
use drender_state::StateStore;
use parking_lot::Mutex;

type TestCtx = ListenCtx<
    FakeMachineProvider,
    FakeStorageProvider,
    FakeHealthProbe,
    FakeJobDispatcher,
    FakeClock,
>;

fn ctx() -> (TestCtx, crate::event_bus::EventReader, ChannelFrameFeed) {
    let (event_bus, event_reader) = EventBus::new(16);
    let (frames, feed) = ChannelFrameFeed::new(16);
    let state = Arc::new(Mutex::new(StateStore::with_id_gen(SequentialIdGen::new(
        "job",
    ))));
    let mut config = RuntimeConfig::default();
    config
        .ami_catalog
        .insert("blender".to_string(), "ami-blender".to_string());
    let runtime = Runtime::new(
        RuntimeDeps {
            machines: FakeMachineProvider::new(),
            storage: FakeStorageProvider::new(),
            probe: FakeHealthProbe::new(),
            dispatcher: FakeJobDispatcher::new(),
            state,
        },
        FakeClock::new(),
        config,
        event_bus.sender(),
    );
    (
        ListenCtx {
            runtime: Arc::new(runtime),
            event_bus,
            frames,
            shutdown: Arc::new(Notify::new()),
        },
        event_reader,
        feed,
    )
}

fn start_request(id: &str) -> Request {
    Request::Project {
        request: ProjectRequest {
            id: ProjectId::new(id),
            source: Some(S3Source::new("scenes", format!("{id}.blend"))),
            start_frame: 1,
            end_frame: 4,
            frames_per_machine: 2,
            software: Some(SoftwareTag::new("blender")),
            public_ip: "10.0.0.1".to_string(),
            action: ProjectAction::Start,
        },
    }
}

#[tokio::test]
async fn ping_pongs() {
    let (ctx, _events, _feed) = ctx();
    assert_eq!(handle_request(Request::Ping, &ctx).await, Response::Pong);
}

#[tokio::test(start_paused = true)]
async fn start_answers_with_running_fleet() {
    let (ctx, _events, _feed) = ctx();
    let response = handle_request(start_request("castle"), &ctx).await;

    let Response::Project { response } = response else {
        panic!("expected project response, got {response:?}");
    };
    assert_eq!(response.id, "castle");
    assert_eq!(response.log.jobs.len(), 2);
    assert!(!response.is_complete);
    assert!(response.output_uri.is_some());
}

#[tokio::test(start_paused = true)]
async fn start_without_source_is_an_error() {
    let (ctx, _events, _feed) = ctx();
    let request = Request::Project {
        request: ProjectRequest {
            id: ProjectId::new("castle"),
            source: None,
            start_frame: 1,
            end_frame: 4,
            frames_per_machine: 2,
            software: Some(SoftwareTag::new("blender")),
            public_ip: "10.0.0.1".to_string(),
            action: ProjectAction::Start,
        },
    };
    assert!(matches!(
        handle_request(request, &ctx).await,
        Response::Error { .. }
    ));
}

#[tokio::test]
async fn status_of_unknown_project_is_empty() {
    let (ctx, _events, _feed) = ctx();
    let request = Request::Project {
        request: ProjectRequest {
            id: ProjectId::new("ghost"),
            source: None,
            start_frame: 0,
            end_frame: 0,
            frames_per_machine: 0,
            software: None,
            public_ip: String::new(),
            action: ProjectAction::Status,
        },
    };
    let Response::Project { response } = handle_request(request, &ctx).await else {
        panic!("expected project response");
    };
    assert_eq!(response, ProjectResponse::empty(ProjectId::new("ghost")));
}

#[tokio::test]
async fn heartbeat_actions_map_to_events() {
    let (ctx, mut events, _feed) = ctx();

    let request = Request::Heartbeat {
        heartbeat: InstanceHeartbeat {
            instance: instance("i-1"),
            action: HeartbeatAction::StartNewMachine,
        },
    };
    assert_eq!(handle_request(request, &ctx).await, Response::Ok);
    assert!(matches!(
        events.recv().await,
        Some(Event::InstanceReplace { .. })
    ));

    let request = Request::Heartbeat {
        heartbeat: InstanceHeartbeat {
            instance: instance("i-2"),
            action: HeartbeatAction::KillMachine,
        },
    };
    handle_request(request, &ctx).await;
    assert!(matches!(
        events.recv().await,
        Some(Event::InstanceKill { instance_id }) if instance_id == "i-2"
    ));
}

#[tokio::test]
async fn frame_messages_reach_the_feed() {
    let (ctx, _events, mut feed) = ctx();

    let request = Request::Frame {
        frame: JobFrameMsg {
            job_id: drender_core::JobId::new("j-1"),
            last_frame_rendered: 3,
            output_uri: None,
            frames_rendered: vec![1, 2],
        },
    };
    assert_eq!(handle_request(request, &ctx).await, Response::Ok);

    let record = feed.next().await.unwrap();
    assert_eq!(record.frames(), vec![1, 2, 3]);
}

#[tokio::test]
async fn shutdown_notifies_the_loop() {
    let (ctx, _events, _feed) = ctx();
    let notified = ctx.shutdown.clone();
    let waiter = tokio::spawn(async move { notified.notified().await });

    assert_eq!(
        handle_request(Request::Shutdown, &ctx).await,
        Response::ShuttingDown
    );
    waiter.await.unwrap();
}
