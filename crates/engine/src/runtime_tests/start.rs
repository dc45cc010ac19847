// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::RuntimeError;
use drender_adapters::{MachineCall, MachineError, StorageError};
use drender_core::InstanceId;
use drender_state::StateError;

#[tokio::test(start_paused = true)]
async fn happy_start_binds_fleet_pairwise() {
    let mut h = Harness::new();
    let status = h.start("castle", 1, 5, 2).await;

    assert_eq!(status.jobs.len(), 3);
    let ranges: Vec<(i32, i32)> = status
        .jobs
        .iter()
        .map(|j| (j.start_frame, j.end_frame))
        .collect();
    assert_eq!(ranges, vec![(1, 2), (3, 4), (5, 5)]);
    assert!(status.jobs.iter().all(|j| j.is_active));
    assert!(!status.is_complete);

    // One machine per job, bound by index
    let bound: Vec<String> = status
        .jobs
        .iter()
        .map(|j| j.instance.as_ref().unwrap().id.to_string())
        .collect();
    assert_eq!(bound, vec!["i-1", "i-2", "i-3"]);

    // Output URI attached to the project and every job
    assert_eq!(status.output_uri.unwrap().key, "castle/output/");
    let job_ids = h.job_ids("castle");
    {
        let state = h.state.lock();
        for id in &job_ids {
            assert!(state.job(id).unwrap().output_uri.is_some());
        }
    }

    // Exactly one bulk spawn
    assert_eq!(
        h.machines.calls(),
        vec![MachineCall::Spawn {
            cloud_ami: "ami-blender".to_string(),
            count: 3
        }]
    );

    // Heartbeats and the sweeper are armed
    assert!(h.has_timer("heartbeat:i-1"));
    assert!(h.has_timer("heartbeat:i-2"));
    assert!(h.has_timer("heartbeat:i-3"));
    assert!(h.has_timer("sweep:castle"));

    // Every job dispatched to its machine
    h.pump().await;
    let dispatches = h.dispatcher.calls();
    assert_eq!(dispatches.len(), 3);
    assert_eq!(dispatches[0].instance_id, InstanceId::new("i-1"));
    assert_eq!(dispatches[2].instance_id, InstanceId::new("i-3"));
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_rejected() {
    let h = Harness::new();
    h.start("castle", 1, 5, 2).await;

    let err = h
        .runtime
        .start_project(project_spec("castle", 1, 5, 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::State(StateError::ProjectExists(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn unknown_software_rejected() {
    let h = Harness::new();
    let mut spec = project_spec("castle", 1, 5, 2);
    spec.software = drender_core::SoftwareTag::new("houdini");

    let err = h.runtime.start_project(spec).await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownSoftware(_)));
    assert!(h.machines.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_spec_rejected_before_any_provisioning() {
    let h = Harness::new();
    let mut spec = project_spec("castle", 10, 1, 2);
    spec.frames_per_machine = 0;

    let err = h.runtime.start_project(spec).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Spec(_)));
    assert!(h.machines.calls().is_empty());
    assert!(h.storage.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_project_with_other_broker_host_rejected() {
    let h = Harness::new();
    h.start("castle", 1, 5, 2).await;

    let mut spec = project_spec("forest", 1, 3, 1);
    spec.public_ip = "10.9.9.9".to_string();
    let err = h.runtime.start_project(spec).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::State(StateError::BrokerMismatch { .. })
    ));
    assert!(h.runtime.project_status(&ProjectId::new("forest")).is_none());
}

#[tokio::test(start_paused = true)]
async fn second_project_reuses_broker_and_runs() {
    let h = Harness::new();
    h.start("castle", 1, 5, 2).await;
    let status = h.start("forest", 1, 3, 3).await;
    assert_eq!(status.jobs.len(), 1);
    assert_eq!(
        status.jobs[0].instance.as_ref().unwrap().id,
        InstanceId::new("i-4")
    );
}

#[tokio::test(start_paused = true)]
async fn spawn_failure_fails_start_and_forgets_project() {
    let h = Harness::new();
    h.machines
        .set_spawn_error(MachineError::Api("quota exceeded".to_string()));

    let err = h
        .runtime
        .start_project(project_spec("castle", 1, 5, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Start(_)));

    // The id is free for a retry
    assert!(h.runtime.project_status(&ProjectId::new("castle")).is_none());
    let status = h.start("castle", 1, 5, 2).await;
    assert_eq!(status.jobs.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn bucket_failure_reaps_spawned_fleet() {
    let mut h = Harness::new();
    h.storage
        .set_bucket_error(StorageError::Api("denied".to_string()));

    let err = h
        .runtime
        .start_project(project_spec("castle", 1, 5, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Start(_)));
    h.pump().await;

    let calls = h.machines.calls();
    assert!(calls.contains(&MachineCall::Terminate {
        instance_ids: vec![
            InstanceId::new("i-1"),
            InstanceId::new("i-2"),
            InstanceId::new("i-3"),
        ],
    }));
    assert!(h.runtime.project_status(&ProjectId::new("castle")).is_none());
}

#[tokio::test(start_paused = true)]
async fn status_of_unknown_project_is_none() {
    let h = Harness::new();
    assert!(h.runtime.project_status(&ProjectId::new("ghost")).is_none());
}
