// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drender_adapters::{MachineCall, MachineError};
use drender_core::InstanceId;

fn instance_of(h: &Harness, id: &str) -> drender_core::RenderInstance {
    h.state
        .lock()
        .instance(&InstanceId::new(id))
        .cloned()
        .unwrap()
}

/// One job [1..10], frames {1,2,3,5} rendered, then the machine dies.
/// The restart succeeds, so the residual sub-jobs [4..4] and [6..10]
/// land back on the same machine.
#[tokio::test(start_paused = true)]
async fn restart_rebinds_residual_jobs_to_same_machine() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;
    let original = h.job_ids("movie")[0].clone();
    h.report_frames(&original, &[1, 2, 3, 5]).await;

    let failed = instance_of(&h, "i-1");
    h.send(Event::InstanceUnhealthy { instance: failed }).await;

    // Original job retired, its progress preserved
    {
        let state = h.state.lock();
        assert!(!state.job(&original).unwrap().is_active);
        assert_eq!(state.frame_count(&original), 4);
        assert!(!state.has_pending_restart(&InstanceId::new("i-1")));
    }

    // Residual sub-jobs cover exactly the unrendered runs, on i-1 again
    let jobs = h.job_ids("movie");
    assert_eq!(jobs.len(), 3);
    let state = h.state.lock();
    let residuals: Vec<_> = jobs[1..]
        .iter()
        .map(|id| state.job(id).unwrap().clone())
        .collect();
    assert_eq!(
        residuals
            .iter()
            .map(|j| (j.range.start, j.range.end))
            .collect::<Vec<_>>(),
        vec![(4, 4), (6, 10)]
    );
    for job in &residuals {
        assert!(job.is_active);
        assert_eq!(job.instance_id, Some(InstanceId::new("i-1")));
        assert!(job.output_uri.is_some(), "residuals inherit the output URI");
    }
    drop(state);

    assert!(h
        .machines
        .calls()
        .contains(&MachineCall::Restart {
            instance_id: InstanceId::new("i-1")
        }));
    assert!(h.has_timer("heartbeat:i-1"), "monitoring resumes");

    // Both residual jobs dispatched to the rebooted machine
    let dispatched: Vec<_> = h
        .dispatcher
        .calls()
        .iter()
        .skip(1) // initial START
        .map(|c| c.job_id.clone())
        .collect();
    assert_eq!(dispatched, jobs[1..].to_vec());
}

/// Restart fails, so the driver escalates: one replacement machine is
/// spawned and receives every residual sub-job; the dead machine is
/// handed to the terminator.
#[tokio::test(start_paused = true)]
async fn restart_failure_escalates_to_replacement() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;
    let original = h.job_ids("movie")[0].clone();
    h.report_frames(&original, &[1, 2, 3, 5]).await;
    h.machines
        .set_restart_error(MachineError::Api("no reboot".to_string()));

    let failed = instance_of(&h, "i-1");
    h.send(Event::InstanceUnhealthy { instance: failed }).await;

    let jobs = h.job_ids("movie");
    let state = h.state.lock();
    for id in &jobs[1..] {
        assert_eq!(
            state.job(id).unwrap().instance_id,
            Some(InstanceId::new("i-2")),
            "every residual job lands on the one replacement"
        );
    }
    assert!(!state.has_pending_spawn(&InstanceId::new("i-1")));
    assert!(!state.has_pending_restart(&InstanceId::new("i-1")));
    assert!(state.instance(&InstanceId::new("i-1")).is_none());
    drop(state);

    assert!(h.machines.calls().contains(&MachineCall::Terminate {
        instance_ids: vec![InstanceId::new("i-1")]
    }));
    assert!(h.has_timer("heartbeat:i-2"));
    assert!(!h.has_timer("heartbeat:i-1"));
}

/// Two unhealthy reports in quick succession issue exactly one restart.
#[tokio::test(start_paused = true)]
async fn duplicate_unhealthy_reports_issue_one_restart() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;

    let failed = instance_of(&h, "i-1");
    h.runtime
        .handle_event(Event::InstanceUnhealthy {
            instance: failed.clone(),
        })
        .await
        .unwrap();
    h.runtime
        .handle_event(Event::InstanceUnhealthy { instance: failed })
        .await
        .unwrap();
    h.pump().await;

    let restarts = h
        .machines
        .calls()
        .iter()
        .filter(|c| matches!(c, MachineCall::Restart { .. }))
        .count();
    assert_eq!(restarts, 1);
}

/// An unhealthy report while a restart is already pending is dropped by
/// the queue gate.
#[tokio::test(start_paused = true)]
async fn pending_restart_gates_new_attempts() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;
    h.state
        .lock()
        .try_queue_restart(&InstanceId::new("i-1"));

    let failed = instance_of(&h, "i-1");
    h.send(Event::InstanceUnhealthy { instance: failed }).await;

    assert!(h
        .machines
        .calls()
        .iter()
        .all(|c| !matches!(c, MachineCall::Restart { .. })));
    // Jobs untouched: the in-flight recovery owns them
    let jobs = h.job_ids("movie");
    assert_eq!(jobs.len(), 1);
    assert!(h.state.lock().job(&jobs[0]).unwrap().is_active);
}

/// A machine that dies after rendering everything it owns is just
/// reaped; no restart, no replacement.
#[tokio::test(start_paused = true)]
async fn unhealthy_with_no_unrendered_frames_reaps_machine() {
    let mut h = Harness::new();
    h.start("movie", 1, 4, 4).await;
    let job = h.job_ids("movie")[0].clone();
    h.report_frames(&job, &[1, 2, 3, 4]).await;

    let failed = instance_of(&h, "i-1");
    h.send(Event::InstanceUnhealthy { instance: failed }).await;

    assert_eq!(h.job_ids("movie").len(), 1, "no residual jobs created");
    assert!(h.machines.calls().contains(&MachineCall::Terminate {
        instance_ids: vec![InstanceId::new("i-1")]
    }));
    assert!(h
        .machines
        .calls()
        .iter()
        .all(|c| !matches!(c, MachineCall::Restart { .. })));
}

/// KILL_MACHINE skips the restart leg entirely.
#[tokio::test(start_paused = true)]
async fn kill_machine_forces_replacement() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;
    let original = h.job_ids("movie")[0].clone();
    h.report_frames(&original, &[1, 2]).await;

    h.send(Event::InstanceKill {
        instance_id: InstanceId::new("i-1"),
    })
    .await;

    assert!(h
        .machines
        .calls()
        .iter()
        .all(|c| !matches!(c, MachineCall::Restart { .. })));
    assert!(h.machines.calls().contains(&MachineCall::Terminate {
        instance_ids: vec![InstanceId::new("i-1")]
    }));

    let jobs = h.job_ids("movie");
    let state = h.state.lock();
    assert_eq!(
        state.job(&jobs[1]).unwrap().instance_id,
        Some(InstanceId::new("i-2"))
    );
}

/// Replacement spawn failure leaves the pending entry (no second spawn
/// races the cloud) and the residual jobs unassigned but visible.
#[tokio::test(start_paused = true)]
async fn replacement_failure_leaves_jobs_unassigned() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;
    let original = h.job_ids("movie")[0].clone();
    h.report_frames(&original, &[1]).await;
    h.machines
        .set_restart_error(MachineError::Api("no reboot".to_string()));
    h.machines
        .set_spawn_error(MachineError::Api("no capacity".to_string()));

    let failed = instance_of(&h, "i-1");
    h.send(Event::InstanceUnhealthy { instance: failed }).await;

    let state = h.state.lock();
    assert!(state.has_pending_spawn(&InstanceId::new("i-1")));
    let jobs = state.all_jobs(&ProjectId::new("movie"));
    let residual = jobs.iter().find(|j| j.is_active).unwrap();
    assert_eq!(residual.instance_id, None);
    assert_eq!(residual.range.start, 2);
}

/// A stale healthy report for a transitioned instance must not re-arm
/// its heartbeat.
#[tokio::test(start_paused = true)]
async fn stale_healthy_report_does_not_rearm() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;
    let failed = instance_of(&h, "i-1");

    // Recovery is underway; the instance is out of the store.
    h.runtime
        .handle_event(Event::InstanceUnhealthy {
            instance: failed.clone(),
        })
        .await
        .unwrap();
    assert!(!h.has_timer("heartbeat:i-1"));

    h.runtime
        .handle_event(Event::InstanceHealthy { instance: failed })
        .await
        .unwrap();
    assert!(!h.has_timer("heartbeat:i-1"));
    h.pump().await;
}

/// HEARTBEAT_CHECK probes immediately; a healthy worker re-arms the
/// regular cadence.
#[tokio::test(start_paused = true)]
async fn heartbeat_check_probes_now() {
    let mut h = Harness::new();
    h.start("movie", 1, 10, 10).await;

    h.send(Event::InstanceCheck {
        instance_id: InstanceId::new("i-1"),
    })
    .await;

    assert_eq!(h.probe.probed(), vec![InstanceId::new("i-1")]);
    assert!(h.has_timer("heartbeat:i-1"));
}
