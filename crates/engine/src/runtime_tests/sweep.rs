// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drender_adapters::MachineCall;
use drender_core::InstanceId;

/// The full happy path: three machines render their chunks, the
/// sweeper reaps all three, and the store ends up with no instances.
#[tokio::test(start_paused = true)]
async fn completed_instances_are_reaped() {
    let mut h = Harness::new();
    h.start("castle", 1, 5, 2).await;
    for job in h.job_ids("castle") {
        h.render_job(&job).await;
    }

    h.sweep("castle").await;

    {
        let state = h.state.lock();
        assert!(state.is_project_complete(&ProjectId::new("castle")));
        for n in 1..=3 {
            let id = InstanceId::new(format!("i-{n}"));
            assert!(state.instance(&id).is_none(), "i-{n} should be reaped");
            assert!(!state.has_pending_terminate(&id));
        }
    }
    assert!(!h.has_timer("heartbeat:i-1"));
    assert!(!h.has_timer("heartbeat:i-2"));
    assert!(!h.has_timer("heartbeat:i-3"));

    let terminated: Vec<_> = h
        .machines
        .calls()
        .into_iter()
        .filter(|c| matches!(c, MachineCall::Terminate { .. }))
        .collect();
    assert_eq!(
        terminated,
        vec![MachineCall::Terminate {
            instance_ids: vec![
                InstanceId::new("i-1"),
                InstanceId::new("i-2"),
                InstanceId::new("i-3"),
            ],
        }]
    );

    // The next sweep finds nothing left and stops re-arming
    h.sweep("castle").await;
    assert!(!h.has_timer("sweep:castle"));
}

#[tokio::test(start_paused = true)]
async fn sweep_rearms_while_work_remains() {
    let mut h = Harness::new();
    h.start("castle", 1, 5, 2).await;
    let jobs = h.job_ids("castle");
    h.render_job(&jobs[0]).await;

    h.sweep("castle").await;

    // Only the finished machine goes; the sweeper keeps ticking
    assert!(h.has_timer("sweep:castle"));
    let state = h.state.lock();
    assert!(state.instance(&InstanceId::new("i-1")).is_none());
    assert!(state.instance(&InstanceId::new("i-2")).is_some());
    assert!(!state.is_project_complete(&ProjectId::new("castle")));
}

/// Two sweeps while the first termination is still in flight must not
/// double-issue.
#[tokio::test(start_paused = true)]
async fn inflight_termination_is_not_reissued() {
    let mut h = Harness::new();
    h.start("castle", 1, 2, 2).await;
    let job = h.job_ids("castle")[0].clone();
    h.render_job(&job).await;

    // Tick twice without letting completion events through
    h.runtime
        .handle_event(Event::TimerFired {
            id: TimerId::sweep(&ProjectId::new("castle")),
        })
        .await
        .unwrap();
    h.runtime
        .handle_event(Event::TimerFired {
            id: TimerId::sweep(&ProjectId::new("castle")),
        })
        .await
        .unwrap();
    h.pump().await;

    let terminations = h
        .machines
        .calls()
        .iter()
        .filter(|c| matches!(c, MachineCall::Terminate { .. }))
        .count();
    assert_eq!(terminations, 1);
}

#[tokio::test(start_paused = true)]
async fn sweep_for_unknown_project_is_inert() {
    let mut h = Harness::new();
    h.sweep("ghost").await;
    assert!(h.machines.calls().is_empty());
    assert!(!h.has_timer("sweep:ghost"));
}

/// A heartbeat tick for a reaped instance must not probe.
#[tokio::test(start_paused = true)]
async fn heartbeat_tick_after_reap_is_inert() {
    let mut h = Harness::new();
    h.start("castle", 1, 2, 2).await;
    let job = h.job_ids("castle")[0].clone();
    h.render_job(&job).await;
    h.sweep("castle").await;

    h.send(Event::TimerFired {
        id: TimerId::heartbeat(&InstanceId::new("i-1")),
    })
    .await;

    assert!(h.probe.probed().is_empty());
}
