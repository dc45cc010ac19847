// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drender_core::{Clock, FakeClock, InstanceId, ProjectId};

fn heartbeat(name: &str) -> TimerId {
    TimerId::heartbeat(&InstanceId::new(name))
}

#[test]
fn timer_lifecycle() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer(heartbeat("i-1"), Duration::from_secs(15), clock.now());
    assert!(scheduler.has_timers());
    assert!(scheduler.next_deadline().is_some());

    // Not yet
    clock.advance(Duration::from_secs(10));
    assert!(scheduler.fired_timers(clock.now()).is_empty());

    // Fires and is consumed
    clock.advance(Duration::from_secs(6));
    let events = scheduler.fired_timers(clock.now());
    assert_eq!(events.len(), 1);
    assert!(
        matches!(events[0], Event::TimerFired { ref id } if id == "heartbeat:i-1")
    );
    assert!(!scheduler.has_timers());
}

#[test]
fn cancel_is_idempotent() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer(heartbeat("i-1"), Duration::from_secs(15), clock.now());
    scheduler.cancel_timer("heartbeat:i-1");
    scheduler.cancel_timer("heartbeat:i-1");

    clock.advance(Duration::from_secs(20));
    assert!(scheduler.fired_timers(clock.now()).is_empty());
}

#[test]
fn fired_timers_removes_only_expired() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer(heartbeat("i-1"), Duration::from_secs(15), clock.now());
    scheduler.set_timer(
        TimerId::sweep(&ProjectId::new("p")),
        Duration::from_secs(10),
        clock.now(),
    );

    clock.advance(Duration::from_secs(11));
    let events = scheduler.fired_timers(clock.now());
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::TimerFired { ref id } if id == "sweep:p"));
    assert!(scheduler.has_timer("heartbeat:i-1"));
}

#[test]
fn rearm_replaces_deadline() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer(heartbeat("i-1"), Duration::from_secs(15), clock.now());
    clock.advance(Duration::from_secs(10));
    scheduler.set_timer(heartbeat("i-1"), Duration::from_secs(15), clock.now());

    clock.advance(Duration::from_secs(6));
    assert!(
        scheduler.fired_timers(clock.now()).is_empty(),
        "old deadline must not fire"
    );

    clock.advance(Duration::from_secs(10));
    assert_eq!(scheduler.fired_timers(clock.now()).len(), 1);
}

#[test]
fn next_deadline_is_earliest() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer(heartbeat("slow"), Duration::from_secs(30), clock.now());
    scheduler.set_timer(heartbeat("fast"), Duration::from_secs(10), clock.now());

    assert_eq!(
        scheduler.next_deadline(),
        Some(clock.now() + Duration::from_secs(10))
    );
}
