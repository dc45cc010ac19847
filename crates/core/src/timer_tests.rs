// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn heartbeat_timer_roundtrip() {
    let id = TimerId::heartbeat(&InstanceId::new("i-0abc"));
    assert_eq!(id.as_str(), "heartbeat:i-0abc");
    assert_eq!(id.heartbeat_instance(), Some(InstanceId::new("i-0abc")));
    assert_eq!(id.sweep_project(), None);
}

#[test]
fn sweep_timer_roundtrip() {
    let id = TimerId::sweep(&ProjectId::new("castle"));
    assert_eq!(id.as_str(), "sweep:castle");
    assert_eq!(id.sweep_project(), Some(ProjectId::new("castle")));
    assert_eq!(id.heartbeat_instance(), None);
}

#[test]
fn foreign_timer_parses_to_neither() {
    let id = TimerId::new("cooldown:x");
    assert_eq!(id.heartbeat_instance(), None);
    assert_eq!(id.sweep_project(), None);
}
