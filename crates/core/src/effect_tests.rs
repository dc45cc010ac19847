// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn names_are_stable() {
    let effect = Effect::TerminateMachines {
        instance_ids: vec![],
    };
    assert_eq!(effect.name(), "terminate_machines");

    let effect = Effect::CancelTimer {
        id: TimerId::new("t"),
    };
    assert_eq!(effect.name(), "cancel_timer");
}

#[test]
fn fields_cover_the_interesting_bits() {
    let effect = Effect::SpawnReplacement {
        cloud_ami: "ami-blender".to_string(),
        replaces: InstanceId::new("i-dead"),
        job_ids: vec![JobId::new("a"), JobId::new("b")],
    };
    let fields: HashMap<_, _> = effect.fields().into_iter().collect();
    assert_eq!(fields["cloud_ami"], "ami-blender");
    assert_eq!(fields["replaces"], "i-dead");
    assert_eq!(fields["jobs"], "2");
}

#[test]
fn set_timer_roundtrips_duration_as_millis() {
    let effect = Effect::SetTimer {
        id: TimerId::new("heartbeat:i-1"),
        duration: Duration::from_secs(15),
    };
    let json = serde_json::to_value(&effect).unwrap();
    assert_eq!(json["SetTimer"]["duration"], 15_000);

    let back: Effect = serde_json::from_value(json).unwrap();
    assert_eq!(back, effect);
}
