// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn instance() -> RenderInstance {
    RenderInstance::new("i-1", "1.2.3.4", "ami-blender")
}

#[test]
fn serializes_with_type_tag() {
    let event = Event::InstanceUnhealthy {
        instance: instance(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "instance:unhealthy");
    assert_eq!(json["instance"]["id"], "i-1");
}

#[test]
fn timer_event_roundtrip() {
    let event = Event::TimerFired {
        id: TimerId::heartbeat(&InstanceId::new("i-9")),
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn replacement_event_carries_residual_jobs() {
    let event = Event::ReplacementReady {
        replaces: InstanceId::new("i-old"),
        instance: instance(),
        job_ids: vec![JobId::new("j-1"), JobId::new("j-2")],
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "machine:replaced");
    assert_eq!(json["replaces"], "i-old");
    assert_eq!(json["job_ids"].as_array().unwrap().len(), 2);
}

#[test]
fn log_summaries_name_the_subject() {
    let event = Event::FrameReported {
        record: FrameRecord {
            job_id: JobId::new("j-7"),
            last_frame_rendered: 42,
            output_uri: None,
            frames_rendered: vec![],
        },
    };
    assert_eq!(event.log_summary(), "frame:reported job=j-7 frame=42");

    let event = Event::MachinesTerminated {
        instance_ids: vec![InstanceId::new("a"), InstanceId::new("b")],
    };
    assert_eq!(event.log_summary(), "machines:terminated n=2");
}
