// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn address_defaults() {
    let addr = BrokerAddress::new("10.1.2.3");
    assert_eq!(addr.port, 5672);
    assert_eq!(addr.queue, "drender.driver.frames");
    assert_eq!(addr.to_string(), "amqp://10.1.2.3:5672/drender.driver.frames");
}

#[test]
fn address_deserializes_with_defaults() {
    let addr: BrokerAddress = serde_json::from_str(r#"{"host":"broker.local"}"#).unwrap();
    assert_eq!(addr, BrokerAddress::new("broker.local"));
}

#[test]
fn record_frames_includes_last_frame_once() {
    let record = FrameRecord {
        job_id: JobId::new("j1"),
        last_frame_rendered: 5,
        output_uri: None,
        frames_rendered: vec![3, 4, 5],
    };
    assert_eq!(record.frames(), vec![3, 4, 5]);

    let record = FrameRecord {
        frames_rendered: vec![3, 4],
        ..record
    };
    assert_eq!(record.frames(), vec![3, 4, 5]);
}

#[test]
fn record_tolerates_missing_optional_fields() {
    let record: FrameRecord =
        serde_json::from_str(r#"{"job_id":"j1","last_frame_rendered":9}"#).unwrap();
    assert_eq!(record.frames(), vec![9]);
    assert_eq!(record.output_uri, None);
}
