// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn spawn_request_wire_shape() {
    let request = InstanceRequest::SpawnMachines {
        cloud_ami: "ami-blender".to_string(),
        count: 3,
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["action"], "SPAWN_MACHINES");
    assert_eq!(json["cloudAMI"], "ami-blender");
    assert_eq!(json["count"], 3);
}

#[test]
fn terminate_request_carries_instance_ids() {
    let request = InstanceRequest::TerminateMachines {
        instances: vec![InstanceId::new("i-1"), InstanceId::new("i-2")],
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["action"], "TERMINATE_MACHINES");
    assert_eq!(json["instances"], serde_json::json!(["i-1", "i-2"]));
}

#[test]
fn response_instances_optional() {
    let response: InstanceResponse =
        serde_json::from_str(r#"{"message":"restarted"}"#).unwrap();
    assert_eq!(response.message, "restarted");
    assert!(response.instances.is_none());

    let response: InstanceResponse = serde_json::from_str(
        r#"{"message":"ok","instances":[{"id":"i-1","public_ip":"1.2.3.4","cloud_ami":"ami-x","state":"running"}]}"#,
    )
    .unwrap();
    let instances = response.instances.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].id, "i-1");
}

#[tokio::test]
async fn fake_provider_spawns_sequential_instances() {
    let provider = FakeMachineProvider::new();
    let first = provider.spawn("ami-x", 2).await.unwrap();
    let second = provider.spawn("ami-x", 1).await.unwrap();

    assert_eq!(first[0].id, "i-1");
    assert_eq!(first[1].id, "i-2");
    assert_eq!(second[0].id, "i-3");
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn fake_provider_scripted_errors_fire_once() {
    let provider = FakeMachineProvider::new();
    provider.set_restart_error(MachineError::Timeout);

    assert!(provider.restart(&InstanceId::new("i-1")).await.is_err());
    assert!(provider.restart(&InstanceId::new("i-1")).await.is_ok());
}
