// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn seed() -> JobSeed {
    JobSeed {
        project_id: ProjectId::new("castle"),
        range: FrameRange::new(1, 10),
        source: S3Source::new("scenes", "castle.blend"),
        output_uri: Some(S3Source::output_prefix("out", "castle")),
        broker: BrokerAddress::new("10.0.0.1"),
    }
}

#[test]
fn seed_becomes_active_unbound_job() {
    let job = seed().into_job(JobId::new("j-1"), 99);
    assert!(job.is_active);
    assert_eq!(job.instance_id, None);
    assert_eq!(job.range, FrameRange::new(1, 10));
    assert_eq!(job.created_at_ms, 99);
}

#[test]
fn seed_inherits_parent_fields() {
    let s = seed();
    let job = s.clone().into_job(JobId::new("j-2"), 0);
    assert_eq!(job.source, s.source);
    assert_eq!(job.output_uri, s.output_uri);
    assert_eq!(job.broker, s.broker);
    assert_eq!(job.project_id, s.project_id);
}

#[test]
fn job_serde_omits_unset_optionals() {
    let job = JobSeed {
        output_uri: None,
        ..seed()
    }
    .into_job(JobId::new("j-3"), 0);
    let json = serde_json::to_value(&job).unwrap();
    assert!(json.get("output_uri").is_none());
    assert!(json.get("instance_id").is_none());
}
