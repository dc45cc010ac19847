// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drender_adapters::StorageCall;
use drender_core::S3Source;

#[tokio::test(start_paused = true)]
async fn verified_frame_is_recorded() {
    let mut h = Harness::new();
    h.start("castle", 1, 10, 10).await;
    let job = h.job_ids("castle")[0].clone();

    h.report_frames(&job, &[1]).await;

    assert_eq!(h.state.lock().frame_count(&job), 1);
    // The check went against the job's bound output prefix
    assert!(h.storage.calls().contains(&StorageCall::Exists {
        source: S3Source::output_prefix("drender-output", "castle"),
    }));
}

#[tokio::test(start_paused = true)]
async fn worker_reported_uri_takes_precedence() {
    let mut h = Harness::new();
    h.start("castle", 1, 10, 10).await;
    let job = h.job_ids("castle")[0].clone();
    let reported = S3Source::new("drender-output", "castle/output/frame-0007.exr");

    h.send(Event::FrameReported {
        record: FrameRecord {
            job_id: job.clone(),
            last_frame_rendered: 7,
            output_uri: Some(reported.clone()),
            frames_rendered: vec![],
        },
    })
    .await;

    assert!(h
        .storage
        .calls()
        .contains(&StorageCall::Exists { source: reported }));
    assert_eq!(h.state.lock().frame_count(&job), 1);
}

#[tokio::test(start_paused = true)]
async fn storage_miss_leaves_store_unchanged() {
    let mut h = Harness::new();
    h.start("castle", 1, 10, 10).await;
    let job = h.job_ids("castle")[0].clone();
    h.storage
        .mark_missing(S3Source::output_prefix("drender-output", "castle"));

    h.report_frames(&job, &[7]).await;

    assert_eq!(h.state.lock().frame_count(&job), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_reports_are_absorbed() {
    let mut h = Harness::new();
    h.start("castle", 1, 10, 10).await;
    let job = h.job_ids("castle")[0].clone();

    h.report_frames(&job, &[3]).await;
    h.report_frames(&job, &[3]).await;

    assert_eq!(h.state.lock().frame_count(&job), 1);
}

#[tokio::test(start_paused = true)]
async fn batched_frames_all_count() {
    let mut h = Harness::new();
    h.start("castle", 1, 10, 10).await;
    let job = h.job_ids("castle")[0].clone();

    h.report_frames(&job, &[1, 2, 3, 5]).await;

    let state = h.state.lock();
    assert_eq!(state.frame_count(&job), 4);
    let rendered = state.frames_rendered(&job);
    assert!(rendered.contains(5));
    assert!(!rendered.contains(4));
}

/// A frame for a job that was deactivated mid-recovery still counts
/// toward project completion.
#[tokio::test(start_paused = true)]
async fn stale_frame_for_deactivated_job_counts() {
    let mut h = Harness::new();
    h.start("castle", 1, 2, 2).await;
    let job = h.job_ids("castle")[0].clone();
    h.report_frames(&job, &[1]).await;
    h.state.lock().deactivate_job(&job).unwrap();

    h.report_frames(&job, &[2]).await;

    let state = h.state.lock();
    assert_eq!(state.frame_count(&job), 2);
    assert!(state.is_project_complete(&ProjectId::new("castle")));
}

#[tokio::test(start_paused = true)]
async fn report_for_unknown_job_is_dropped() {
    let mut h = Harness::new();
    h.start("castle", 1, 10, 10).await;

    h.report_frames(&JobId::new("ghost"), &[1]).await;

    assert!(
        h.storage
            .calls()
            .iter()
            .all(|c| !matches!(c, StorageCall::Exists { .. })),
        "no existence check issued"
    );
}

#[tokio::test(start_paused = true)]
async fn out_of_range_frame_is_rejected() {
    let mut h = Harness::new();
    h.start("castle", 1, 10, 10).await;
    let job = h.job_ids("castle")[0].clone();

    h.report_frames(&job, &[99]).await;

    assert_eq!(h.state.lock().frame_count(&job), 0);
}
