// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use drender_core::JobId;

fn record(frame: i32) -> FrameRecord {
    FrameRecord {
        job_id: JobId::new("j-1"),
        last_frame_rendered: frame,
        output_uri: None,
        frames_rendered: vec![],
    }
}

#[tokio::test]
async fn records_flow_in_order() {
    let (handle, mut feed) = ChannelFrameFeed::new(8);
    handle.publish(record(1)).await;
    handle.publish(record(2)).await;

    assert_eq!(feed.next().await.unwrap().last_frame_rendered, 1);
    assert_eq!(feed.next().await.unwrap().last_frame_rendered, 2);
}

#[tokio::test]
async fn feed_closes_when_all_handles_drop() {
    let (handle, mut feed) = ChannelFrameFeed::new(1);
    drop(handle);
    assert!(feed.next().await.is_none());
}
