use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::page::{Page, VideoElement};

/// Polls `page` for a video element until one appears or `timeout` elapses.
///
/// Checks once immediately, then after every `poll_interval`. `None` means the
/// page never produced a video in time; callers treat it as a no-op.
pub async fn wait_for_video(
    page: &dyn Page,
    poll_interval: Duration,
    timeout: Duration,
) -> Option<Arc<dyn VideoElement>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(video) = page.query_video() {
            return Some(video);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}
