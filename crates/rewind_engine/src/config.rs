use std::time::Duration;

use rewind_core::WatchUrlRule;

use crate::signals::SignalSources;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet period that coalesces a burst of navigation signals.
    pub debounce: Duration,
    pub poll_interval: Duration,
    /// Hard ceiling on waiting for the video element; no retry afterwards.
    pub video_timeout: Duration,
    /// Used until the stored notice duration has been read.
    pub notice_duration: Duration,
    pub notice_message: String,
    pub notice_id: String,
    pub sources: SignalSources,
    pub watch_rule: WatchUrlRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            poll_interval: Duration::from_millis(100),
            video_timeout: Duration::from_millis(10_000),
            notice_duration: Duration::from_millis(2000),
            notice_message: "Playback reset to the start".to_string(),
            notice_id: "ytr-toast".to_string(),
            sources: SignalSources::default(),
            watch_rule: WatchUrlRule::default(),
        }
    }
}
