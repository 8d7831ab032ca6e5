#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A navigation source fired (history hook, popstate, host event, mutation).
    Navigation(crate::NavigationReason),
    /// A debounce timer armed by `Effect::ArmDebounce` ran to completion.
    DebounceElapsed { task: crate::TaskId },
    /// Entry gate evaluated after the debounce window settled.
    AttemptRequested {
        reason: crate::NavigationReason,
        url: String,
        enabled: bool,
    },
    /// The readiness poll found a video element.
    VideoReady { attempt: crate::AttemptId },
    /// The readiness poll gave up.
    VideoMissing { attempt: crate::AttemptId },
    /// One of the three reset triggers fired; `enabled` was read just before.
    TriggerFired {
        attempt: crate::AttemptId,
        trigger: crate::Trigger,
        enabled: bool,
    },
    /// Playback position was set to zero.
    SeekApplied {
        attempt: crate::AttemptId,
        trigger: crate::Trigger,
    },
    /// Setting the playback position failed.
    SeekFailed {
        attempt: crate::AttemptId,
        trigger: crate::Trigger,
        error: String,
    },
    /// The persisted enabled flag changed.
    EnabledChanged {
        old: Option<bool>,
        new: Option<bool>,
        current_url: String,
    },
}
