use crate::{AttemptId, NavigationReason, TaskId, Trigger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the debounce timer; reply with `Msg::DebounceElapsed`.
    ArmDebounce { task: TaskId },
    /// Abort a debounce timer that has not fired yet.
    CancelDebounce { task: TaskId },
    /// Read the enabled flag and current URL; reply with `Msg::AttemptRequested`.
    EvaluateEntry { reason: NavigationReason },
    /// Poll for the video element; reply with `Msg::VideoReady` or `Msg::VideoMissing`.
    WaitForVideo { attempt: AttemptId },
    /// Fire the immediate trigger and subscribe the two media-event triggers.
    ArmTriggers { attempt: AttemptId },
    /// Set the playback position to zero; reply with `Msg::SeekApplied` or `Msg::SeekFailed`.
    SeekToStart { attempt: AttemptId, trigger: Trigger },
    /// Show the confirmation notice.
    ShowNotice { attempt: AttemptId },
    /// Drop the video handle and any listeners still held for the attempt.
    ReleaseAttempt { attempt: AttemptId },
}
