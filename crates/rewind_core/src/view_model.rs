use crate::{AttemptId, TaskId};

/// Diagnostic snapshot of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerView {
    pub generation: u64,
    pub handled_url: Option<String>,
    pub pending_task: Option<TaskId>,
    pub active_attempt: Option<AttemptView>,
    pub resets_applied: u64,
    pub notices_shown: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptView {
    pub id: AttemptId,
    pub url: String,
    pub generation: u64,
    pub waiting_for_video: bool,
    pub notice_shown: bool,
}
