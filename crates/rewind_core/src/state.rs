use std::collections::BTreeSet;
use std::fmt;

use crate::view_model::{AttemptView, SchedulerView};
use crate::{NavigationReason, WatchUrlRule};

pub type TaskId = u64;
pub type AttemptId = u64;

/// Counter value captured by in-flight work; advanced on every enabled-flag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationGuard {
    current: Generation,
}

impl GenerationGuard {
    pub fn snapshot(&self) -> Generation {
        self.current
    }

    /// True once the guard advanced past `snapshot`.
    pub fn is_stale(&self, snapshot: Generation) -> bool {
        self.current != snapshot
    }

    pub fn advance(&mut self) -> Generation {
        self.current = Generation(self.current.0 + 1);
        self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTask {
    pub task: TaskId,
    pub reason: NavigationReason,
}

/// Holds at most one debounced task; a newer schedule replaces the older one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DebounceSlot {
    pending: Option<PendingTask>,
    last_task: TaskId,
}

impl DebounceSlot {
    /// Returns the superseded task (if any) and the new task id.
    pub fn schedule(&mut self, reason: NavigationReason) -> (Option<TaskId>, TaskId) {
        let cancelled = self.cancel();
        self.last_task += 1;
        let task = self.last_task;
        self.pending = Some(PendingTask { task, reason });
        (cancelled, task)
    }

    pub fn cancel(&mut self) -> Option<TaskId> {
        self.pending.take().map(|pending| pending.task)
    }

    /// Consumes the pending task if `task` is still the current one.
    pub fn fire(&mut self, task: TaskId) -> Option<NavigationReason> {
        match self.pending {
            Some(pending) if pending.task == task => {
                self.pending = None;
                Some(pending.reason)
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<PendingTask> {
        self.pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Trigger {
    Immediate,
    LoadedMetadata,
    Playing,
}

impl Trigger {
    pub const ALL: [Trigger; 3] = [Trigger::Immediate, Trigger::LoadedMetadata, Trigger::Playing];

    pub fn label(self) -> &'static str {
        match self {
            Trigger::Immediate => "immediate",
            Trigger::LoadedMetadata => "loadedmetadata",
            Trigger::Playing => "playing",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptPhase {
    WaitingForVideo,
    Armed { unresolved: BTreeSet<Trigger> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub id: AttemptId,
    pub url: String,
    pub generation: Generation,
    pub phase: AttemptPhase,
    /// Idempotency latch for the confirmation notice.
    pub notice_shown: bool,
}

impl Attempt {
    fn new(id: AttemptId, url: String, generation: Generation) -> Self {
        Self {
            id,
            url,
            generation,
            phase: AttemptPhase::WaitingForVideo,
            notice_shown: false,
        }
    }

    /// All triggers have reported back.
    pub fn is_settled(&self) -> bool {
        matches!(&self.phase, AttemptPhase::Armed { unresolved } if unresolved.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResetState {
    rule: WatchUrlRule,
    guard: GenerationGuard,
    debounce: DebounceSlot,
    handled_url: Option<String>,
    attempt: Option<Attempt>,
    last_attempt: AttemptId,
    resets_applied: u64,
    notices_shown: u64,
}

impl ResetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(rule: WatchUrlRule) -> Self {
        Self {
            rule,
            ..Self::default()
        }
    }

    pub fn view(&self) -> SchedulerView {
        SchedulerView {
            generation: self.guard.snapshot().value(),
            handled_url: self.handled_url.clone(),
            pending_task: self.debounce.pending().map(|pending| pending.task),
            active_attempt: self.attempt.as_ref().map(|attempt| AttemptView {
                id: attempt.id,
                url: attempt.url.clone(),
                generation: attempt.generation.value(),
                waiting_for_video: attempt.phase == AttemptPhase::WaitingForVideo,
                notice_shown: attempt.notice_shown,
            }),
            resets_applied: self.resets_applied,
            notices_shown: self.notices_shown,
        }
    }

    pub fn generation(&self) -> Generation {
        self.guard.snapshot()
    }

    pub fn handled_url(&self) -> Option<&str> {
        self.handled_url.as_deref()
    }

    pub fn active_attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    pub fn is_watch_url(&self, url: &str) -> bool {
        self.rule.matches(url)
    }

    pub(crate) fn guard(&self) -> &GenerationGuard {
        &self.guard
    }

    pub(crate) fn guard_mut(&mut self) -> &mut GenerationGuard {
        &mut self.guard
    }

    pub(crate) fn debounce_mut(&mut self) -> &mut DebounceSlot {
        &mut self.debounce
    }

    pub(crate) fn mark_handled(&mut self, url: String) {
        self.handled_url = Some(url);
    }

    /// Starts a new attempt for `url`, returning the one it replaced.
    pub(crate) fn begin_attempt(&mut self, url: String) -> (AttemptId, Option<Attempt>) {
        self.last_attempt += 1;
        let id = self.last_attempt;
        let generation = self.guard.snapshot();
        let previous = self.attempt.replace(Attempt::new(id, url, generation));
        (id, previous)
    }

    /// The active attempt, if `id` still names it.
    pub(crate) fn attempt_mut(&mut self, id: AttemptId) -> Option<&mut Attempt> {
        self.attempt.as_mut().filter(|attempt| attempt.id == id)
    }

    pub(crate) fn take_attempt(&mut self) -> Option<Attempt> {
        self.attempt.take()
    }

    pub(crate) fn record_reset(&mut self) {
        self.resets_applied += 1;
    }

    pub(crate) fn record_notice(&mut self) {
        self.notices_shown += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_detects_advance() {
        let mut guard = GenerationGuard::default();
        let before = guard.snapshot();
        assert!(!guard.is_stale(before));

        let after = guard.advance();
        assert!(guard.is_stale(before));
        assert!(!guard.is_stale(after));
        assert_eq!(after.value(), before.value() + 1);
    }

    #[test]
    fn debounce_slot_keeps_only_latest_task() {
        let mut slot = DebounceSlot::default();
        let (cancelled, first) = slot.schedule(NavigationReason::HistoryPush);
        assert_eq!(cancelled, None);

        let (cancelled, second) = slot.schedule(NavigationReason::Mutation);
        assert_eq!(cancelled, Some(first));
        assert_ne!(first, second);

        assert_eq!(slot.fire(first), None);
        assert_eq!(slot.fire(second), Some(NavigationReason::Mutation));
        assert_eq!(slot.pending(), None);
    }

    #[test]
    fn debounce_cancel_without_pending_is_harmless() {
        let mut slot = DebounceSlot::default();
        assert_eq!(slot.cancel(), None);
        assert_eq!(slot.cancel(), None);
    }
}
