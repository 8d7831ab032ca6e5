use rewind_logging::{rewind_debug, rewind_info, rewind_trace, rewind_warn};

use crate::{AttemptId, AttemptPhase, Effect, Msg, NavigationReason, ResetState, Trigger};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ResetState, msg: Msg) -> (ResetState, Vec<Effect>) {
    let effects = match msg {
        Msg::Navigation(reason) => {
            let (cancelled, task) = state.debounce_mut().schedule(reason);
            rewind_trace!("signal {} scheduled as task {}", reason, task);
            let mut effects = Vec::with_capacity(2);
            if let Some(old) = cancelled {
                effects.push(Effect::CancelDebounce { task: old });
            }
            effects.push(Effect::ArmDebounce { task });
            effects
        }
        Msg::DebounceElapsed { task } => match state.debounce_mut().fire(task) {
            Some(reason) => vec![Effect::EvaluateEntry { reason }],
            None => {
                rewind_trace!("debounce task {} was superseded", task);
                Vec::new()
            }
        },
        Msg::AttemptRequested {
            reason,
            url,
            enabled,
        } => request_attempt(&mut state, reason, url, enabled),
        Msg::VideoReady { attempt } => video_ready(&mut state, attempt),
        Msg::VideoMissing { attempt } => {
            if state.attempt_mut(attempt).is_some() {
                rewind_debug!("video not found for attempt {}", attempt);
                retire(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::TriggerFired {
            attempt,
            trigger,
            enabled,
        } => trigger_fired(&mut state, attempt, trigger, enabled),
        Msg::SeekApplied { attempt, trigger } => seek_applied(&mut state, attempt, trigger),
        Msg::SeekFailed {
            attempt,
            trigger,
            error,
        } => {
            rewind_warn!("reset failed for attempt {} ({}): {}", attempt, trigger, error);
            retire_if_settled(&mut state, attempt)
        }
        Msg::EnabledChanged {
            old,
            new,
            current_url,
        } => enabled_changed(&mut state, old, new, current_url),
    };

    (state, effects)
}

fn request_attempt(
    state: &mut ResetState,
    reason: NavigationReason,
    url: String,
    enabled: bool,
) -> Vec<Effect> {
    if !enabled {
        rewind_debug!("disabled, skip {} ({})", url, reason);
        return Vec::new();
    }
    if !state.is_watch_url(&url) {
        rewind_debug!("not a watch url, skip {} ({})", url, reason);
        return Vec::new();
    }
    if state.handled_url() == Some(url.as_str()) {
        rewind_debug!("already handled, skip {} ({})", url, reason);
        return Vec::new();
    }

    state.mark_handled(url.clone());
    let (attempt, previous) = state.begin_attempt(url.clone());
    rewind_info!(
        "handle {} ({}) as attempt {} at generation {}",
        url,
        reason,
        attempt,
        state.generation()
    );

    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = previous {
        effects.push(Effect::ReleaseAttempt {
            attempt: previous.id,
        });
    }
    effects.push(Effect::WaitForVideo { attempt });
    effects
}

fn video_ready(state: &mut ResetState, attempt: AttemptId) -> Vec<Effect> {
    let Some(snapshot) = state.attempt_mut(attempt).map(|active| active.generation) else {
        return Vec::new();
    };
    if state.guard().is_stale(snapshot) {
        rewind_debug!("generation changed while waiting for video, drop attempt {}", attempt);
        return retire(state);
    }
    if let Some(active) = state.attempt_mut(attempt) {
        active.phase = AttemptPhase::Armed {
            unresolved: Trigger::ALL.into_iter().collect(),
        };
    }
    vec![Effect::ArmTriggers { attempt }]
}

fn trigger_fired(
    state: &mut ResetState,
    attempt: AttemptId,
    trigger: Trigger,
    enabled: bool,
) -> Vec<Effect> {
    let Some(snapshot) = state.attempt_mut(attempt).map(|active| active.generation) else {
        rewind_trace!("trigger {} for retired attempt {}", trigger, attempt);
        return Vec::new();
    };
    if state.guard().is_stale(snapshot) {
        rewind_debug!("generation changed, skip {} for attempt {}", trigger, attempt);
        return retire(state);
    }

    if let Some(AttemptPhase::Armed { unresolved }) =
        state.attempt_mut(attempt).map(|active| &mut active.phase)
    {
        unresolved.remove(&trigger);
    }

    if !enabled {
        rewind_debug!("disabled before apply, skip {} for attempt {}", trigger, attempt);
        return retire_if_settled(state, attempt);
    }

    vec![Effect::SeekToStart { attempt, trigger }]
}

fn seek_applied(state: &mut ResetState, attempt: AttemptId, trigger: Trigger) -> Vec<Effect> {
    let Some(active) = state.attempt_mut(attempt) else {
        return Vec::new();
    };
    rewind_debug!("reset currentTime=0 for attempt {} ({})", attempt, trigger);

    let first = !active.notice_shown;
    active.notice_shown = true;
    state.record_reset();

    let mut effects = Vec::new();
    if first {
        state.record_notice();
        effects.push(Effect::ShowNotice { attempt });
    }
    effects.extend(retire_if_settled(state, attempt));
    effects
}

fn enabled_changed(
    state: &mut ResetState,
    old: Option<bool>,
    new: Option<bool>,
    current_url: String,
) -> Vec<Effect> {
    // Advance before anything else so every later staleness check sees it.
    let generation = state.guard_mut().advance();
    rewind_debug!("enabled {:?} -> {:?}, generation {}", old, new, generation);

    let mut effects = Vec::new();
    if new == Some(false) {
        if let Some(task) = state.debounce_mut().cancel() {
            effects.push(Effect::CancelDebounce { task });
        }
        rewind_debug!("disabled: cancel pending");
        return effects;
    }

    // Re-enabling while a video is on screen must not reset that video.
    if old == Some(false) && new == Some(true) && state.is_watch_url(&current_url) {
        rewind_debug!("re-enabled on {}, marking it handled", current_url);
        state.mark_handled(current_url);
        if let Some(task) = state.debounce_mut().cancel() {
            effects.push(Effect::CancelDebounce { task });
        }
    }
    effects
}

fn retire(state: &mut ResetState) -> Vec<Effect> {
    match state.take_attempt() {
        Some(attempt) => vec![Effect::ReleaseAttempt {
            attempt: attempt.id,
        }],
        None => Vec::new(),
    }
}

fn retire_if_settled(state: &mut ResetState, attempt: AttemptId) -> Vec<Effect> {
    let settled = state
        .attempt_mut(attempt)
        .is_some_and(|active| active.is_settled());
    if settled {
        retire(state)
    } else {
        Vec::new()
    }
}
