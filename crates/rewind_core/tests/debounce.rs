use std::sync::Once;

use pretty_assertions::assert_eq;
use rewind_core::{update, Effect, Msg, NavigationReason, ResetState};

const WATCH_X: &str = "https://www.youtube.com/watch?v=X";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(rewind_logging::initialize_for_tests);
}

#[test]
fn burst_of_signals_coalesces_into_latest_task() {
    init_logging();
    let state = ResetState::new();

    let (state, effects) = update(state, Msg::Navigation(NavigationReason::HistoryPush));
    assert_eq!(effects, vec![Effect::ArmDebounce { task: 1 }]);

    let (state, effects) = update(state, Msg::Navigation(NavigationReason::Mutation));
    assert_eq!(
        effects,
        vec![
            Effect::CancelDebounce { task: 1 },
            Effect::ArmDebounce { task: 2 },
        ]
    );
    assert_eq!(state.view().pending_task, Some(2));

    // The cancelled timer raced its abort and still reported in.
    let (state, effects) = update(state, Msg::DebounceElapsed { task: 1 });
    assert!(effects.is_empty());
    assert_eq!(state.view().pending_task, Some(2));

    let (state, effects) = update(state, Msg::DebounceElapsed { task: 2 });
    assert_eq!(
        effects,
        vec![Effect::EvaluateEntry {
            reason: NavigationReason::Mutation
        }]
    );
    assert_eq!(state.view().pending_task, None);

    let (state, effects) = update(
        state,
        Msg::AttemptRequested {
            reason: NavigationReason::Mutation,
            url: WATCH_X.to_string(),
            enabled: true,
        },
    );
    assert_eq!(effects, vec![Effect::WaitForVideo { attempt: 1 }]);
    assert_eq!(state.handled_url(), Some(WATCH_X));
}

#[test]
fn fired_task_cannot_fire_twice() {
    init_logging();
    let (state, _) = update(ResetState::new(), Msg::Navigation(NavigationReason::Initial));
    let (state, effects) = update(state, Msg::DebounceElapsed { task: 1 });
    assert_eq!(effects.len(), 1);

    let (_state, effects) = update(state, Msg::DebounceElapsed { task: 1 });
    assert!(effects.is_empty());
}

#[test]
fn disabling_cancels_pending_task() {
    init_logging();
    let (state, _) = update(ResetState::new(), Msg::Navigation(NavigationReason::PopState));

    let (state, effects) = update(
        state,
        Msg::EnabledChanged {
            old: Some(true),
            new: Some(false),
            current_url: WATCH_X.to_string(),
        },
    );
    assert_eq!(effects, vec![Effect::CancelDebounce { task: 1 }]);
    assert_eq!(state.view().pending_task, None);

    let (_state, effects) = update(state, Msg::DebounceElapsed { task: 1 });
    assert!(effects.is_empty());
}

#[test]
fn disabling_with_nothing_pending_emits_nothing() {
    init_logging();
    let (state, effects) = update(
        ResetState::new(),
        Msg::EnabledChanged {
            old: Some(true),
            new: Some(false),
            current_url: String::new(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.generation().value(), 1);
}
