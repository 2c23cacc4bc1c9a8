use std::time::Duration;

use grabber_core::{update, Msg, SessionState};

#[test]
fn frame_on_idle_state_changes_nothing() {
    let mut state = SessionState::new();
    let (mut next, effects) = update(state.clone(), Msg::Frame(Duration::from_millis(16)));

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn retrieve_without_completed_task_changes_nothing() {
    let state = SessionState::new();
    let (next, effects) = update(state.clone(), Msg::RetrieveClicked);
    assert_eq!(state, next);
    assert!(effects.is_empty());
}
