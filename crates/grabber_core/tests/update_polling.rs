use std::time::Duration;

use grabber_core::progress::ANIMATION_DURATION;
use grabber_core::{
    update, Effect, Msg, Phase, PollOutcome, RetrievalView, SessionState, TaskId, TaskSnapshot,
    TaskStatus,
};
use pretty_assertions::assert_eq;

fn polling(task_id: &str) -> SessionState {
    let (state, _) = update(
        SessionState::new(),
        Msg::InputChanged("https://youtu.be/abc123".to_string()),
    );
    let (state, _) = update(state, Msg::SubmitClicked);
    let attempt = state.attempt();
    let (state, _) = update(
        state,
        Msg::SubmissionAccepted {
            attempt,
            task_id: TaskId::new(task_id),
        },
    );
    state
}

fn snapshot(state: SessionState, task_id: &str, snapshot: TaskSnapshot) -> SessionState {
    let (state, effects) = update(
        state,
        Msg::SnapshotReceived {
            task_id: TaskId::new(task_id),
            snapshot,
        },
    );
    assert!(effects.is_empty());
    state
}

fn finish_animation(state: SessionState) -> SessionState {
    update(state, Msg::Frame(ANIMATION_DURATION)).0
}

#[test]
fn downloading_snapshot_updates_progress_view() {
    let state = polling("t1");
    let state = snapshot(
        state,
        "t1",
        TaskSnapshot::new(TaskStatus::Downloading)
            .with_progress(40.0)
            .with_rate(1_048_576.0, Some(30.0)),
    );

    let mid = update(state.clone(), Msg::Frame(Duration::from_millis(100))).0;
    let mid_percent = mid.view().progress.unwrap().displayed_percent;
    assert!(mid_percent > 0.0 && mid_percent < 40.0, "{mid_percent}");

    let state = finish_animation(state);
    let progress = state.view().progress.expect("progress view");
    assert_eq!(progress.percent_text, "40");
    assert_eq!(progress.label, "Downloading…");
    assert_eq!(progress.info, "1.0 MB/s • 30s remaining");
    assert!(!progress.animating);
}

#[test]
fn percent_text_rounds_half_away_from_zero() {
    for (progress, expected) in [(40.5, "41"), (2.5, "3"), (99.4, "99")] {
        let state = snapshot(
            polling("t1"),
            "t1",
            TaskSnapshot::new(TaskStatus::Downloading).with_progress(progress),
        );
        let view = finish_animation(state).view().progress.expect("progress view");
        assert_eq!(view.percent_text, expected);
        assert_eq!(view.displayed_percent.round().to_string(), expected);
    }
}

#[test]
fn displayed_percent_stays_in_range_and_chains_animations() {
    let mut state = polling("t1");
    let targets = [12.0, 250.0, 35.0, -20.0, 60.0, 60.0, 100.0];
    let mut previous_end = 0.0;

    for (index, target) in targets.into_iter().enumerate() {
        state = snapshot(
            state,
            "t1",
            TaskSnapshot::new(TaskStatus::Downloading).with_progress(target),
        );
        // A fresh animation starts exactly where the previous one ends.
        let start = state.view().progress.unwrap().displayed_percent;
        assert_eq!(start, previous_end);

        // Every other snapshot interrupts the running animation part way.
        let steps = if index % 2 == 0 { 30 } else { 3 };
        for _ in 0..steps {
            state = update(state, Msg::Frame(Duration::from_millis(16))).0;
            let shown = state.view().progress.unwrap().displayed_percent;
            assert!((0.0..=100.0).contains(&shown), "{shown}");
        }
        previous_end = target.clamp(0.0, 100.0);
    }

    let state = finish_animation(state);
    assert_eq!(state.display().last_displayed(), 100.0);
}

#[test]
fn snapshot_for_other_task_is_discarded() {
    let state = polling("t2");
    let mut state = finish_animation(state);
    state.consume_dirty();

    let (mut state, effects) = update(
        state,
        Msg::SnapshotReceived {
            task_id: TaskId::new("t1"),
            snapshot: TaskSnapshot::new(TaskStatus::Downloading).with_progress(90.0),
        },
    );
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view().progress.unwrap().percent_text, "0");

    let (state, effects) = update(
        state,
        Msg::PollingEnded {
            task_id: TaskId::new("t1"),
            outcome: PollOutcome::Expired,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Polling);
}

#[test]
fn completed_terminal_exposes_retrieval_link() {
    let state = polling("t1");
    let terminal = TaskSnapshot::new(TaskStatus::Completed).with_filename("abc123.mp4");
    let state = snapshot(state, "t1", terminal.clone());
    let (state, effects) = update(
        state,
        Msg::PollingEnded {
            task_id: TaskId::new("t1"),
            outcome: PollOutcome::Finished(terminal),
        },
    );

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.phase(), Phase::Completed);
    assert_eq!(state.active_task(), None);
    let view = state.view();
    assert!(view.progress.is_none());
    assert!(view.submit_enabled);
    let completed = view.completed.expect("completed view");
    assert_eq!(completed.retrieval_link, "/download/t1");
    assert_eq!(completed.filename.as_deref(), Some("abc123.mp4"));
    assert_eq!(completed.retrieval, RetrievalView::Available);
}

#[test]
fn job_error_uses_backend_message_or_default() {
    let state = polling("t1");
    let (state, effects) = update(
        state,
        Msg::PollingEnded {
            task_id: TaskId::new("t1"),
            outcome: PollOutcome::Finished(
                TaskSnapshot::new(TaskStatus::Error).with_error("Video unavailable"),
            ),
        },
    );
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(state.view().error.as_deref(), Some("Video unavailable"));

    let state = polling("t2");
    let (state, _) = update(
        state,
        Msg::PollingEnded {
            task_id: TaskId::new("t2"),
            outcome: PollOutcome::Finished(TaskSnapshot::new(TaskStatus::Error)),
        },
    );
    assert_eq!(state.view().error.as_deref(), Some("Download failed"));
}

#[test]
fn expiry_and_stall_fail_the_task() {
    let (state, effects) = update(
        polling("t1"),
        Msg::PollingEnded {
            task_id: TaskId::new("t1"),
            outcome: PollOutcome::Expired,
        },
    );
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.view().error.as_deref(), Some("Download task expired"));

    let (state, _) = update(
        polling("t1"),
        Msg::PollingEnded {
            task_id: TaskId::new("t1"),
            outcome: PollOutcome::Stalled,
        },
    );
    assert_eq!(state.view().error.as_deref(), Some("Download stalled"));
}

#[test]
fn retrieval_is_requested_once() {
    let state = polling("t1");
    let terminal = TaskSnapshot::new(TaskStatus::Completed).with_filename("abc123.mp4");
    let (state, _) = update(
        state,
        Msg::PollingEnded {
            task_id: TaskId::new("t1"),
            outcome: PollOutcome::Finished(terminal),
        },
    );

    let (state, effects) = update(state, Msg::RetrieveClicked);
    assert_eq!(
        effects,
        vec![Effect::RetrieveArtifact {
            task_id: TaskId::new("t1"),
            filename: Some("abc123.mp4".to_string()),
        }]
    );
    let (state, effects) = update(state, Msg::RetrieveClicked);
    assert!(effects.is_empty());
    assert_eq!(
        state.view().completed.unwrap().retrieval,
        RetrievalView::InProgress
    );

    let (state, _) = update(
        state,
        Msg::ArtifactSaved {
            task_id: TaskId::new("t1"),
            path: "downloads/abc123.mp4".to_string(),
        },
    );
    assert_eq!(
        state.view().completed.unwrap().retrieval,
        RetrievalView::Saved {
            path: "downloads/abc123.mp4".to_string()
        }
    );
}

#[test]
fn retrieve_before_completion_is_ignored() {
    let (state, effects) = update(polling("t1"), Msg::RetrieveClicked);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Polling);
}
