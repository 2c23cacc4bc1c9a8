use crate::state::Retrieval;
use crate::{
    validate_locator, Effect, FailureReason, Msg, Phase, PollOutcome, SessionState, SubmitRequest,
    TaskStatus,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::FormatSelected(format) => {
            state.set_format(format);
            Vec::new()
        }
        Msg::QualitySelected(quality) => {
            state.set_quality(quality);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SubmissionAccepted { attempt, task_id } => {
            if attempt != state.attempt() || state.phase() != Phase::Submitting {
                if state.active_task() == Some(&task_id) {
                    return (state, Vec::new());
                }
                // The superseded attempt still created a backend job; nobody will poll it.
                return (state, vec![Effect::DiscardTask { task_id }]);
            }
            state.begin_polling(task_id.clone());
            vec![Effect::StartPolling { task_id }]
        }
        Msg::SubmissionRejected { attempt, message } => {
            if attempt != state.attempt() || state.phase() != Phase::Submitting {
                return (state, Vec::new());
            }
            state.fail(FailureReason::submission(&message));
            Vec::new()
        }
        Msg::SnapshotReceived { task_id, snapshot } => {
            // Late snapshots from a replaced task must not leak into the new one.
            if state.is_polling(&task_id) {
                state.apply_snapshot(&snapshot);
            }
            Vec::new()
        }
        Msg::PollingEnded { task_id, outcome } => {
            if !state.is_polling(&task_id) {
                return (state, Vec::new());
            }
            match outcome {
                PollOutcome::Finished(snapshot) if snapshot.status == TaskStatus::Completed => {
                    state.complete(snapshot.filename.filter(|name| !name.is_empty()));
                }
                PollOutcome::Finished(snapshot) => {
                    state.fail(FailureReason::job_failed(snapshot.error_message.as_deref()));
                }
                PollOutcome::Expired => state.fail(FailureReason::TaskExpired),
                PollOutcome::Stalled => state.fail(FailureReason::Stalled),
            }
            vec![Effect::StopPolling]
        }
        Msg::Frame(delta) => {
            state.advance_animation(delta);
            Vec::new()
        }
        Msg::ResetClicked => {
            let effects = abandon_active_task(&state);
            state.start_over();
            effects
        }
        Msg::RetrieveClicked => match state.request_retrieval() {
            Some((task_id, filename)) => vec![Effect::RetrieveArtifact { task_id, filename }],
            None => Vec::new(),
        },
        Msg::ArtifactSaved { task_id, path } => {
            state.finish_retrieval(&task_id, Retrieval::Saved(path));
            Vec::new()
        }
        Msg::ArtifactFailed { task_id, message } => {
            state.finish_retrieval(&task_id, Retrieval::Failed(message));
            Vec::new()
        }
    };

    (state, effects)
}

/// Any state may submit. Invalid input leaves a running task alone; valid input
/// stops and discards the previous task before the new job is sent.
fn submit(state: &mut SessionState) -> Vec<Effect> {
    let locator = match validate_locator(state.input()) {
        Ok(locator) => locator,
        Err(err) => {
            if state.phase().is_busy() {
                state.reject_input(err.into());
            } else {
                state.start_over();
                state.fail(err.into());
            }
            return Vec::new();
        }
    };

    let mut effects = abandon_active_task(state);
    let attempt = state.start_over();
    state.begin_submitting();
    effects.push(Effect::Submit {
        attempt,
        request: SubmitRequest {
            locator,
            format: state.format(),
            quality: state.quality(),
        },
    });
    effects
}

fn abandon_active_task(state: &SessionState) -> Vec<Effect> {
    match (state.phase(), state.active_task()) {
        (Phase::Polling, Some(task_id)) => vec![
            Effect::StopPolling,
            Effect::DiscardTask {
                task_id: task_id.clone(),
            },
        ],
        _ => Vec::new(),
    }
}
