use std::time::Duration;

use engine_logging::engine_info;
use grabber_core::{update, Msg, SessionState, SessionView};

use crate::{EngineEvent, EngineHandle, EngineSettings, TransportError};

/// Lifecycle controller instance: owns the session state and the engine that
/// executes its effects. Dropping it (or calling [`Controller::shutdown`]) stops
/// any active poller.
pub struct Controller {
    state: SessionState,
    engine: EngineHandle,
}

impl Controller {
    pub fn new(settings: EngineSettings) -> Result<Self, TransportError> {
        Ok(Self::with_engine(EngineHandle::new(settings)?))
    }

    pub fn with_engine(engine: EngineHandle) -> Self {
        Self {
            state: SessionState::new(),
            engine,
        }
    }

    /// Applies `msg` and hands the resulting effects to the engine.
    /// Returns whether the view changed.
    pub fn dispatch(&mut self, msg: Msg) -> bool {
        let state = std::mem::take(&mut self.state);
        let phase_before = state.phase();
        let (mut state, effects) = update(state, msg);
        if state.phase() != phase_before {
            engine_info!("lifecycle {:?} -> {:?}", phase_before, state.phase());
        }
        let dirty = state.consume_dirty();
        self.state = state;
        self.engine.apply(effects);
        dirty
    }

    /// Feeds every pending engine event through [`Controller::dispatch`].
    pub fn pump(&mut self) -> bool {
        let mut dirty = false;
        while let Some(event) = self.engine.try_recv() {
            dirty |= self.dispatch(event_to_msg(event));
        }
        dirty
    }

    /// Waits up to `timeout` for the next engine event, then drains the rest.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.engine.recv_timeout(timeout) {
            Some(event) => {
                let dirty = self.dispatch(event_to_msg(event));
                self.pump() || dirty
            }
            None => false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> SessionView {
        self.state.view()
    }

    pub fn shutdown(self) {
        engine_info!("controller shut down in {:?}", self.state.phase());
    }
}

fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SubmissionFinished { attempt, result } => match result {
            Ok(task_id) => Msg::SubmissionAccepted { attempt, task_id },
            Err(err) => Msg::SubmissionRejected {
                attempt,
                message: err.to_string(),
            },
        },
        EngineEvent::Snapshot { task_id, snapshot } => Msg::SnapshotReceived { task_id, snapshot },
        EngineEvent::PollingEnded { task_id, outcome } => Msg::PollingEnded { task_id, outcome },
        EngineEvent::ArtifactFinished { task_id, result } => match result {
            Ok(path) => Msg::ArtifactSaved {
                task_id,
                path: path.display().to_string(),
            },
            Err(err) => Msg::ArtifactFailed {
                task_id,
                message: err.to_string(),
            },
        },
    }
}
