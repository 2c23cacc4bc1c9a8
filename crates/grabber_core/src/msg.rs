use std::time::Duration;

use crate::{Attempt, FormatType, PollOutcome, Quality, TaskId, TaskSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the locator input.
    InputChanged(String),
    /// User picked video or audio output.
    FormatSelected(FormatType),
    /// User picked a quality preference.
    QualitySelected(Quality),
    /// User submitted the current input.
    SubmitClicked,
    /// Backend created the job for `attempt`.
    SubmissionAccepted { attempt: Attempt, task_id: TaskId },
    /// Backend refused (or garbled) the job creation for `attempt`.
    SubmissionRejected { attempt: Attempt, message: String },
    /// Poller delivered a status snapshot.
    SnapshotReceived {
        task_id: TaskId,
        snapshot: TaskSnapshot,
    },
    /// Poller stopped on its own after a terminal condition.
    PollingEnded {
        task_id: TaskId,
        outcome: PollOutcome,
    },
    /// Render frame; advances the progress animation by the elapsed time.
    Frame(Duration),
    /// User asked to start over.
    ResetClicked,
    /// User asked for the finished artifact.
    RetrieveClicked,
    /// Artifact was written to disk.
    ArtifactSaved { task_id: TaskId, path: String },
    /// Artifact retrieval failed.
    ArtifactFailed { task_id: TaskId, message: String },
}
