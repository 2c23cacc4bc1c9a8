use crate::{Attempt, SubmitRequest, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create a job on the backend.
    Submit {
        attempt: Attempt,
        request: SubmitRequest,
    },
    /// Start the poller for a freshly created task.
    StartPolling { task_id: TaskId },
    /// Stop the poller; a no-op when none is running.
    StopPolling,
    /// Ask the backend to drop an abandoned task (best effort).
    DiscardTask { task_id: TaskId },
    /// Fetch the finished artifact once.
    RetrieveArtifact {
        task_id: TaskId,
        filename: Option<String>,
    },
}
