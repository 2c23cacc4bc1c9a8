use std::path::PathBuf;

use grabber_core::{Attempt, PollOutcome, TaskId, TaskSnapshot};
use thiserror::Error;

use crate::retrieve::RetrieveError;

#[derive(Debug)]
pub enum EngineEvent {
    SubmissionFinished {
        attempt: Attempt,
        result: Result<TaskId, SubmissionError>,
    },
    Snapshot {
        task_id: TaskId,
        snapshot: TaskSnapshot,
    },
    PollingEnded {
        task_id: TaskId,
        outcome: PollOutcome,
    },
    ArtifactFinished {
        task_id: TaskId,
        result: Result<PathBuf, RetrieveError>,
    },
}

/// Job creation failed; `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Failed to start download: unexpected response ({0})")]
    Malformed(String),
    #[error("Failed to start download: {0}")]
    Transport(String),
}

/// A single request that never got an HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Status fetch answered by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReply {
    Snapshot(TaskSnapshot),
    /// Non-success status: the task is unknown or expired.
    Expired,
}
