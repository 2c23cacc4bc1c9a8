use thiserror::Error;

pub const DEFAULT_SUBMISSION_MESSAGE: &str = "Failed to start download";
pub const DEFAULT_JOB_FAILED_MESSAGE: &str = "Download failed";

/// Locator rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a YouTube URL")]
    Empty,
    #[error("Please enter a valid YouTube URL")]
    Unrecognized,
}

/// Why a submission attempt or a task ended up in the failed view.
///
/// `Display` yields the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Submission(String),
    #[error("Download task expired")]
    TaskExpired,
    #[error("{0}")]
    JobFailed(String),
    #[error("Download stalled")]
    Stalled,
}

impl FailureReason {
    pub fn submission(message: &str) -> Self {
        Self::Submission(non_blank_or(message, DEFAULT_SUBMISSION_MESSAGE))
    }

    pub fn job_failed(message: Option<&str>) -> Self {
        Self::JobFailed(non_blank_or(message.unwrap_or_default(), DEFAULT_JOB_FAILED_MESSAGE))
    }
}

fn non_blank_or(message: &str, fallback: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
