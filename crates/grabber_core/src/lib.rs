//! Grabber core: pure lifecycle state machine, locator validation and progress reconciliation.
mod effect;
mod error;
mod locator;
mod msg;
pub mod progress;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{
    FailureReason, ValidationError, DEFAULT_JOB_FAILED_MESSAGE, DEFAULT_SUBMISSION_MESSAGE,
};
pub use locator::{is_acceptable_locator, validate_locator};
pub use msg::Msg;
pub use progress::{
    format_eta, format_speed, reconcile, DisplayUpdate, ProgressAnimation, ProgressDisplay,
};
pub use state::{Phase, SessionState};
pub use types::{
    Attempt, FormatType, PollOutcome, Quality, SubmitRequest, TaskId, TaskSnapshot, TaskStatus,
};
pub use update::update;
pub use view_model::{retrieval_link, CompletedView, ProgressView, RetrievalView, SessionView};
