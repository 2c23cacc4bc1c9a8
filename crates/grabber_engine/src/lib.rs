//! Grabber engine: backend client, poller and effect execution.
mod client;
mod controller;
mod engine;
mod poller;
mod retrieve;
mod types;

pub use client::{BackendClient, ClientSettings};
pub use controller::Controller;
pub use engine::{ChannelPollSink, EngineHandle, EngineSettings};
pub use poller::{
    IntervalTicks, PollSettings, PollSink, Poller, StatusSource, TickSource, POLL_INTERVAL,
};
pub use retrieve::{ensure_output_dir, sanitize_filename, ArtifactWriter, PersistError, RetrieveError};
pub use types::{EngineEvent, StatusReply, SubmissionError, TransportError};
