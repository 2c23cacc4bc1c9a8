use crate::{FormatType, Phase, Quality, TaskId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionView {
    pub phase: Phase,
    pub input: String,
    pub format: FormatType,
    pub quality: Quality,
    pub submit_enabled: bool,
    pub active_task: Option<TaskId>,
    pub progress: Option<ProgressView>,
    pub error: Option<String>,
    pub completed: Option<CompletedView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub displayed_percent: f64,
    pub percent_text: String,
    pub label: String,
    pub info: String,
    pub animating: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedView {
    pub task_id: TaskId,
    pub filename: Option<String>,
    /// Navigation path of the finished artifact on the backend.
    pub retrieval_link: String,
    pub retrieval: RetrievalView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalView {
    Available,
    InProgress,
    Saved { path: String },
    Failed { message: String },
}

pub fn retrieval_link(task_id: &TaskId) -> String {
    format!("/download/{task_id}")
}
