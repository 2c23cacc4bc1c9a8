use std::time::Duration;

use crate::progress::ProgressDisplay;
use crate::view_model::{CompletedView, ProgressView, RetrievalView, SessionView};
use crate::{Attempt, FailureReason, FormatType, Quality, TaskId, TaskSnapshot};

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl Phase {
    /// A job is in flight; the submit entry point is disabled.
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Polling)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompletedTask {
    pub(crate) task_id: TaskId,
    pub(crate) filename: Option<String>,
    pub(crate) retrieval: Retrieval,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Retrieval {
    #[default]
    NotRequested,
    InFlight,
    Saved(String),
    Failed(String),
}

/// All mutable controller state. One instance per controller; no globals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    input: String,
    format: FormatType,
    quality: Quality,
    phase: Phase,
    attempt: Attempt,
    active_task: Option<TaskId>,
    display: ProgressDisplay,
    failure: Option<FailureReason>,
    completed: Option<CompletedTask>,
    dirty: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// Task with a live poller, if any.
    pub fn active_task(&self) -> Option<&TaskId> {
        self.active_task.as_ref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn format(&self) -> FormatType {
        self.format
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn display(&self) -> &ProgressDisplay {
        &self.display
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn view(&self) -> SessionView {
        let progress = (self.phase == Phase::Polling).then(|| {
            let displayed = self.display.displayed();
            ProgressView {
                displayed_percent: displayed,
                percent_text: format!("{}", displayed.round()),
                label: self.display.label().to_string(),
                info: self.display.info().to_string(),
                animating: self.display.is_animating(),
            }
        });
        let completed = self.completed.as_ref().map(|done| CompletedView {
            task_id: done.task_id.clone(),
            filename: done.filename.clone(),
            retrieval_link: crate::retrieval_link(&done.task_id),
            retrieval: match &done.retrieval {
                Retrieval::NotRequested => RetrievalView::Available,
                Retrieval::InFlight => RetrievalView::InProgress,
                Retrieval::Saved(path) => RetrievalView::Saved { path: path.clone() },
                Retrieval::Failed(message) => RetrievalView::Failed {
                    message: message.clone(),
                },
            },
        });

        SessionView {
            phase: self.phase,
            input: self.input.clone(),
            format: self.format,
            quality: self.quality,
            submit_enabled: !self.phase.is_busy(),
            active_task: self.active_task.clone(),
            progress,
            error: self.failure.as_ref().map(ToString::to_string),
            completed,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_format(&mut self, format: FormatType) {
        if self.format != format {
            self.format = format;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_quality(&mut self, quality: Quality) {
        if self.quality != quality {
            self.quality = quality;
            self.mark_dirty();
        }
    }

    /// True when `task_id` is the task currently being polled.
    pub(crate) fn is_polling(&self, task_id: &TaskId) -> bool {
        self.phase == Phase::Polling && self.active_task.as_ref() == Some(task_id)
    }

    /// Drops any task and display state and opens a new attempt.
    pub(crate) fn start_over(&mut self) -> Attempt {
        self.attempt += 1;
        self.phase = Phase::Idle;
        self.active_task = None;
        self.display.reset();
        self.failure = None;
        self.completed = None;
        self.mark_dirty();
        self.attempt
    }

    pub(crate) fn begin_submitting(&mut self) {
        self.phase = Phase::Submitting;
        self.mark_dirty();
    }

    pub(crate) fn begin_polling(&mut self, task_id: TaskId) {
        self.phase = Phase::Polling;
        self.active_task = Some(task_id);
        self.display.reset();
        self.mark_dirty();
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: &TaskSnapshot) {
        self.display.apply(snapshot);
        self.mark_dirty();
    }

    pub(crate) fn advance_animation(&mut self, delta: Duration) {
        if self.display.advance(delta) {
            self.mark_dirty();
        }
    }

    pub(crate) fn complete(&mut self, filename: Option<String>) {
        if let Some(task_id) = self.active_task.take() {
            self.completed = Some(CompletedTask {
                task_id,
                filename,
                retrieval: Retrieval::NotRequested,
            });
        }
        self.failure = None;
        self.phase = Phase::Completed;
        self.mark_dirty();
    }

    /// Surfaces `reason` without touching the job in flight.
    pub(crate) fn reject_input(&mut self, reason: FailureReason) {
        self.failure = Some(reason);
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, reason: FailureReason) {
        self.active_task = None;
        self.failure = Some(reason);
        self.phase = Phase::Failed;
        self.mark_dirty();
    }

    /// Marks the artifact as requested; returns what to fetch the first time only.
    pub(crate) fn request_retrieval(&mut self) -> Option<(TaskId, Option<String>)> {
        let done = self.completed.as_mut()?;
        if done.retrieval != Retrieval::NotRequested {
            return None;
        }
        done.retrieval = Retrieval::InFlight;
        let request = (done.task_id.clone(), done.filename.clone());
        self.mark_dirty();
        Some(request)
    }

    pub(crate) fn finish_retrieval(&mut self, task_id: &TaskId, outcome: Retrieval) {
        let Some(done) = self.completed.as_mut() else {
            return;
        };
        if &done.task_id != task_id || done.retrieval != Retrieval::InFlight {
            return;
        }
        done.retrieval = outcome;
        self.mark_dirty();
    }
}
