use chrono::Local;
use grabber_core::{Phase, ProgressView, RetrievalView, SessionView};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{spinner:.green} {prefix:>4}% [{bar:40.cyan/blue}] {msg}";

/// Draws [`SessionView`]s onto a single terminal progress bar.
pub struct TerminalRenderer {
    bar: ProgressBar,
    last_phase: Phase,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Self {
            bar,
            last_phase: Phase::Idle,
        }
    }

    pub fn render(&mut self, view: &SessionView) {
        match view.phase {
            Phase::Idle => {}
            Phase::Submitting => {
                if self.last_phase != Phase::Submitting {
                    self.bar.set_prefix("0");
                    self.bar.set_message(format!("Submitting {}", view.input));
                }
            }
            Phase::Polling => {
                if let Some(progress) = &view.progress {
                    self.draw_progress(progress);
                }
            }
            Phase::Completed => {
                if let Some(completed) = &view.completed {
                    let name = completed.filename.as_deref().unwrap_or(completed.task_id.as_str());
                    let line = match &completed.retrieval {
                        RetrievalView::Available => {
                            format!("{name} ready at {}", completed.retrieval_link)
                        }
                        RetrievalView::InProgress => format!("Saving {name}…"),
                        RetrievalView::Saved { path } => format!("Saved {path}"),
                        RetrievalView::Failed { message } => {
                            format!("Could not save {name}: {message}")
                        }
                    };
                    self.bar.set_prefix("100");
                    self.bar.set_position(100);
                    self.bar.set_message(line);
                }
            }
            Phase::Failed => {
                if let Some(error) = &view.error {
                    self.bar.abandon_with_message(format!("Error: {error}"));
                }
            }
        }
        self.last_phase = view.phase;
    }

    fn draw_progress(&self, progress: &ProgressView) {
        self.bar.set_position(progress.displayed_percent.round() as u64);
        self.bar.set_prefix(progress.percent_text.clone());
        let message = if progress.info.is_empty() {
            progress.label.clone()
        } else {
            format!("{} {}", progress.label, progress.info)
        };
        self.bar.set_message(message);
        self.bar.tick();
    }

    /// Leaves the last frame on screen with a completion timestamp.
    pub fn finish(&self, view: &SessionView) {
        if view.phase == Phase::Completed {
            let stamp = Local::now().format("%H:%M:%S");
            self.bar
                .finish_with_message(format!("{} (done {stamp})", self.bar.message()));
        } else if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
