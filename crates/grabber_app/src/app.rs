use std::time::{Duration, Instant};

use anyhow::Context;
use engine_logging::engine_info;
use grabber_core::{Msg, Phase, RetrievalView, SessionView};
use grabber_engine::Controller;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::render::TerminalRenderer;

/// Upper bound between animation frames.
const FRAME: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Retrieve,
    Done { success: bool },
}

/// Submits `cli.url`, follows the job to its end and optionally saves the file.
/// Returns whether the download succeeded.
pub fn run(cli: &Cli, config: &AppConfig) -> anyhow::Result<bool> {
    let mut settings = config.engine_settings();
    if let Some(base_url) = &cli.base_url {
        settings.client.base_url = base_url.clone();
    }
    engine_info!(
        "backend {} output {:?}",
        settings.client.base_url,
        settings.output_dir
    );
    let mut controller = Controller::new(settings).context("failed to set up backend client")?;
    let mut renderer = TerminalRenderer::new();

    controller.dispatch(Msg::InputChanged(cli.url.clone()));
    controller.dispatch(Msg::FormatSelected(cli.format));
    controller.dispatch(Msg::QualitySelected(cli.quality));
    controller.dispatch(Msg::SubmitClicked);
    renderer.render(&controller.view());

    let mut last_frame = Instant::now();
    loop {
        let mut dirty = controller.wait(FRAME);
        let now = Instant::now();
        dirty |= controller.dispatch(Msg::Frame(now - last_frame));
        last_frame = now;

        let view = controller.view();
        if dirty {
            renderer.render(&view);
        }
        match next_step(&view, cli.no_save) {
            Step::Continue => {}
            Step::Retrieve => {
                controller.dispatch(Msg::RetrieveClicked);
                renderer.render(&controller.view());
            }
            Step::Done { success } => {
                renderer.render(&view);
                renderer.finish(&view);
                controller.shutdown();
                return Ok(success);
            }
        }
    }
}

fn next_step(view: &SessionView, no_save: bool) -> Step {
    match view.phase {
        Phase::Idle | Phase::Submitting | Phase::Polling => Step::Continue,
        Phase::Failed => Step::Done { success: false },
        Phase::Completed => match view.completed.as_ref().map(|completed| &completed.retrieval) {
            Some(RetrievalView::Available) if !no_save => Step::Retrieve,
            Some(RetrievalView::InProgress) => Step::Continue,
            Some(RetrievalView::Failed { .. }) => Step::Done { success: false },
            _ => Step::Done { success: true },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grabber_core::{CompletedView, TaskId};

    fn completed(retrieval: RetrievalView) -> SessionView {
        SessionView {
            phase: Phase::Completed,
            completed: Some(CompletedView {
                task_id: TaskId::new("t1"),
                filename: Some("abc123.mp4".to_string()),
                retrieval_link: "/download/t1".to_string(),
                retrieval,
            }),
            ..SessionView::default()
        }
    }

    #[test]
    fn keeps_going_while_job_runs() {
        for phase in [Phase::Idle, Phase::Submitting, Phase::Polling] {
            let view = SessionView {
                phase,
                ..SessionView::default()
            };
            assert_eq!(next_step(&view, false), Step::Continue);
        }
    }

    #[test]
    fn completed_job_is_saved_unless_disabled() {
        assert_eq!(
            next_step(&completed(RetrievalView::Available), false),
            Step::Retrieve
        );
        assert_eq!(
            next_step(&completed(RetrievalView::Available), true),
            Step::Done { success: true }
        );
        assert_eq!(
            next_step(&completed(RetrievalView::InProgress), false),
            Step::Continue
        );
        assert_eq!(
            next_step(
                &completed(RetrievalView::Saved {
                    path: "downloads/abc123.mp4".to_string()
                }),
                false
            ),
            Step::Done { success: true }
        );
    }

    #[test]
    fn failures_end_unsuccessfully() {
        let failed = SessionView {
            phase: Phase::Failed,
            error: Some("Download failed".to_string()),
            ..SessionView::default()
        };
        assert_eq!(next_step(&failed, false), Step::Done { success: false });
        assert_eq!(
            next_step(
                &completed(RetrievalView::Failed {
                    message: "disk full".to_string()
                }),
                false
            ),
            Step::Done { success: false }
        );
    }
}
