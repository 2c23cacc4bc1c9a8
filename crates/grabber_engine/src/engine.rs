use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use grabber_core::{Attempt, Effect, PollOutcome, SubmitRequest, TaskId, TaskSnapshot};

use crate::client::{BackendClient, ClientSettings};
use crate::poller::{IntervalTicks, PollSettings, PollSink, Poller, POLL_INTERVAL};
use crate::retrieve::ArtifactWriter;
use crate::{EngineEvent, TransportError};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub client: ClientSettings,
    pub poll_interval: Duration,
    pub poll: PollSettings,
    pub output_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            poll_interval: POLL_INTERVAL,
            poll: PollSettings::default(),
            output_dir: PathBuf::from("downloads"),
        }
    }
}

enum EngineCommand {
    Submit {
        attempt: Attempt,
        request: SubmitRequest,
    },
    StartPolling {
        task_id: TaskId,
    },
    StopPolling,
    Discard {
        task_id: TaskId,
    },
    Retrieve {
        task_id: TaskId,
        filename: Option<String>,
    },
}

/// Runs effects on a dedicated thread with its own tokio runtime and reports back
/// through [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, TransportError> {
        let client = Arc::new(BackendClient::new(settings.client.clone())?);
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut poller = Poller::new(
                runtime.handle().clone(),
                client.clone(),
                settings.poll.clone(),
            );
            let writer = Arc::new(ArtifactWriter::new(settings.output_dir.clone()));

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { task_id } => {
                        let sink = Arc::new(ChannelPollSink::new(event_tx.clone()));
                        let ticks = Box::new(IntervalTicks::new(settings.poll_interval));
                        poller.start(task_id, ticks, sink);
                    }
                    EngineCommand::StopPolling => poller.stop(),
                    command => {
                        let client = client.clone();
                        let writer = writer.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_command(&client, &writer, command, event_tx).await;
                        });
                    }
                }
            }
            // Handle dropped: tear down the active run before the runtime goes away.
            poller.stop();
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            let command = match effect {
                Effect::Submit { attempt, request } => {
                    engine_info!(
                        "Submit attempt={} format={} quality={} url={}",
                        attempt,
                        request.format.as_str(),
                        request.quality,
                        request.locator
                    );
                    EngineCommand::Submit { attempt, request }
                }
                Effect::StartPolling { task_id } => EngineCommand::StartPolling { task_id },
                Effect::StopPolling => EngineCommand::StopPolling,
                Effect::DiscardTask { task_id } => EngineCommand::Discard { task_id },
                Effect::RetrieveArtifact { task_id, filename } => {
                    EngineCommand::Retrieve { task_id, filename }
                }
            };
            if self.cmd_tx.send(command).is_err() {
                engine_error!("engine thread is gone; dropping effect");
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    client: &BackendClient,
    writer: &ArtifactWriter,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit { attempt, request } => {
            let result = client.submit(&request).await;
            match &result {
                Ok(task_id) => engine_info!(task = task_id; "job created for attempt {}", attempt),
                Err(err) => engine_warn!("Submission attempt {} failed: {}", attempt, err),
            }
            let _ = event_tx.send(EngineEvent::SubmissionFinished { attempt, result });
        }
        EngineCommand::Discard { task_id } => match client.discard(&task_id).await {
            Ok(true) => engine_info!(task = task_id; "backend task discarded"),
            Ok(false) => engine_info!(task = task_id; "backend did not know the task"),
            Err(err) => engine_warn!(task = task_id; "discard failed: {}", err),
        },
        EngineCommand::Retrieve { task_id, filename } => {
            let result = writer
                .retrieve(client, &task_id, filename.as_deref())
                .await;
            match &result {
                Ok(path) => engine_info!(task = task_id; "artifact saved to {:?}", path),
                Err(err) => engine_warn!(task = task_id; "artifact retrieval failed: {}", err),
            }
            let _ = event_tx.send(EngineEvent::ArtifactFinished { task_id, result });
        }
        EngineCommand::StartPolling { .. } | EngineCommand::StopPolling => {}
    }
}

/// Forwards poll callbacks onto the engine event channel.
pub struct ChannelPollSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelPollSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl PollSink for ChannelPollSink {
    fn snapshot(&self, task_id: &TaskId, snapshot: &TaskSnapshot) {
        let _ = self.tx.send(EngineEvent::Snapshot {
            task_id: task_id.clone(),
            snapshot: snapshot.clone(),
        });
    }

    fn terminal(&self, task_id: &TaskId, outcome: PollOutcome) {
        let _ = self.tx.send(EngineEvent::PollingEnded {
            task_id: task_id.clone(),
            outcome,
        });
    }
}
