//! Fixed-cadence status poller for the active task.
//!
//! One run per active task. Each tick fetches one snapshot unless the previous
//! fetch is still pending, in which case the tick is skipped. A failed fetch is
//! logged and retried on the next tick; a terminal snapshot or an expired task
//! ends the run.
//!
//! Callbacks go through a per-run gate. [`Poller::stop`] closes the gate, so once
//! it returns no callback from that run can be observed, even if a fetch was in
//! flight at the time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use grabber_core::{PollOutcome, TaskId, TaskSnapshot};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{StatusReply, TransportError};

/// Fixed poll cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives the poll loop; lets tests substitute a manual clock.
#[async_trait::async_trait]
pub trait TickSource: Send {
    /// Resolves at the next tick. `false` means the source is exhausted and the run ends.
    async fn next_tick(&mut self) -> bool;
}

/// Fetches one status snapshot for a task.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusReply, TransportError>;
}

/// Receives the results of a run.
///
/// Called with the run gate held: implementations must not call back into the
/// [`Poller`] synchronously.
pub trait PollSink: Send + Sync {
    fn snapshot(&self, task_id: &TaskId, snapshot: &TaskSnapshot);
    fn terminal(&self, task_id: &TaskId, outcome: PollOutcome);
}

/// Ticks from a `tokio::time::interval`; the interval is created lazily inside the runtime.
pub struct IntervalTicks {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }
}

#[async_trait::async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> bool {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        interval.tick().await;
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollSettings {
    /// End the run with [`PollOutcome::Stalled`] when no snapshot arrived for this long.
    pub stall_timeout: Option<Duration>,
}

#[derive(Default)]
struct RunGate {
    closed: Mutex<bool>,
}

impl RunGate {
    fn close(&self) {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    fn is_open(&self) -> bool {
        !*self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `deliver` if the gate is still open; `last` closes it in the same step.
    fn pass(&self, last: bool, deliver: impl FnOnce()) -> bool {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return false;
        }
        if last {
            *closed = true;
        }
        deliver();
        true
    }
}

struct ActiveRun {
    task_id: TaskId,
    gate: Arc<RunGate>,
    cancel: CancellationToken,
}

/// At most one run is active per poller.
pub struct Poller {
    runtime: Handle,
    source: Arc<dyn StatusSource>,
    settings: PollSettings,
    active: Option<ActiveRun>,
}

impl Poller {
    pub fn new(runtime: Handle, source: Arc<dyn StatusSource>, settings: PollSettings) -> Self {
        Self {
            runtime,
            source,
            settings,
            active: None,
        }
    }

    /// Starts polling `task_id`, superseding any previous run.
    pub fn start(&mut self, task_id: TaskId, ticks: Box<dyn TickSource>, sink: Arc<dyn PollSink>) {
        self.stop();
        engine_info!(task = task_id; "polling started");

        let gate = Arc::new(RunGate::default());
        let cancel = CancellationToken::new();
        let run = PollRun {
            task_id: task_id.clone(),
            source: self.source.clone(),
            sink,
            gate: gate.clone(),
            cancel: cancel.clone(),
            stall_timeout: self.settings.stall_timeout,
        };
        self.runtime.spawn(run.run(ticks));
        self.active = Some(ActiveRun {
            task_id,
            gate,
            cancel,
        });
    }

    /// Stops the current run. Idempotent.
    pub fn stop(&mut self) {
        if let Some(run) = self.active.take() {
            run.gate.close();
            run.cancel.cancel();
            engine_info!(task = run.task_id; "polling stopped");
        }
    }

    /// Task of a run that has neither been stopped nor reached a terminal state.
    pub fn active_task(&self) -> Option<&TaskId> {
        self.active
            .as_ref()
            .filter(|run| run.gate.is_open())
            .map(|run| &run.task_id)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PollRun {
    task_id: TaskId,
    source: Arc<dyn StatusSource>,
    sink: Arc<dyn PollSink>,
    gate: Arc<RunGate>,
    cancel: CancellationToken,
    stall_timeout: Option<Duration>,
}

impl PollRun {
    async fn run(self, mut ticks: Box<dyn TickSource>) {
        // Capacity 1: at most one fetch is ever in flight.
        let (done_tx, mut done_rx) = mpsc::channel::<Result<StatusReply, TransportError>>(1);
        let mut fetching = false;
        let mut last_heard = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(result) = done_rx.recv() => {
                    fetching = false;
                    match result {
                        Ok(reply) => {
                            last_heard = Instant::now();
                            if self.deliver(reply) {
                                break;
                            }
                        }
                        Err(err) => {
                            engine_warn!(task = self.task_id; "status poll failed, retrying next tick: {}", err);
                        }
                    }
                }
                more = ticks.next_tick() => {
                    if !more {
                        engine_debug!(task = self.task_id; "tick source exhausted");
                        break;
                    }
                    if self.is_stalled(last_heard) {
                        engine_warn!(task = self.task_id; "no status for {:?}, giving up", self.stall_timeout);
                        self.gate.pass(true, || self.sink.terminal(&self.task_id, PollOutcome::Stalled));
                        break;
                    }
                    if fetching {
                        engine_debug!(task = self.task_id; "previous fetch pending, skipping tick");
                        continue;
                    }
                    fetching = true;
                    let source = self.source.clone();
                    let task_id = self.task_id.clone();
                    let done_tx = done_tx.clone();
                    tokio::spawn(async move {
                        let result = source.fetch_status(&task_id).await;
                        // The run may be gone; its result is discarded then.
                        let _ = done_tx.send(result).await;
                    });
                }
            }
        }
    }

    /// Hands a reply to the sink. Returns `true` when the run is over.
    fn deliver(&self, reply: StatusReply) -> bool {
        match reply {
            StatusReply::Snapshot(snapshot) if snapshot.status.is_terminal() => {
                engine_info!(task = self.task_id; "terminal status {}", snapshot.status.as_str());
                self.gate.pass(true, || {
                    self.sink.snapshot(&self.task_id, &snapshot);
                    self.sink
                        .terminal(&self.task_id, PollOutcome::Finished(snapshot.clone()));
                });
                true
            }
            StatusReply::Snapshot(snapshot) => {
                !self.gate.pass(false, || self.sink.snapshot(&self.task_id, &snapshot))
            }
            StatusReply::Expired => {
                engine_warn!(task = self.task_id; "backend no longer knows the task");
                self.gate
                    .pass(true, || self.sink.terminal(&self.task_id, PollOutcome::Expired));
                true
            }
        }
    }

    fn is_stalled(&self, last_heard: Instant) -> bool {
        self.stall_timeout
            .is_some_and(|limit| last_heard.elapsed() >= limit)
    }
}
