//! Progress reconciliation: turns raw snapshots into a smoothed percentage plus
//! human-readable annotations.
//!
//! Animation is a pure function of elapsed time ([`ProgressAnimation::sample`]);
//! whoever drives rendering decides how often to sample it.

use std::time::Duration;

use crate::{TaskSnapshot, TaskStatus};

/// Length of one progress animation.
pub const ANIMATION_DURATION: Duration = Duration::from_millis(300);

const SPEED_UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];

/// Ease-out cubic tween from `start` to `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressAnimation {
    start: f64,
    target: f64,
    duration: Duration,
}

impl ProgressAnimation {
    pub fn new(start: f64, target: f64, duration: Duration) -> Self {
        Self {
            start: clamp_percent(start),
            target: clamp_percent(target),
            duration,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Displayed percentage `elapsed` into the animation. The final frame is exactly `target`.
    pub fn sample(&self, elapsed: Duration) -> f64 {
        if self.is_finished(elapsed) {
            return self.target;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t).powi(3);
        self.start + (self.target - self.start) * eased
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

/// Result of reconciling one snapshot against what is on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub animation: ProgressAnimation,
    pub label: String,
    pub info: String,
}

/// Maps `snapshot` onto the previously displayed percentage.
///
/// A snapshot without `progress` keeps the previous value, except `completed`
/// which always lands on 100.
pub fn reconcile(previous_displayed: f64, snapshot: &TaskSnapshot) -> DisplayUpdate {
    let target = match (snapshot.progress, &snapshot.status) {
        (Some(progress), _) => progress,
        (None, TaskStatus::Completed) => 100.0,
        (None, _) => previous_displayed,
    };
    DisplayUpdate {
        animation: ProgressAnimation::new(previous_displayed, target, ANIMATION_DURATION),
        label: status_label(&snapshot.status),
        info: info_line(snapshot),
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub fn status_label(status: &TaskStatus) -> String {
    match status {
        TaskStatus::Downloading => "Downloading…".to_string(),
        TaskStatus::Processing => "Processing…".to_string(),
        other => other.as_str().to_string(),
    }
}

/// `"<speed> • <eta> remaining"`, or empty when no positive speed is reported.
pub fn info_line(snapshot: &TaskSnapshot) -> String {
    let Some(speed) = snapshot.speed_bytes_per_sec.filter(|speed| *speed > 0.0) else {
        return String::new();
    };
    match snapshot.eta_seconds.filter(|eta| *eta >= 0.0) {
        Some(eta) => format!("{} • {} remaining", format_speed(speed), format_eta(eta)),
        None => format_speed(speed),
    }
}

pub fn format_speed(bytes_per_sec: f64) -> String {
    let mut value = bytes_per_sec;
    let mut unit = 0;
    while value >= 1024.0 && unit < SPEED_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", SPEED_UNITS[unit])
}

pub fn format_eta(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        format!("{total}s")
    } else if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RunningAnimation {
    plan: ProgressAnimation,
    elapsed: Duration,
}

/// Client-owned display state for the active task. At most one animation runs at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressDisplay {
    last_displayed: f64,
    running: Option<RunningAnimation>,
    label: String,
    info: String,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles `snapshot` and starts its animation. An animation still in flight
    /// is completed first so the new one starts where the previous one ends.
    pub fn apply(&mut self, snapshot: &TaskSnapshot) -> ProgressAnimation {
        self.settle();
        let update = reconcile(self.last_displayed, snapshot);
        self.label = update.label;
        self.info = update.info;
        self.running = Some(RunningAnimation {
            plan: update.animation,
            elapsed: Duration::ZERO,
        });
        update.animation
    }

    /// Advances the running animation. Returns `true` if the displayed value changed.
    pub fn advance(&mut self, delta: Duration) -> bool {
        let Some(running) = self.running.as_mut() else {
            return false;
        };
        let before = running.plan.sample(running.elapsed);
        running.elapsed = running.elapsed.saturating_add(delta);
        let after = running.plan.sample(running.elapsed);
        if running.plan.is_finished(running.elapsed) {
            self.settle();
        }
        before != after
    }

    pub fn displayed(&self) -> f64 {
        match &self.running {
            Some(running) => running.plan.sample(running.elapsed),
            None => self.last_displayed,
        }
    }

    /// End value of the last completed animation.
    pub fn last_displayed(&self) -> f64 {
        self.last_displayed
    }

    pub fn is_animating(&self) -> bool {
        self.running.is_some()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn settle(&mut self) {
        if let Some(running) = self.running.take() {
            self.last_displayed = running.plan.target();
        }
    }
}
