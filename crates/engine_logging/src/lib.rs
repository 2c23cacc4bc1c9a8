#![deny(missing_docs)]
//! Shared logging utilities for the grabber workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.
//!
//! Every macro accepts an optional `task = <id>;` prefix which scopes the line
//! to one download task:
//!
//! ```ignore
//! engine_warn!(task = task_id; "status poll failed: {}", err);
//! ```

#[doc(hidden)]
pub use log as __log;

/// Formats the prefix used for task-scoped log lines.
pub fn task_prefix(task: &dyn std::fmt::Display) -> String {
    format!("[task {task}]")
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    (task = $task:expr; $($arg:tt)*) => {{
        $crate::__log::trace!("{} {}", $crate::task_prefix(&$task), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    (task = $task:expr; $($arg:tt)*) => {{
        $crate::__log::info!("{} {}", $crate::task_prefix(&$task), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    (task = $task:expr; $($arg:tt)*) => {{
        $crate::__log::debug!("{} {}", $crate::task_prefix(&$task), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    (task = $task:expr; $($arg:tt)*) => {{
        $crate::__log::warn!("{} {}", $crate::task_prefix(&$task), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    (task = $task:expr; $($arg:tt)*) => {{
        $crate::__log::error!("{} {}", $crate::task_prefix(&$task), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        $crate::__log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_prefix_wraps_identifier() {
        assert_eq!(task_prefix(&"t1"), "[task t1]");
    }

    #[test]
    fn macros_accept_task_scope() {
        initialize_for_tests();
        let task = "t42";
        engine_info!(task = task; "polling started every {}ms", 500);
        engine_debug!("plain line {}", 1);
    }
}
