#![deny(missing_docs)]
//! Shared logging utilities for the rewind workspace.
//!
//! This crate provides the `rewind_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every macro logs under
//! the [`TARGET`] target so scheduler diagnostics can be filtered as a group.

/// Log target shared by all scheduler diagnostics.
pub const TARGET: &str = "rewind";

/// Logs a trace-level message under the shared target.
#[macro_export]
macro_rules! rewind_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the shared target.
///
/// Skipped attempts (disabled, not a watch page, already handled, stale
/// generation) are reported at this level.
#[macro_export]
macro_rules! rewind_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the shared target.
#[macro_export]
macro_rules! rewind_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the shared target.
#[macro_export]
macro_rules! rewind_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the shared target.
#[macro_export]
macro_rules! rewind_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
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
