#![deny(missing_docs)]
//! Shared logging utilities for the recipe sync workspace.
//!
//! This crate provides the `sync_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Messages logged while
//! a sync pass is in flight are prefixed with that pass number so interleaved
//! scheduler and manual runs can be told apart in the log.

use std::sync::atomic::{AtomicU64, Ordering};

#[doc(hidden)]
pub mod __private {
    pub use log;
}

/// Number of passes started since process start.
static PASS_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Pass currently in flight, 0 when idle.
static CURRENT_PASS: AtomicU64 = AtomicU64::new(0);

/// Marks the start of a new sync pass and returns its number (starting at 1).
/// This should be called by the orchestrator once per pass.
pub fn begin_pass() -> u64 {
    let id = PASS_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    CURRENT_PASS.store(id, Ordering::Relaxed);
    id
}

/// Clears the in-flight pass number.
pub fn end_pass() {
    CURRENT_PASS.store(0, Ordering::Relaxed);
}

/// Retrieves the number of the pass currently in flight.
/// Returns 0 if no pass is running.
pub fn current_pass_id() -> u64 {
    CURRENT_PASS.load(Ordering::Relaxed)
}

/// Prefix prepended by the `sync_*` macros; empty outside a pass.
#[doc(hidden)]
pub fn pass_prefix() -> String {
    match current_pass_id() {
        0 => String::new(),
        id => format!("[pass {id}] "),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! sync_trace {
    ($($arg:tt)*) => {{
        $crate::__private::log::trace!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! sync_info {
    ($($arg:tt)*) => {{
        $crate::__private::log::info!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! sync_debug {
    ($($arg:tt)*) => {{
        $crate::__private::log::debug!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! sync_warn {
    ($($arg:tt)*) => {{
        $crate::__private::log::warn!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! sync_error {
    ($($arg:tt)*) => {{
        $crate::__private::log::error!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
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
