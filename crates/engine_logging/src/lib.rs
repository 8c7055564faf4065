#![deny(missing_docs)]
//! Shared logging utilities for the glossa workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line emitted
//! through the macros is prefixed with the current poll tick so diagnostics
//! from the synchronizer can be correlated with the status request that
//! produced them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

/// Number of status requests issued by the poll synchronizer so far.
///
/// Polling runs on a tokio worker that may hop threads, so this is a process
/// wide atomic rather than thread-local storage.
static POLL_TICK: AtomicU64 = AtomicU64::new(0);

/// Sets the poll tick counter. The synchronizer calls this once per tick.
pub fn set_poll_tick(tick: u64) {
    POLL_TICK.store(tick, Ordering::Relaxed);
}

/// Retrieves the poll tick counter.
/// Returns 0 before the first status request.
pub fn current_poll_tick() -> u64 {
    POLL_TICK.load(Ordering::Relaxed)
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[tick {}] {}", $crate::current_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[tick {}] {}", $crate::current_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[tick {}] {}", $crate::current_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[tick {}] {}", $crate::current_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[tick {}] {}", $crate::current_poll_tick(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// Safe to call from every test: only the first call installs the logger.
pub fn initialize_for_tests() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

        let level = if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };

        // Another harness may have installed a logger already.
        let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
    });
}
