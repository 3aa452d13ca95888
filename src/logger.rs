//! Structured logging system with visual formatting.
//!
//! This module provides the logging macros used across dawnr. Output is
//! structured with Unicode box drawing characters so related lines read as
//! one block: the daemon startup header, a scheduled alarm with its two
//! trigger times, a ramp's progress summary, and so on.
//!
//! The logger supports runtime enable/disable so tests can run quietly.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Main logging interface providing structured output formatting.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`** — initiates a new conceptual block (an alarm
///   scheduled, a ramp starting, a phase firing). Prepends an empty pipe
///   `┃` for spacing, then prints `┣ message`. Follow-up lines in the same
///   block use `log_decorated!` or `log_indented!`.
/// - **`log_decorated!`** — `┣ message`; continuation of a block or a
///   standalone single-line status.
/// - **`log_indented!`** — `┃   message`; nested details (trigger times,
///   per-alarm results of a rearm pass).
/// - **`log_pipe!`** — a single empty `┃` line for vertical spacing, mainly
///   before `log_warning!`/`log_error!` when they open a new block.
/// - **`log_version!`** — the startup header, once at daemon start.
/// - **`log_end!`** — the final `╹` marker, once at shutdown.
/// - **`log_warning!`, `log_error!`** — semantic `[LEVEL]` prefixed
///   messages inside the pipe structure.
/// - **`log_error_exit!`** — terminal `┗[ERROR]` line for fatal exits.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    ///
    /// Used to keep test output clean.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Timestamp prefix shown when running against a simulated clock, so
    /// log lines can be correlated with simulated wall-clock time.
    /// Empty for the real clock.
    pub fn get_timestamp_prefix() -> String {
        if crate::time_source::is_simulated() {
            format!("[{}] ", crate::time_source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

// Public function that routes output (needed by macros)
pub fn write_output(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

// # Logging Macros

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("{prefix}┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::logger::write_output(&format!("{prefix}┣ {expr}\n"));
        }
    }};
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("{prefix}┃   {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::logger::write_output(&format!("{prefix}┃   {expr}\n"));
        }
    }};
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Log a block start message, initiating a new conceptual block.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("{prefix}┃\n{prefix}┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::logger::write_output(&format!("{prefix}┃\n{prefix}┣ {expr}\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("{prefix}┏ dawnr v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}

/// Log a warning message with pipe prefix and yellow-colored text.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!(
                "{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"
            ));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::logger::write_output(&format!(
                "{prefix}┣[\x1b[33mWARNING\x1b[0m] {expr}\n"
            ));
        }
    }};
}

/// Log an error message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!(
                "{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"
            ));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::logger::write_output(&format!(
                "{prefix}┣[\x1b[31mERROR\x1b[0m] {expr}\n"
            ));
        }
    }};
}

/// Log an error message with a pipe prefix and terminal corner (standalone).
/// Indicates flow termination, similar to log_block_start! in shape.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!(
                "{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"
            ));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::logger::write_output(&format!(
                "{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {expr}\n"
            ));
        }
    }};
}
