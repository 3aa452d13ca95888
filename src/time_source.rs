//! Time source abstraction for supporting both real and pinned time.
//!
//! Trigger resolution and rearming are pure functions of "now", but the
//! daemon and the one-shot commands need a single place to ask for it. The
//! trait-based global here defaults to the system clock; tests can install
//! a pinned clock so time-dependent behavior can be exercised without
//! depending on when the suite happens to run.

use chrono::{DateTime, Local};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};

/// Global time source instance, defaults to RealTimeSource
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Local>;

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses the actual system clock
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Pinned time source for tests: `now()` returns a fixed instant.
pub struct FixedTimeSource {
    current: Mutex<DateTime<Local>>,
}

impl FixedTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap()
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Initialize the global time source (call once at startup)
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Get the current time from the global time source
pub fn now() -> DateTime<Local> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

/// Check if we're running against a pinned clock
pub fn is_simulated() -> bool {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .is_simulated()
}
