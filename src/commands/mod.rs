//! One-shot CLI command handlers.
//!
//! Each command edits the persisted alarm store (or just reads it) and then
//! nudges a running daemon over SIGUSR2 so the armed timers catch up with
//! the store. No daemon holding the lock is an expected situation, not an
//! error: the store edit is durable and the daemon re-arms from it at
//! startup.

pub mod cancel;
pub mod list;
pub mod rearm;
pub mod schedule;
pub mod sounds;

use anyhow::Result;

/// Signal a running daemon to re-arm from the store, reporting what
/// happened. Returns whether a daemon was notified.
pub(crate) fn notify_daemon() -> Result<bool> {
    let lock_path = crate::lock::default_lock_path();
    if crate::lock::notify_rearm(&lock_path)? {
        log_indented!("Notified running daemon to re-arm");
        Ok(true)
    } else {
        log_indented!("No daemon running; alarms will arm when one starts");
        Ok(false)
    }
}
