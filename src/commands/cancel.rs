//! Implementation of the cancel command.
//!
//! Disables the alarm record and tells the daemon to re-arm, which disarms
//! the pair. An id the store never held is reported as not found, but the
//! daemon is still nudged so a stray armed pair gets cleared either way.

use anyhow::Result;

use crate::store::{AlarmNotFoundError, AlarmStore};

pub fn handle_cancel_command(id: &str) -> Result<()> {
    log_version!();

    let store = AlarmStore::open(AlarmStore::default_path()?)?;
    let known = match store.get(id)? {
        Some(mut alarm) => {
            alarm.enabled = false;
            store.upsert(&alarm)?;
            log_block_start!("Cancelled alarm {} ({})", alarm.id, alarm.display_time());
            true
        }
        None => {
            log_block_start!("No alarm with id {id} in the store");
            false
        }
    };

    // Disarm regardless: cancel must leave nothing armed for this id.
    super::notify_daemon()?;
    log_end!();

    if !known {
        return Err(AlarmNotFoundError(id.to_string()).into());
    }
    Ok(())
}
