//! Implementation of the rearm command.
//!
//! Mirrors what a boot-completed hook does on mobile platforms: every
//! enabled alarm in the store gets its trigger pair re-armed. With a daemon
//! running this is just a signal; without one there is nothing to arm into,
//! which is reported rather than treated as a failure.

use anyhow::Result;

use crate::store::AlarmStore;

pub fn handle_rearm_command() -> Result<()> {
    log_version!();

    let store = AlarmStore::open(AlarmStore::default_path()?)?;
    let enabled = store
        .list_all()?
        .into_iter()
        .filter(|a| a.enabled)
        .count();

    log_block_start!("{enabled} enabled alarm(s) in the store");
    super::notify_daemon()?;
    log_end!();
    Ok(())
}
