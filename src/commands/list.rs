//! Implementation of the list command.

use anyhow::Result;

use crate::store::AlarmStore;

pub fn handle_list_command() -> Result<()> {
    log_version!();

    let store = AlarmStore::open(AlarmStore::default_path()?)?;
    let alarms = store.list_all()?;

    if alarms.is_empty() {
        log_block_start!("No alarms stored");
        log_end!();
        return Ok(());
    }

    log_block_start!("{} alarm(s) stored", alarms.len());
    for alarm in alarms {
        let state = if alarm.enabled { "enabled" } else { "disabled" };
        let sound = if alarm.sound.is_empty() {
            "default sound".to_string()
        } else {
            crate::sounds::display_name(&alarm.sound).to_string()
        };
        log_indented!(
            "{}: {} [{}] {}",
            alarm.id,
            alarm.display_time(),
            state,
            sound
        );
    }
    log_end!();
    Ok(())
}
