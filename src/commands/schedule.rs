//! Implementation of the schedule command.
//!
//! Validates the requested time, upserts the alarm record, prints the
//! resolved trigger pair, and pokes a running daemon to arm it.

use anyhow::Result;
use chrono::Duration;

use crate::config::Config;
use crate::store::{Alarm, AlarmStore};
use crate::trigger::{self, Meridiem};

/// Everything `dawnr schedule` accepts from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleParams {
    pub id: String,
    pub hour: u32,
    pub minute: u32,
    pub meridiem: Meridiem,
    pub sound: Option<String>,
    pub theme: Option<String>,
    pub repeat_days: Vec<String>,
}

pub fn handle_schedule_command(params: ScheduleParams) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    let lead = Duration::minutes(config.light_lead_minutes() as i64);

    // Validate and resolve before touching the store so malformed input
    // changes nothing.
    let triggers = trigger::resolve_pair(
        params.hour,
        params.minute,
        params.meridiem,
        lead,
        crate::time_source::now(),
    )?;

    let sound = params.sound.unwrap_or_default();
    if !sound.is_empty() && !crate::sounds::is_known(&sound) {
        log_warning!("Unknown sound '{sound}'; the default sound will play");
    }

    let alarm = Alarm {
        id: params.id,
        hour: params.hour,
        minute: params.minute,
        am_pm: params.meridiem,
        sound,
        theme: params.theme.unwrap_or_default(),
        enabled: true,
        repeat_days: params.repeat_days,
    };
    alarm.numeric_id()?;

    let store = AlarmStore::open(AlarmStore::default_path()?)?;
    store.upsert(&alarm)?;

    log_block_start!("Scheduled alarm {} for {}", alarm.id, alarm.display_time());
    log_indented!("Light phase: {}", triggers.light.format("%Y-%m-%d %H:%M"));
    log_indented!("Sound phase: {}", triggers.sound.format("%Y-%m-%d %H:%M"));
    super::notify_daemon()?;
    log_end!();
    Ok(())
}
