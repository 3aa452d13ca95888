//! Wall-clock trigger resolution for alarms.
//!
//! An alarm is stored as a 12-hour time (hour, minute, AM/PM). This module
//! turns that into the next absolute `DateTime<Local>` at which it should
//! fire: today if the time is still ahead of "now", otherwise tomorrow.
//! The light phase trigger is derived from the sound trigger by subtracting
//! the configured lead; no floor is applied, so an alarm set within the lead
//! window produces a light trigger in the past, which the timer backend
//! fires immediately.
//!
//! `repeat_days` on an alarm is accepted and persisted but deliberately not
//! consulted here: every alarm resolves as one-shot, matching the observed
//! behavior this design preserves.

use anyhow::{Result, bail};
use chrono::{DateTime, Days, Duration, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// AM/PM half of a 12-hour clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meridiem {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl std::fmt::Display for Meridiem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Meridiem::Am => write!(f, "AM"),
            Meridiem::Pm => write!(f, "PM"),
        }
    }
}

impl std::str::FromStr for Meridiem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AM" => Ok(Meridiem::Am),
            "PM" => Ok(Meridiem::Pm),
            other => bail!("expected AM or PM, got '{other}'"),
        }
    }
}

/// Malformed scheduling input (out-of-range hour/minute, missing id).
/// Surfaced synchronously to the caller with no partial state change.
#[derive(Debug)]
pub struct InvalidArgumentError(pub String);

impl std::fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid argument: {}", self.0)
    }
}

impl std::error::Error for InvalidArgumentError {}

/// The two absolute instants armed for one alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTimes {
    /// Start of the brightness ramp, `lead` before the alarm time.
    /// May lie in the past when the alarm was set inside the lead window.
    pub light: DateTime<Local>,
    /// The user's configured alarm time; start of the sound phase.
    pub sound: DateTime<Local>,
}

/// Convert a 12-hour clock time to 24-hour form.
///
/// PM adds 12 except for 12 PM; 12 AM maps to hour 0.
fn to_24_hour(hour: u32, meridiem: Meridiem) -> u32 {
    match meridiem {
        Meridiem::Pm if hour != 12 => hour + 12,
        Meridiem::Am if hour == 12 => 0,
        _ => hour,
    }
}

/// Resolve the next absolute instant at which `hour:minute meridiem` occurs
/// strictly after `now`.
///
/// Builds the candidate on `now`'s calendar day at the resolved time with
/// seconds zeroed; if that candidate is not in the future, it advances one
/// calendar day at a time (calendar-aware: month/year rollover and DST gaps
/// are handled by the local timezone resolution).
pub fn resolve(
    hour: u32,
    minute: u32,
    meridiem: Meridiem,
    now: DateTime<Local>,
) -> Result<DateTime<Local>> {
    if !(1..=12).contains(&hour) {
        return Err(InvalidArgumentError(format!("hour {hour} out of range 1-12")).into());
    }
    if minute > 59 {
        return Err(InvalidArgumentError(format!("minute {minute} out of range 0-59")).into());
    }

    let target_hour = to_24_hour(hour, meridiem);

    // Walk forward day by day until the local time exists and is in the
    // future. Offset 0 or 1 in every case except a DST gap landing exactly
    // on the target time, where the next day is used.
    for day_offset in 0..3u64 {
        let date = now
            .date_naive()
            .checked_add_days(Days::new(day_offset))
            .ok_or_else(|| InvalidArgumentError("calendar overflow".into()))?;
        let naive = match date.and_hms_opt(target_hour, minute, 0) {
            Some(naive) => naive,
            None => continue,
        };
        let candidate = match Local.from_local_datetime(&naive).earliest() {
            Some(dt) => dt,
            None => continue, // nonexistent local time (spring-forward gap)
        };
        if candidate > now {
            return Ok(candidate);
        }
    }

    // Unreachable with a sane local calendar; three consecutive days cannot
    // all resolve to the past.
    bail!("could not resolve a future trigger for {hour}:{minute:02} {meridiem}")
}

/// Resolve the light/sound trigger pair for an alarm time.
///
/// `light = sound - lead`, with no floor against `now`.
pub fn resolve_pair(
    hour: u32,
    minute: u32,
    meridiem: Meridiem,
    lead: Duration,
    now: DateTime<Local>,
) -> Result<TriggerTimes> {
    let sound = resolve(hour, minute, meridiem, now)?;
    Ok(TriggerTimes {
        light: sound - lead,
        sound,
    })
}
