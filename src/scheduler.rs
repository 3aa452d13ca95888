//! Alarm scheduling over the timer backend.
//!
//! Each enabled alarm owns exactly two armed triggers: the light trigger at
//! the alarm time minus the configured lead, and the sound trigger at the
//! alarm time itself. Request identifiers are derived arithmetically from
//! the alarm id (2n for light, 2n+1 for sound), so scheduling is idempotent:
//! re-scheduling the same alarm addresses the same identifiers and replaces
//! the previous pair instead of accumulating triggers.

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::backend::TimerBackend;
use crate::store::{Alarm, AlarmStore};
use crate::time_source;
use crate::trigger::{self, TriggerTimes};

/// Deterministic timer slot identifier derived from an alarm id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub i64);

impl RequestId {
    /// The (light, sound) identifier pair for alarm `n`: 2n and 2n+1.
    /// Distinct alarm ids can never collide on a request identifier.
    pub fn pair(alarm_id: i64) -> (RequestId, RequestId) {
        (RequestId(2 * alarm_id), RequestId(2 * alarm_id + 1))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of an alarm's two triggers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Light,
    Sound,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Light => write!(f, "light"),
            Phase::Sound => write!(f, "sound"),
        }
    }
}

/// Everything a fired trigger carries to the daemon loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPayload {
    pub phase: Phase,
    pub alarm_id: String,
    pub sound: String,
    pub theme: String,
}

/// Result of scheduling one alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub triggers: TriggerTimes,
    /// False when the platform denied exact-timer privileges and the pair
    /// was armed best-effort instead.
    pub exact: bool,
}

/// Arms and disarms trigger pairs for alarms.
pub struct AlarmScheduler {
    timers: Box<dyn TimerBackend>,
    lead: Duration,
}

impl AlarmScheduler {
    pub fn new(timers: Box<dyn TimerBackend>, lead: Duration) -> Self {
        Self { timers, lead }
    }

    /// Arm the trigger pair for `alarm`, replacing any pair previously armed
    /// for the same alarm id.
    ///
    /// Validation failures surface before anything is armed. A backend that
    /// cannot grant exact timing still gets both triggers, flagged in the
    /// outcome.
    pub fn schedule(&mut self, alarm: &Alarm) -> Result<ScheduleOutcome> {
        let numeric = alarm.numeric_id()?;
        let triggers = trigger::resolve_pair(
            alarm.hour,
            alarm.minute,
            alarm.am_pm,
            self.lead,
            time_source::now(),
        )?;

        let (light_id, sound_id) = RequestId::pair(numeric);
        // Replace-don't-accumulate: disarm whatever the ids currently hold.
        self.timers.cancel(light_id);
        self.timers.cancel(sound_id);

        let exact = self.timers.supports_exact();
        if !exact {
            log_warning!(
                "Exact timer privilege unavailable; alarm {} armed best-effort",
                alarm.id
            );
        }

        self.timers.arm(
            light_id,
            triggers.light,
            TriggerPayload {
                phase: Phase::Light,
                alarm_id: alarm.id.clone(),
                sound: alarm.sound.clone(),
                theme: alarm.theme.clone(),
            },
        )?;
        self.timers.arm(
            sound_id,
            triggers.sound,
            TriggerPayload {
                phase: Phase::Sound,
                alarm_id: alarm.id.clone(),
                sound: alarm.sound.clone(),
                theme: alarm.theme.clone(),
            },
        )?;

        log_indented!(
            "Alarm {}: light {} / sound {}",
            alarm.id,
            triggers.light.format("%Y-%m-%d %H:%M"),
            triggers.sound.format("%Y-%m-%d %H:%M")
        );
        Ok(ScheduleOutcome { triggers, exact })
    }

    /// Disarm both triggers for `alarm_id`. Unconditional and idempotent:
    /// disarming an alarm with nothing armed is a no-op, so a cancel racing
    /// a reboot or a duplicate cancel always leaves the pair disarmed.
    pub fn cancel(&mut self, alarm_id: i64) {
        let (light_id, sound_id) = RequestId::pair(alarm_id);
        self.timers.cancel(light_id);
        self.timers.cancel(sound_id);
    }

    /// Re-arm every enabled alarm in `store`, as after a reboot.
    ///
    /// Per-alarm isolation: one malformed record is logged and skipped, the
    /// rest are still armed. Returns the number of alarms re-armed.
    pub fn rearm_all(&mut self, store: &AlarmStore) -> Result<usize> {
        let mut armed = 0;
        for alarm in store.list_all()? {
            if !alarm.enabled {
                continue;
            }
            match self.schedule(&alarm) {
                Ok(_) => armed += 1,
                Err(e) => {
                    log_warning!("Skipping alarm {}: {e}", alarm.id);
                }
            }
        }
        Ok(armed)
    }
}
