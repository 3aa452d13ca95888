//! Platform boundary traits and implementations.
//!
//! The scheduler and ramp engine never touch the operating system directly;
//! they talk through the trait seams here. `TimerBackend` is the wake-timer
//! subsystem that holds armed triggers, `BrightnessSink` the process-wide
//! screen brightness, and `VolumeSink` the gain handed to the external audio
//! player. Production implementations live in the submodules; tests
//! substitute mocks.

pub mod audio;
pub mod backlight;
pub mod timers;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::scheduler::{RequestId, TriggerPayload};

pub use audio::PlayerGain;
pub use backlight::SysfsBacklight;
pub use timers::InProcessTimers;

/// One-shot wake-capable timer subsystem.
///
/// Armed triggers are addressed by deterministic request identifiers; arming
/// an identifier that is already armed replaces it. A fire instant in the
/// past delivers immediately rather than erroring.
#[cfg_attr(test, mockall::automock)]
pub trait TimerBackend: Send {
    /// Arm (or re-arm) a one-shot trigger.
    fn arm(
        &mut self,
        id: RequestId,
        fires_at: DateTime<Local>,
        payload: TriggerPayload,
    ) -> Result<()>;

    /// Disarm a trigger. Unconditional: cancelling an identifier with
    /// nothing armed is a no-op.
    fn cancel(&mut self, id: RequestId);

    /// Whether the platform grants exact-timer privileges. When false the
    /// backend still arms timers, with best-effort timing.
    fn supports_exact(&self) -> bool;
}

/// Process-wide screen brightness on the raw 0-255 scale.
#[cfg_attr(test, mockall::automock)]
pub trait BrightnessSink: Send {
    fn get(&self) -> Result<u32>;
    fn set(&mut self, raw: u32) -> Result<()>;
}

/// Gain applied to the alarm audio stream (0.0-1.0).
#[cfg_attr(test, mockall::automock)]
pub trait VolumeSink: Send {
    fn set_gain(&mut self, gain: f32) -> Result<()>;
}
