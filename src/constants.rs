//! Shared constants for the alarm scheduler and ramp engine.
//!
//! Values that describe the wake-up progression itself (curve endpoints,
//! tick periods, the 20-minute light lead) live here together with the
//! validation ranges used by the configuration system.

/// Minutes the light phase starts before the configured alarm time.
/// The brightness ramp runs for exactly this long.
pub const DEFAULT_LIGHT_LEAD_MINUTES: u64 = 20;
pub const MINIMUM_LIGHT_LEAD_MINUTES: u64 = 5;
pub const MAXIMUM_LIGHT_LEAD_MINUTES: u64 = 120;

/// Brightness ramp tick period in milliseconds.
pub const DEFAULT_LIGHT_TICK_MS: u64 = 2000;
pub const MINIMUM_LIGHT_TICK_MS: u64 = 500;
pub const MAXIMUM_LIGHT_TICK_MS: u64 = 10_000;

/// Volume ramp total duration in seconds.
pub const DEFAULT_VOLUME_RAMP_SECONDS: u64 = 60;
pub const MINIMUM_VOLUME_RAMP_SECONDS: u64 = 10;
pub const MAXIMUM_VOLUME_RAMP_SECONDS: u64 = 300;

/// Volume ramp tick period in milliseconds. The volume curve is
/// tick-count-driven, so changing this changes how fast full volume
/// is reached.
pub const DEFAULT_VOLUME_TICK_MS: u64 = 1000;
pub const MINIMUM_VOLUME_TICK_MS: u64 = 250;
pub const MAXIMUM_VOLUME_TICK_MS: u64 = 5_000;

/// Brightness curve endpoints (raw 0-255 scale, matching the step curve
/// `10 + floor(progress * 100) * 245 / 100`).
pub const BRIGHTNESS_FLOOR: u32 = 10;
pub const BRIGHTNESS_CEILING: u32 = 255;
pub const BRIGHTNESS_SPAN: u32 = BRIGHTNESS_CEILING - BRIGHTNESS_FLOOR;

/// Volume curve: starts at 50% gain, adds 1.5% per tick, clamps at 100%.
pub const VOLUME_FLOOR: f32 = 0.5;
pub const VOLUME_STEP_PER_TICK: f32 = 0.015;
pub const VOLUME_CEILING: f32 = 1.0;

/// Consecutive unwanted ramp restarts tolerated within one alarm episode
/// before the engine gives up.
pub const DEFAULT_MAX_RAMP_RESTARTS: u32 = 3;
pub const MAXIMUM_RAMP_RESTARTS: u32 = 10;

/// Default sound manifest key used when an alarm carries none.
pub const DEFAULT_SOUND_KEY: &str = "classicalarm_digital";

/// Upper bound on a single timer-table wait. Keeps the dispatcher
/// re-checking wall-clock deadlines so a suspended and resumed machine
/// fires overdue timers promptly.
pub const TIMER_WAIT_CAP_SECS: u64 = 60;
