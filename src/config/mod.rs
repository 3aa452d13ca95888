//! Configuration for the dawnr daemon.
//!
//! Settings load from `dawnr.toml` under **XDG_CONFIG_HOME**/dawnr/, with a
//! commented default file generated on first run. Every field is optional
//! in the file; missing fields take the built-in defaults.
//!
//! ```toml
//! #[Ramps]
//! light_lead_minutes = 20    # Brightness ramp length before the alarm (5-120)
//! light_tick_ms = 2000       # Brightness ramp tick period in ms (500-10000)
//! volume_ramp_seconds = 60   # Sound phase ramp duration in seconds (10-300)
//! volume_tick_ms = 1000      # Volume ramp tick period in ms (250-5000)
//! max_ramp_restarts = 3      # Ramp restart budget per alarm episode (0-10)
//!
//! #[Devices]
//! # backlight_device = "intel_backlight"  # sysfs name; omit to auto-detect
//! default_sound = "classicalarm_digital"  # Sound when an alarm names none
//! ```
//!
//! Out-of-range values fail loading with a message naming the field and its
//! accepted range, rather than being silently clamped.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::sounds;

#[cfg(test)]
mod tests;

/// Parsed `dawnr.toml`. All fields optional; accessors apply defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub light_lead_minutes: Option<u64>,
    pub light_tick_ms: Option<u64>,
    pub volume_ramp_seconds: Option<u64>,
    pub volume_tick_ms: Option<u64>,
    pub max_ramp_restarts: Option<u32>,
    /// sysfs backlight device name; `None` auto-detects.
    pub backlight_device: Option<String>,
    pub default_sound: Option<String>,
}

impl Config {
    /// Load from the default location, creating a commented default file on
    /// first run.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            create_default_config(&path)?;
            log_indented!("Created default config at {}", path.display());
        }
        Self::load_from_path(&path)
    }

    /// Load and validate a specific file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("malformed config in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/dawnr/dawnr.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("could not determine config directory")?;
        Ok(base.join("dawnr").join("dawnr.toml"))
    }

    pub fn light_lead_minutes(&self) -> u64 {
        self.light_lead_minutes.unwrap_or(DEFAULT_LIGHT_LEAD_MINUTES)
    }

    pub fn light_tick_ms(&self) -> u64 {
        self.light_tick_ms.unwrap_or(DEFAULT_LIGHT_TICK_MS)
    }

    pub fn volume_ramp_seconds(&self) -> u64 {
        self.volume_ramp_seconds.unwrap_or(DEFAULT_VOLUME_RAMP_SECONDS)
    }

    pub fn volume_tick_ms(&self) -> u64 {
        self.volume_tick_ms.unwrap_or(DEFAULT_VOLUME_TICK_MS)
    }

    pub fn max_ramp_restarts(&self) -> u32 {
        self.max_ramp_restarts.unwrap_or(DEFAULT_MAX_RAMP_RESTARTS)
    }

    pub fn default_sound(&self) -> &str {
        self.default_sound.as_deref().unwrap_or(DEFAULT_SOUND_KEY)
    }

    fn validate(&self) -> Result<()> {
        check_range(
            "light_lead_minutes",
            self.light_lead_minutes(),
            MINIMUM_LIGHT_LEAD_MINUTES,
            MAXIMUM_LIGHT_LEAD_MINUTES,
        )?;
        check_range(
            "light_tick_ms",
            self.light_tick_ms(),
            MINIMUM_LIGHT_TICK_MS,
            MAXIMUM_LIGHT_TICK_MS,
        )?;
        check_range(
            "volume_ramp_seconds",
            self.volume_ramp_seconds(),
            MINIMUM_VOLUME_RAMP_SECONDS,
            MAXIMUM_VOLUME_RAMP_SECONDS,
        )?;
        check_range(
            "volume_tick_ms",
            self.volume_tick_ms(),
            MINIMUM_VOLUME_TICK_MS,
            MAXIMUM_VOLUME_TICK_MS,
        )?;
        check_range(
            "max_ramp_restarts",
            self.max_ramp_restarts(),
            0,
            MAXIMUM_RAMP_RESTARTS,
        )?;
        if !sounds::is_known(self.default_sound()) {
            return Err(anyhow!(
                "default_sound '{}' is not a known sound key (try `dawnr sounds`)",
                self.default_sound()
            ));
        }
        Ok(())
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(anyhow!("{field} must be between {min} and {max}, got {value}"));
    }
    Ok(())
}

/// Write the commented default configuration file.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let contents = format!(
        r#"#[Ramps]
light_lead_minutes = {DEFAULT_LIGHT_LEAD_MINUTES}    # Brightness ramp length before the alarm (5-120)
light_tick_ms = {DEFAULT_LIGHT_TICK_MS}       # Brightness ramp tick period in ms (500-10000)
volume_ramp_seconds = {DEFAULT_VOLUME_RAMP_SECONDS}   # Sound phase ramp duration in seconds (10-300)
volume_tick_ms = {DEFAULT_VOLUME_TICK_MS}       # Volume ramp tick period in ms (250-5000)
max_ramp_restarts = {DEFAULT_MAX_RAMP_RESTARTS}      # Ramp restart budget per alarm episode (0-10)

#[Devices]
# backlight_device = "intel_backlight"  # sysfs name; omit to auto-detect
default_sound = "{DEFAULT_SOUND_KEY}"  # Sound when an alarm names none
"#
    );

    std::fs::write(path, contents)
        .with_context(|| format!("failed to write default config to {}", path.display()))
}
