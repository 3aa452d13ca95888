//! sysfs backlight brightness sink.
//!
//! Drives the screen through `/sys/class/backlight/<device>/brightness`,
//! scaling between the ramp's raw 0-255 range and the device's own
//! `max_brightness`. Write failures (typically a missing udev rule granting
//! write access) are surfaced as errors for the engine to log and carry on
//! with; they never stop a ramp.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use super::BrightnessSink;

const SYSFS_BACKLIGHT_ROOT: &str = "/sys/class/backlight";

/// Brightness sink over one sysfs backlight device.
pub struct SysfsBacklight {
    device_dir: PathBuf,
    max_raw: u32,
}

impl SysfsBacklight {
    /// Open a named device under `/sys/class/backlight`.
    pub fn open(device: &str) -> Result<Self> {
        Self::open_at(Path::new(SYSFS_BACKLIGHT_ROOT).join(device))
    }

    /// Auto-detect: use the first device the kernel exposes.
    pub fn detect() -> Result<Self> {
        let mut entries: Vec<PathBuf> = fs::read_dir(SYSFS_BACKLIGHT_ROOT)
            .context("no backlight devices exposed by the kernel")?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();
        match entries.first() {
            Some(dir) => Self::open_at(dir.clone()),
            None => bail!("no backlight devices found under {SYSFS_BACKLIGHT_ROOT}"),
        }
    }

    /// Open a device by its sysfs directory (also used by tests with a
    /// temporary directory standing in for sysfs).
    pub fn open_at(device_dir: PathBuf) -> Result<Self> {
        let max_raw = read_value(&device_dir.join("max_brightness"))
            .with_context(|| format!("unusable backlight device {}", device_dir.display()))?;
        if max_raw == 0 {
            bail!(
                "backlight device {} reports max_brightness 0",
                device_dir.display()
            );
        }
        Ok(Self {
            device_dir,
            max_raw,
        })
    }

    pub fn device_name(&self) -> String {
        self.device_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.device_dir.display().to_string())
    }

    // Widened intermediates: max_brightness can be large enough that the
    // product no longer fits in u32.
    fn to_device_scale(&self, raw: u32) -> u32 {
        ((raw.min(255) as u64 * self.max_raw as u64).div_ceil(255)) as u32
    }

    fn from_device_scale(&self, device: u32) -> u32 {
        (device.min(self.max_raw) as u64 * 255 / self.max_raw as u64) as u32
    }
}

impl BrightnessSink for SysfsBacklight {
    fn get(&self) -> Result<u32> {
        let device = read_value(&self.device_dir.join("brightness"))?;
        Ok(self.from_device_scale(device))
    }

    fn set(&mut self, raw: u32) -> Result<()> {
        let path = self.device_dir.join("brightness");
        let device = self.to_device_scale(raw);
        fs::write(&path, device.to_string())
            .with_context(|| format!("cannot write brightness to {}", path.display()))
    }
}

fn read_value(path: &Path) -> Result<u32> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("{} holds a non-numeric value", path.display()))
}
