//! Durable alarm storage.
//!
//! Alarms persist as a single JSON array under the XDG data directory so
//! they survive daemon restarts and reboots. The on-disk field names match
//! the record shape the presentation layer already speaks (`amPm`,
//! `soundResourceName`, `repeatDays`); unknown or missing optional fields
//! default, keeping the file readable across upgrades.
//!
//! Every mutation is a read-modify-write of the whole collection under an
//! exclusive advisory lock, so a concurrent upsert and remove cannot corrupt
//! the file. Upsert removes any record with the same id before appending,
//! which guarantees no duplicate ids survive.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::trigger::{InvalidArgumentError, Meridiem};

/// A user-facing alarm definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Opaque unique identifier. Numeric-compatible: the scheduler derives
    /// the timer request-id pair from it arithmetically.
    pub id: String,
    /// Hour on the 12-hour clock (1-12).
    pub hour: u32,
    /// Minute (0-59).
    pub minute: u32,
    #[serde(rename = "amPm")]
    pub am_pm: Meridiem,
    /// Key into the sound manifest; empty means "platform default".
    #[serde(rename = "soundResourceName", default)]
    pub sound: String,
    /// Opaque presentation hint, passed through untouched.
    #[serde(default)]
    pub theme: String,
    pub enabled: bool,
    /// Accepted and persisted, but not evaluated by trigger resolution.
    #[serde(rename = "repeatDays", default)]
    pub repeat_days: Vec<String>,
}

impl Alarm {
    /// Numeric form of the id, used to derive timer request identifiers.
    pub fn numeric_id(&self) -> Result<i64> {
        self.id
            .parse::<i64>()
            .map_err(|_| InvalidArgumentError(format!("alarm id '{}' is not numeric", self.id)).into())
    }

    /// 12-hour display form, e.g. "7:05 AM".
    pub fn display_time(&self) -> String {
        format!("{}:{:02} {}", self.hour, self.minute, self.am_pm)
    }
}

/// `cancel` against an id the store never held.
#[derive(Debug)]
pub struct AlarmNotFoundError(pub String);

impl std::fmt::Display for AlarmNotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no alarm with id '{}'", self.0)
    }
}

impl std::error::Error for AlarmNotFoundError {}

/// File-backed alarm collection.
pub struct AlarmStore {
    path: PathBuf,
}

impl AlarmStore {
    /// Open (or create the parent directory for) a store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    /// Default store location: `$XDG_DATA_HOME/dawnr/alarms.json`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_dir().context("could not determine XDG data directory")?;
        Ok(base.join("dawnr").join("alarms.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace the alarm with the same id.
    pub fn upsert(&self, alarm: &Alarm) -> Result<()> {
        if alarm.id.is_empty() {
            return Err(InvalidArgumentError("alarm id must not be empty".into()).into());
        }
        self.with_locked(|alarms| {
            alarms.retain(|a| a.id != alarm.id);
            alarms.push(alarm.clone());
            Ok(())
        })
    }

    /// Remove the alarm with `id`. Returns whether a record was removed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.with_locked(|alarms| {
            let before = alarms.len();
            alarms.retain(|a| a.id != id);
            Ok(alarms.len() != before)
        })
    }

    /// All persisted alarms, in insertion order.
    pub fn list_all(&self) -> Result<Vec<Alarm>> {
        let file = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to open {}", self.path.display()));
            }
        };
        fs2::FileExt::lock_shared(&file)
            .with_context(|| format!("failed to lock {}", self.path.display()))?;
        let result = read_alarms(&file, &self.path);
        let _ = fs2::FileExt::unlock(&file);
        result
    }

    /// Look up a single alarm by id.
    pub fn get(&self, id: &str) -> Result<Option<Alarm>> {
        Ok(self.list_all()?.into_iter().find(|a| a.id == id))
    }

    /// Run a mutation against the collection with the file exclusively
    /// locked for the whole read-modify-write.
    fn with_locked<T>(&self, mutate: impl FnOnce(&mut Vec<Alarm>) -> Result<T>) -> Result<T> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        fs2::FileExt::lock_exclusive(&file)
            .with_context(|| format!("failed to lock {}", self.path.display()))?;

        let outcome = (|| {
            let mut alarms = read_alarms(&file, &self.path)?;
            let value = mutate(&mut alarms)?;
            let serialized =
                serde_json::to_string_pretty(&alarms).context("failed to serialize alarms")?;
            file.rewind()?;
            file.set_len(0)?;
            file.write_all(serialized.as_bytes())
                .with_context(|| format!("failed to write {}", self.path.display()))?;
            file.flush()?;
            Ok(value)
        })();

        let _ = fs2::FileExt::unlock(&file);
        outcome
    }
}

fn read_alarms(mut file: &File, path: &Path) -> Result<Vec<Alarm>> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents)
        .with_context(|| format!("{} holds malformed alarm data", path.display()))
}
