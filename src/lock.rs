//! Single-instance lock and daemon discovery.
//!
//! The daemon holds an exclusive advisory lock on a pid file for its whole
//! lifetime; a second daemon fails fast instead of double-arming timers.
//! One-shot commands use the same file in reverse: if the lock is held, the
//! pid inside identifies the running daemon so they can poke it with
//! SIGUSR2 after mutating the alarm store.

use anyhow::{Context, Result, bail};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Lock file location: `$XDG_RUNTIME_DIR/dawnr.lock`, falling back to the
/// system temp directory when no runtime dir is set.
pub fn default_lock_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("dawnr.lock")
}

/// Held for the daemon's lifetime; dropping releases the lock and removes
/// the pid file.
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;

        if fs2::FileExt::try_lock_exclusive(&file).is_err() {
            let mut contents = String::new();
            let _ = file.read_to_string(&mut contents);
            match contents.trim().parse::<i32>() {
                Ok(pid) => bail!("another dawnr daemon is already running (pid {pid})"),
                Err(_) => bail!("another dawnr daemon is already running"),
            }
        }

        file.rewind()?;
        file.set_len(0)?;
        write!(file, "{}", std::process::id())
            .with_context(|| format!("failed to write pid to {}", path.display()))?;
        file.flush()?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Pid of the daemon currently holding the lock, if any.
///
/// A lock file that can be locked exclusively is stale (the daemon died
/// without cleanup) and reports no daemon.
pub fn running_pid(path: &Path) -> Result<Option<i32>> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to open {}", path.display())),
    };

    if fs2::FileExt::try_lock_exclusive(&file).is_ok() {
        let _ = fs2::FileExt::unlock(&file);
        return Ok(None);
    }

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(contents.trim().parse::<i32>().ok())
}

/// Ask a running daemon to re-arm from the store. Returns whether a daemon
/// was found to notify.
pub fn notify_rearm(path: &Path) -> Result<bool> {
    match running_pid(path)? {
        Some(pid) => {
            kill(Pid::from_raw(pid), Signal::SIGUSR2)
                .with_context(|| format!("failed to signal daemon (pid {pid})"))?;
            Ok(true)
        }
        None => Ok(false),
    }
}
