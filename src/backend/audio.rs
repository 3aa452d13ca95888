//! Audio player gain boundary.
//!
//! Actual audio decode and playback belong to the external player attached
//! at the presentation boundary; the core only owns the gain it feeds that
//! player and the "exactly one stream" rule. `PlayerGain` tracks whether a
//! stream is active so a second sound-phase start is a no-op instead of a
//! second concurrent stream, and exposes the current gain for the player to
//! consume.

use anyhow::Result;
use std::sync::{Arc, Mutex};

use super::VolumeSink;

#[derive(Debug)]
struct PlayerState {
    gain: f32,
    active_sound: Option<String>,
}

/// Shared gain/stream state for the sound phase.
#[derive(Debug, Clone)]
pub struct PlayerGain {
    state: Arc<Mutex<PlayerState>>,
}

impl PlayerGain {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState {
                gain: 0.0,
                active_sound: None,
            })),
        }
    }

    /// Mark a stream active for `sound_key`. Returns false (and changes
    /// nothing) when a stream is already active — idempotent start.
    pub fn start_stream(&self, sound_key: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.active_sound.is_some() {
            return false;
        }
        state.active_sound = Some(sound_key.to_string());
        true
    }

    /// Stop the active stream, if any.
    pub fn stop_stream(&self) {
        let mut state = self.state.lock().unwrap();
        state.active_sound = None;
        state.gain = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().unwrap().active_sound.is_some()
    }

    pub fn current_gain(&self) -> f32 {
        self.state.lock().unwrap().gain
    }

    pub fn active_sound(&self) -> Option<String> {
        self.state.lock().unwrap().active_sound.clone()
    }
}

impl Default for PlayerGain {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeSink for PlayerGain {
    fn set_gain(&mut self, gain: f32) -> Result<()> {
        self.state.lock().unwrap().gain = gain.clamp(0.0, 1.0);
        Ok(())
    }
}
