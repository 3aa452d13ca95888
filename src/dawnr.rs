//! Application coordinator that manages the complete lifecycle of the
//! dawnr daemon.
//!
//! `Dawnr::new(debug_enabled).run()` loads configuration, takes the
//! single-instance lock, installs signal handlers, opens the alarm store,
//! re-arms every enabled alarm (the boot-completed pass), and then services
//! one merged message stream: timer fires, ramp completions, and signals.
//!
//! Phase handling:
//! - a light fire re-checks the store before ramping, so an alarm cancelled
//!   between arming and firing stays dark;
//! - the brightness ramp's completion starts the sound phase directly, and
//!   the sound trigger firing at the alarm time does the same — whichever
//!   arrives second is a no-op, so exactly one audio stream ever plays.

use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crate::backend::{InProcessTimers, PlayerGain, SysfsBacklight};
use crate::config::Config;
use crate::engine::{
    AlreadyRunningError, BrightnessTarget, ProgressionEngine, RampKind, RampTarget, RampValue,
    VolumeTarget,
};
use crate::events::{Event, EventSender};
use crate::lock::InstanceLock;
use crate::scheduler::{AlarmScheduler, Phase, TriggerPayload};
use crate::signals::{self, SignalMessage};
use crate::store::AlarmStore;

/// Everything the daemon loop can be woken up by.
#[derive(Debug)]
enum DaemonMessage {
    /// A timer delivered a trigger.
    Fired(TriggerPayload),
    /// The brightness ramp completed; begin the sound phase.
    StartSound(TriggerPayload),
    /// Unix signal, already typed.
    Signal(SignalMessage),
}

/// Builder for configuring and running the dawnr daemon.
pub struct Dawnr {
    debug_enabled: bool,
    store_path: Option<PathBuf>,
    lock_path: Option<PathBuf>,
}

impl Dawnr {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            store_path: None,
            lock_path: None,
        }
    }

    /// Use a store file other than the XDG default.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Use a lock file other than the runtime-dir default.
    pub fn with_lock_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    /// Run the daemon until a shutdown signal arrives.
    pub fn run(self) -> Result<()> {
        log_version!();

        let config = Config::load()?;
        let lock_path = self
            .lock_path
            .unwrap_or_else(crate::lock::default_lock_path);
        let _lock = InstanceLock::acquire(&lock_path)?;

        let (tx, rx) = mpsc::channel::<DaemonMessage>();

        let signal_tx = tx.clone();
        signals::setup_signal_handler(move |message| {
            let _ = signal_tx.send(DaemonMessage::Signal(message));
        })?;

        let fire_tx = tx.clone();
        let timers = InProcessTimers::new(Box::new(move |payload| {
            let _ = fire_tx.send(DaemonMessage::Fired(payload));
        }));
        let mut scheduler = AlarmScheduler::new(
            Box::new(timers),
            ChronoDuration::minutes(config.light_lead_minutes() as i64),
        );

        let store_path = match self.store_path {
            Some(path) => path,
            None => AlarmStore::default_path()?,
        };
        let store = AlarmStore::open(&store_path)
            .with_context(|| format!("failed to open alarm store at {}", store_path.display()))?;

        log_block_start!("Re-arming persisted alarms");
        let armed = scheduler.rearm_all(&store)?;
        log_indented!("{armed} alarm(s) armed");

        let mut light_engine = ProgressionEngine::new(
            RampKind::Brightness,
            Duration::from_secs(config.light_lead_minutes() * 60),
            Duration::from_millis(config.light_tick_ms()),
            config.max_ramp_restarts(),
        );
        let mut sound_engine = ProgressionEngine::new(
            RampKind::Volume,
            Duration::from_secs(config.volume_ramp_seconds()),
            Duration::from_millis(config.volume_tick_ms()),
            config.max_ramp_restarts(),
        );
        let player = PlayerGain::new();
        let events = progress_logger(self.debug_enabled);
        // Alarm id the running light ramp belongs to, so a store change can
        // stop a ramp whose alarm was cancelled mid-flight.
        let mut active_light: Option<String> = None;

        log_block_start!("Watching for triggers");

        while let Ok(message) = rx.recv() {
            match message {
                DaemonMessage::Fired(payload) => {
                    events.send(Event::PhaseFired {
                        phase: payload.phase,
                    });
                    match payload.phase {
                        Phase::Light => handle_light_fire(
                            &store,
                            &config,
                            &mut light_engine,
                            &events,
                            &tx,
                            &mut active_light,
                            payload,
                        ),
                        Phase::Sound => handle_sound_start(
                            &store,
                            &config,
                            &mut sound_engine,
                            &player,
                            &events,
                            payload,
                        ),
                    }
                }
                DaemonMessage::StartSound(payload) => handle_sound_start(
                    &store,
                    &config,
                    &mut sound_engine,
                    &player,
                    &events,
                    payload,
                ),
                DaemonMessage::Signal(SignalMessage::Rearm) => {
                    log_block_start!("Store changed; syncing armed triggers");
                    match sync_store(&mut scheduler, &store) {
                        Ok((armed, disarmed)) => {
                            log_indented!("{armed} armed, {disarmed} disarmed")
                        }
                        Err(e) => log_warning!("Sync failed: {e}"),
                    }
                    enforce_light_ownership(&store, &mut light_engine, &mut active_light);
                }
                DaemonMessage::Signal(SignalMessage::Shutdown) => break,
            }
        }

        log_block_start!("Shutting down");
        light_engine.cancel();
        sound_engine.cancel();
        player.stop_stream();
        log_decorated!("Goodbye!");
        log_end!();
        Ok(())
    }
}

/// Bring the armed trigger table in line with the store: every enabled alarm
/// gets a (re-)armed pair, every disabled alarm gets its pair disarmed.
/// Returns (armed, disarmed) counts.
fn sync_store(scheduler: &mut AlarmScheduler, store: &AlarmStore) -> Result<(usize, usize)> {
    let mut armed = 0;
    let mut disarmed = 0;
    for alarm in store.list_all()? {
        if alarm.enabled {
            match scheduler.schedule(&alarm) {
                Ok(_) => armed += 1,
                Err(e) => log_warning!("Skipping alarm {}: {e}", alarm.id),
            }
        } else if let Ok(numeric) = alarm.numeric_id() {
            scheduler.cancel(numeric);
            disarmed += 1;
        }
    }
    Ok((armed, disarmed))
}

/// Whether the store still holds `alarm_id` as an enabled alarm. Read
/// failures count as "no": a phase must never act on an unverifiable alarm.
fn alarm_still_enabled(store: &AlarmStore, alarm_id: &str) -> bool {
    match store.get(alarm_id) {
        Ok(Some(alarm)) => alarm.enabled,
        Ok(None) => false,
        Err(e) => {
            log_warning!("Could not verify alarm {alarm_id}: {e}");
            false
        }
    }
}

/// Stop the running light ramp when the alarm it belongs to has been
/// cancelled or removed; a disarmed pair must not keep brightening the
/// screen for up to the whole lead window.
fn enforce_light_ownership(
    store: &AlarmStore,
    light_engine: &mut ProgressionEngine,
    active_light: &mut Option<String>,
) {
    let Some(alarm_id) = active_light.clone() else {
        return;
    };
    if !alarm_still_enabled(store, &alarm_id) {
        log_decorated!("Stopping light ramp for cancelled alarm {alarm_id}");
        light_engine.cancel();
        *active_light = None;
    }
}

fn handle_light_fire(
    store: &AlarmStore,
    config: &Config,
    light_engine: &mut ProgressionEngine,
    events: &EventSender,
    tx: &mpsc::Sender<DaemonMessage>,
    active_light: &mut Option<String>,
    payload: TriggerPayload,
) {
    // The pair may have been cancelled between arming and firing; the store
    // is the source of truth.
    if !alarm_still_enabled(store, &payload.alarm_id) {
        log_decorated!(
            "Ignoring light trigger for cancelled alarm {}",
            payload.alarm_id
        );
        return;
    }

    log_block_start!("Alarm {}: light phase starting", payload.alarm_id);
    let alarm_id = payload.alarm_id.clone();
    let chain_tx = tx.clone();
    let on_complete = Box::new(move || {
        let _ = chain_tx.send(DaemonMessage::StartSound(TriggerPayload {
            phase: Phase::Sound,
            ..payload
        }));
    });

    let target = make_brightness_target(config);
    match light_engine.start(target, events.clone(), Some(on_complete)) {
        Ok(()) => *active_light = Some(alarm_id),
        Err(e) if e.downcast_ref::<AlreadyRunningError>().is_some() => {
            log_decorated!("Light ramp already running; leaving it be");
        }
        Err(e) => log_error!("Could not start light ramp: {e}"),
    }
}

fn handle_sound_start(
    store: &AlarmStore,
    config: &Config,
    sound_engine: &mut ProgressionEngine,
    player: &PlayerGain,
    events: &EventSender,
    payload: TriggerPayload,
) {
    // Same re-check as the light path: the sound trigger (or the light
    // ramp's completion chain) may arrive after the alarm was cancelled.
    if !alarm_still_enabled(store, &payload.alarm_id) {
        log_decorated!(
            "Ignoring sound trigger for cancelled alarm {}",
            payload.alarm_id
        );
        return;
    }

    let sound = if crate::sounds::is_known(&payload.sound) {
        payload.sound.clone()
    } else {
        config.default_sound().to_string()
    };

    if player.start_stream(&sound) {
        log_block_start!(
            "Alarm {}: sound phase, playing {}",
            payload.alarm_id,
            crate::sounds::display_name(&sound)
        );
    }

    match sound_engine.start(
        Box::new(VolumeTarget::new(Box::new(player.clone()))),
        events.clone(),
        None,
    ) {
        Ok(()) => {}
        Err(e) if e.downcast_ref::<AlreadyRunningError>().is_some() => {
            // Light-completion chain and sound trigger both arrive; the
            // second is expected to land here.
        }
        Err(e) => log_error!("Could not start volume ramp: {e}"),
    }
}

/// Event sink for the daemon: phase fires always log, per-tick progress only
/// in debug mode.
fn progress_logger(debug_enabled: bool) -> EventSender {
    EventSender::new(move |event| match event {
        Event::ProgressTick { kind, percent } => {
            if debug_enabled {
                log_indented!("{kind} ramp at {percent}%");
            }
        }
        Event::PhaseFired { phase } => {
            log_decorated!("{phase} trigger fired");
        }
    })
}

/// Stand-in brightness target used when no backlight device is usable; every
/// apply reports the device as unavailable so the ramp keeps ticking and
/// progress keeps flowing outward.
struct UnavailableBrightness;

impl RampTarget for UnavailableBrightness {
    fn capture_baseline(&mut self) -> Option<u32> {
        None
    }

    fn apply(&mut self, _value: RampValue) -> Result<()> {
        anyhow::bail!("no usable backlight device")
    }

    fn restore(&mut self, _baseline: u32) -> Result<()> {
        Ok(())
    }
}

fn make_brightness_target(config: &Config) -> Box<dyn RampTarget> {
    let opened = match config.backlight_device.as_deref() {
        Some(device) => SysfsBacklight::open(device),
        None => SysfsBacklight::detect(),
    };
    match opened {
        Ok(sink) => {
            log_indented!("Driving backlight device {}", sink.device_name());
            Box::new(BrightnessTarget::new(Box::new(sink)))
        }
        Err(e) => {
            log_warning!("Backlight unavailable, ramp runs without effect: {e}");
            Box::new(UnavailableBrightness)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockTimerBackend;
    use crate::store::Alarm;
    use crate::trigger::Meridiem;
    use chrono::{Local, TimeZone};
    use serial_test::serial;
    use tempfile::tempdir;

    fn alarm(id: &str, enabled: bool) -> Alarm {
        Alarm {
            id: id.to_string(),
            hour: 7,
            minute: 0,
            am_pm: Meridiem::Am,
            sound: String::new(),
            theme: String::new(),
            enabled,
            repeat_days: vec![],
        }
    }

    #[test]
    #[serial]
    fn sync_store_arms_enabled_and_disarms_disabled() {
        crate::time_source::init_time_source(std::sync::Arc::new(
            crate::time_source::FixedTimeSource::new(
                Local.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap(),
            ),
        ));

        let dir = tempdir().unwrap();
        let store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.upsert(&alarm("1", true)).unwrap();
        store.upsert(&alarm("2", false)).unwrap();

        let mut timers = MockTimerBackend::new();
        timers.expect_supports_exact().return_const(true);
        // alarm 1: pre-arm cancel of its pair; alarm 2: disarm of its pair
        timers.expect_cancel().times(4).return_const(());
        timers.expect_arm().times(2).returning(|_, _, _| Ok(()));

        let mut scheduler =
            AlarmScheduler::new(Box::new(timers), ChronoDuration::minutes(20));
        let (armed, disarmed) = sync_store(&mut scheduler, &store).unwrap();
        assert_eq!((armed, disarmed), (1, 1));
    }

    struct NullTarget;

    impl RampTarget for NullTarget {
        fn capture_baseline(&mut self) -> Option<u32> {
            None
        }
        fn apply(&mut self, _value: RampValue) -> Result<()> {
            Ok(())
        }
        fn restore(&mut self, _baseline: u32) -> Result<()> {
            Ok(())
        }
    }

    fn sound_payload(alarm_id: &str) -> TriggerPayload {
        TriggerPayload {
            phase: Phase::Sound,
            alarm_id: alarm_id.to_string(),
            sound: "classicalarm_bell".to_string(),
            theme: String::new(),
        }
    }

    #[test]
    fn sound_start_ignores_cancelled_alarm() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.upsert(&alarm("9", false)).unwrap();

        let config = Config::default();
        let mut sound_engine = ProgressionEngine::new(
            RampKind::Volume,
            std::time::Duration::from_secs(60),
            std::time::Duration::from_millis(10),
            3,
        );
        let player = PlayerGain::new();

        handle_sound_start(
            &store,
            &config,
            &mut sound_engine,
            &player,
            &EventSender::discard(),
            sound_payload("9"),
        );

        assert!(!player.is_active(), "no stream for a cancelled alarm");
        assert_eq!(sound_engine.state(), crate::engine::EngineState::Idle);

        // Same for an alarm the store never held.
        handle_sound_start(
            &store,
            &config,
            &mut sound_engine,
            &player,
            &EventSender::discard(),
            sound_payload("404"),
        );
        assert!(!player.is_active());
    }

    #[test]
    fn sound_start_plays_enabled_alarm() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.upsert(&alarm("9", true)).unwrap();

        let config = Config::default();
        let mut sound_engine = ProgressionEngine::new(
            RampKind::Volume,
            std::time::Duration::from_secs(60),
            std::time::Duration::from_millis(10),
            3,
        );
        let player = PlayerGain::new();

        handle_sound_start(
            &store,
            &config,
            &mut sound_engine,
            &player,
            &EventSender::discard(),
            sound_payload("9"),
        );

        assert!(player.is_active());
        assert_eq!(
            player.active_sound().as_deref(),
            Some("classicalarm_bell")
        );
        assert_eq!(sound_engine.state(), crate::engine::EngineState::Running);
        sound_engine.cancel();
    }

    #[test]
    fn rearm_pass_stops_light_ramp_of_cancelled_alarm() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.upsert(&alarm("5", false)).unwrap();

        let mut light_engine = ProgressionEngine::new(
            RampKind::Brightness,
            std::time::Duration::from_secs(60),
            std::time::Duration::from_millis(10),
            3,
        );
        light_engine
            .start(Box::new(NullTarget), EventSender::discard(), None)
            .unwrap();
        let mut active_light = Some("5".to_string());

        enforce_light_ownership(&store, &mut light_engine, &mut active_light);

        assert_eq!(
            light_engine.state(),
            crate::engine::EngineState::Cancelled,
            "mid-flight ramp stops when its alarm is disabled"
        );
        assert!(active_light.is_none());
    }

    #[test]
    fn rearm_pass_leaves_light_ramp_of_enabled_alarm_running() {
        let dir = tempdir().unwrap();
        let store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();
        store.upsert(&alarm("5", true)).unwrap();

        let mut light_engine = ProgressionEngine::new(
            RampKind::Brightness,
            std::time::Duration::from_secs(60),
            std::time::Duration::from_millis(10),
            3,
        );
        light_engine
            .start(Box::new(NullTarget), EventSender::discard(), None)
            .unwrap();
        let mut active_light = Some("5".to_string());

        enforce_light_ownership(&store, &mut light_engine, &mut active_light);

        assert_eq!(light_engine.state(), crate::engine::EngineState::Running);
        assert_eq!(active_light.as_deref(), Some("5"));
        light_engine.cancel();
    }

    #[test]
    fn unavailable_brightness_keeps_erroring_quietly() {
        let mut target = UnavailableBrightness;
        assert!(target.capture_baseline().is_none());
        assert!(target.apply(RampValue::Brightness(128)).is_err());
        assert!(target.restore(0).is_ok());
    }
}
