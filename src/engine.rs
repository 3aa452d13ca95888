//! Progression ramp driver.
//!
//! One `ProgressionEngine` owns one ramp of one kind. Started at a trigger,
//! it ticks on a fixed period, maps elapsed time onto a deterministic curve,
//! applies the value to its target sink, and emits a progress event — until
//! progress reaches 100%, where the terminal value is applied exactly once
//! and the configured completion action runs (the brightness ramp's
//! completion starts the sound phase).
//!
//! State machine: Idle -> Running -> {Completed, Cancelled}; `Failed` is the
//! terminal give-up state entered when the bounded restart budget for one
//! alarm episode is exhausted.
//!
//! The one real race in the system lives here: `cancel()` arrives from
//! another thread while a tick is in flight. The tick re-checks the running
//! flag immediately before applying a value, so a stale tick after
//! cancellation is a no-op; cancellation itself restores the captured
//! baseline before `cancel()` returns.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::backend::{BrightnessSink, VolumeSink};
use crate::constants::{
    BRIGHTNESS_CEILING, BRIGHTNESS_FLOOR, BRIGHTNESS_SPAN, VOLUME_CEILING, VOLUME_FLOOR,
    VOLUME_STEP_PER_TICK,
};
use crate::events::{Event, EventSender};

/// Which process-wide resource a ramp drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RampKind {
    Brightness,
    Volume,
}

impl std::fmt::Display for RampKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RampKind::Brightness => write!(f, "brightness"),
            RampKind::Volume => write!(f, "volume"),
        }
    }
}

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Cancelled,
    /// Restart budget exhausted; terminated without restoring state.
    Failed,
}

/// Double-start of a ramp kind that is already running. The existing ramp
/// continues unaffected.
#[derive(Debug)]
pub struct AlreadyRunningError(pub RampKind);

impl std::fmt::Display for AlreadyRunningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a {} ramp is already running", self.0)
    }
}

impl std::error::Error for AlreadyRunningError {}

/// The bounded restart budget for this alarm episode is exhausted.
#[derive(Debug)]
pub struct RampGaveUpError(pub RampKind);

impl std::fmt::Display for RampGaveUpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ramp exceeded its restart budget and gave up",
            self.0
        )
    }
}

impl std::error::Error for RampGaveUpError {}

/// Brightness step curve: whole-percent steps from 10 to 255.
///
/// `10 + floor(progress*100) * 245 / 100`, clamped to [10, 255]. Percentage
/// steps, not continuous progress: at most 101 distinct levels.
pub fn brightness_value(progress: f64) -> u32 {
    let steps = (progress.clamp(0.0, 1.0) * 100.0).floor() as u32;
    (BRIGHTNESS_FLOOR + steps * BRIGHTNESS_SPAN / 100).clamp(BRIGHTNESS_FLOOR, BRIGHTNESS_CEILING)
}

/// Volume gain curve: tick-count-driven, not duration-fraction.
///
/// Starts at 50% and adds 1.5% per tick, clamped to [0.5, 1.0]; full volume
/// after ~34 ticks regardless of the configured ramp duration.
pub fn volume_gain(ticks: u32) -> f32 {
    (VOLUME_FLOOR + VOLUME_STEP_PER_TICK * ticks as f32).clamp(VOLUME_FLOOR, VOLUME_CEILING)
}

/// A value produced by a curve, addressed to one sink type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampValue {
    Brightness(u32),
    Gain(f32),
}

/// The sink side of a ramp, with baseline capture/restore semantics.
///
/// The baseline is a scoped resource: whatever `capture_baseline` returns is
/// handed back to `restore` when the ramp terminates by cancellation.
pub trait RampTarget: Send + 'static {
    /// Capture the pre-ramp value, if this target has one to restore.
    fn capture_baseline(&mut self) -> Option<u32>;
    /// Apply a curve value. Errors are logged by the engine and do not stop
    /// the ramp; progress reporting is decoupled from side-effect success.
    fn apply(&mut self, value: RampValue) -> Result<()>;
    /// Put the pre-ramp value back.
    fn restore(&mut self, baseline: u32) -> Result<()>;
}

/// Brightness ramp target over a [`BrightnessSink`].
pub struct BrightnessTarget {
    sink: Box<dyn BrightnessSink>,
}

impl BrightnessTarget {
    pub fn new(sink: Box<dyn BrightnessSink>) -> Self {
        Self { sink }
    }
}

impl RampTarget for BrightnessTarget {
    fn capture_baseline(&mut self) -> Option<u32> {
        match self.sink.get() {
            Ok(raw) => Some(raw),
            Err(e) => {
                log_warning!("Could not read current brightness for baseline: {e}");
                None
            }
        }
    }

    fn apply(&mut self, value: RampValue) -> Result<()> {
        match value {
            RampValue::Brightness(raw) => self.sink.set(raw),
            RampValue::Gain(_) => Ok(()),
        }
    }

    fn restore(&mut self, baseline: u32) -> Result<()> {
        self.sink.set(baseline)
    }
}

/// Volume ramp target over a [`VolumeSink`]. No baseline: the stream the
/// gain feeds is torn down with the alarm, not restored.
pub struct VolumeTarget {
    sink: Box<dyn VolumeSink>,
}

impl VolumeTarget {
    pub fn new(sink: Box<dyn VolumeSink>) -> Self {
        Self { sink }
    }
}

impl RampTarget for VolumeTarget {
    fn capture_baseline(&mut self) -> Option<u32> {
        None
    }

    fn apply(&mut self, value: RampValue) -> Result<()> {
        match value {
            RampValue::Gain(gain) => self.sink.set_gain(gain),
            RampValue::Brightness(_) => Ok(()),
        }
    }

    fn restore(&mut self, _baseline: u32) -> Result<()> {
        Ok(())
    }
}

struct Shared {
    running: AtomicBool,
    state: Mutex<EngineState>,
    wakeup: Condvar,
}

/// Completion action invoked exactly once when a ramp reaches 100%.
pub type CompletionAction = Box<dyn FnOnce() + Send>;

/// Driver for one ramp kind. At most one ramp of a given kind runs at a
/// time; two engines of different kinds are independent and may overlap.
pub struct ProgressionEngine {
    kind: RampKind,
    duration: Duration,
    tick: Duration,
    max_restarts: u32,
    restarts: u32,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ProgressionEngine {
    pub fn new(kind: RampKind, duration: Duration, tick: Duration, max_restarts: u32) -> Self {
        Self {
            kind,
            duration,
            tick,
            max_restarts,
            restarts: 0,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                state: Mutex::new(EngineState::Idle),
                wakeup: Condvar::new(),
            }),
            worker: None,
        }
    }

    pub fn state(&self) -> EngineState {
        *self.shared.state.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Start the ramp.
    ///
    /// Fails with [`AlreadyRunningError`] while a ramp of this kind is
    /// active. Calling start again after the worker terminated without
    /// completing or being cancelled counts as an unwanted restart against
    /// the episode budget; exhausting it fails with [`RampGaveUpError`] and
    /// leaves the engine in `Failed` without restoring anything.
    pub fn start(
        &mut self,
        target: Box<dyn RampTarget>,
        events: EventSender,
        on_complete: Option<CompletionAction>,
    ) -> Result<()> {
        if self.is_running() {
            let worker_alive = self
                .worker
                .as_ref()
                .is_some_and(|handle| !handle.is_finished());
            if worker_alive {
                return Err(AlreadyRunningError(self.kind).into());
            }

            // The tick thread died mid-episode. Bounded retry: give up for
            // good once the budget is spent.
            self.restarts += 1;
            if self.restarts > self.max_restarts {
                self.shared.running.store(false, Ordering::SeqCst);
                *self.shared.state.lock().unwrap() = EngineState::Failed;
                log_error!(
                    "{} ramp restarted {} times this episode; giving up",
                    self.kind,
                    self.restarts - 1
                );
                return Err(RampGaveUpError(self.kind).into());
            }
            log_warning!(
                "{} ramp restart {}/{}",
                self.kind,
                self.restarts,
                self.max_restarts
            );
        } else {
            // Fresh episode.
            self.restarts = 0;
        }

        *self.shared.state.lock().unwrap() = EngineState::Running;
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = self.shared.clone();
        let kind = self.kind;
        let duration = self.duration;
        let tick = self.tick;
        let handle = std::thread::Builder::new()
            .name(format!("dawnr-{kind}-ramp"))
            .spawn(move || run_ramp(shared, kind, duration, tick, target, events, on_complete))
            .expect("failed to spawn ramp thread");
        self.worker = Some(handle);
        Ok(())
    }

    /// Stop the ramp and restore the captured baseline.
    ///
    /// Safe to call from any state (no-op unless Running) and concurrently
    /// with an in-flight tick. Synchronous: the worker has restored the
    /// baseline and exited before this returns.
    pub fn cancel(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if *state != EngineState::Running {
                return;
            }
            *state = EngineState::Cancelled;
        }
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.wakeup.notify_all();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressionEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[allow(clippy::too_many_arguments)]
fn run_ramp(
    shared: Arc<Shared>,
    kind: RampKind,
    duration: Duration,
    tick: Duration,
    mut target: Box<dyn RampTarget>,
    events: EventSender,
    mut on_complete: Option<CompletionAction>,
) {
    let baseline = target.capture_baseline();
    let started = Instant::now();
    let mut ticks: u32 = 0;
    let mut sink_failure_logged = false;

    loop {
        // A cancel may land between ticks or mid-tick; check before every
        // apply so a stale tick never writes after cancellation.
        if !shared.running.load(Ordering::SeqCst) {
            if let Some(raw) = baseline
                && let Err(e) = target.restore(raw)
            {
                log_warning!("Could not restore {kind} baseline: {e}");
            }
            return;
        }

        let progress = if duration.is_zero() {
            1.0
        } else {
            (started.elapsed().as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
        };
        let value = match kind {
            RampKind::Brightness => RampValue::Brightness(brightness_value(progress)),
            RampKind::Volume => RampValue::Gain(volume_gain(ticks)),
        };

        if !shared.running.load(Ordering::SeqCst) {
            continue; // re-enter the cancellation path above
        }
        if let Err(e) = target.apply(value) {
            // Keep ticking and reporting progress; the physical effect being
            // unavailable must not halt the ramp.
            if !sink_failure_logged {
                log_warning!("{kind} sink unavailable, ramp continues: {e}");
                sink_failure_logged = true;
            }
        }
        events.send(Event::ProgressTick {
            kind,
            percent: (progress * 100.0).floor() as u8,
        });

        if progress >= 1.0 {
            // Terminal value was applied just above, exactly once.
            shared.running.store(false, Ordering::SeqCst);
            *shared.state.lock().unwrap() = EngineState::Completed;
            if let Some(action) = on_complete.take() {
                action();
            }
            return;
        }

        ticks += 1;
        let guard = shared.state.lock().unwrap();
        let _ = shared.wakeup.wait_timeout(guard, tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockVolumeSink;
    use std::sync::Mutex as StdMutex;

    /// Brightness sink recording every write, seeded with a baseline value.
    #[derive(Clone)]
    struct MemorySink {
        values: Arc<StdMutex<Vec<u32>>>,
        current: Arc<StdMutex<u32>>,
        fail_writes: bool,
    }

    impl MemorySink {
        fn new(baseline: u32) -> Self {
            Self {
                values: Arc::new(StdMutex::new(Vec::new())),
                current: Arc::new(StdMutex::new(baseline)),
                fail_writes: false,
            }
        }

        fn failing() -> Self {
            let mut sink = Self::new(42);
            sink.fail_writes = true;
            sink
        }

        fn written(&self) -> Vec<u32> {
            self.values.lock().unwrap().clone()
        }

        fn current(&self) -> u32 {
            *self.current.lock().unwrap()
        }
    }

    impl BrightnessSink for MemorySink {
        fn get(&self) -> Result<u32> {
            Ok(*self.current.lock().unwrap())
        }

        fn set(&mut self, raw: u32) -> Result<()> {
            if self.fail_writes {
                anyhow::bail!("settings write capability missing");
            }
            self.values.lock().unwrap().push(raw);
            *self.current.lock().unwrap() = raw;
            Ok(())
        }
    }

    fn collector() -> (EventSender, Arc<StdMutex<Vec<Event>>>) {
        let seen: Arc<StdMutex<Vec<Event>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        (
            EventSender::new(move |e| sink.lock().unwrap().push(e)),
            seen,
        )
    }

    fn wait_for<F: Fn() -> bool>(cond: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn brightness_curve_endpoints_and_monotonicity() {
        assert_eq!(brightness_value(0.0), 10);
        assert_eq!(brightness_value(1.0), 255);
        let mut last = 0;
        for i in 0..=1000 {
            let v = brightness_value(i as f64 / 1000.0);
            assert!(v >= last, "curve decreased at {i}");
            assert!((10..=255).contains(&v));
            last = v;
        }
    }

    #[test]
    fn brightness_curve_is_a_step_function() {
        // Whole-percent steps: values inside one percent bucket are equal.
        assert_eq!(brightness_value(0.051), brightness_value(0.059));
        assert_ne!(brightness_value(0.05), brightness_value(0.06));
    }

    #[test]
    fn volume_curve_reaches_full_after_34_ticks() {
        assert_eq!(volume_gain(0), 0.5);
        assert!(volume_gain(33) < 1.0);
        assert!(volume_gain(34) >= 1.0);
        assert_eq!(volume_gain(35), 1.0);
        assert_eq!(volume_gain(1000), 1.0);
    }

    #[test]
    fn completes_and_applies_terminal_value_then_runs_action() {
        let sink = MemorySink::new(42);
        let (events, seen) = collector();
        let completed = Arc::new(AtomicBool::new(false));
        let completed_flag = completed.clone();

        let mut engine = ProgressionEngine::new(
            RampKind::Brightness,
            Duration::from_millis(60),
            Duration::from_millis(10),
            3,
        );
        engine
            .start(
                Box::new(BrightnessTarget::new(Box::new(sink.clone()))),
                events,
                Some(Box::new(move || {
                    completed_flag.store(true, Ordering::SeqCst)
                })),
            )
            .unwrap();

        wait_for(|| engine.state() == EngineState::Completed);
        assert!(completed.load(Ordering::SeqCst));

        let written = sink.written();
        assert_eq!(*written.first().unwrap(), 10, "starts at the curve floor");
        assert_eq!(*written.last().unwrap(), 255, "ends at the terminal value");
        let events = seen.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(Event::ProgressTick { percent: 100, .. })
        ));
    }

    #[test]
    fn cancel_restores_baseline_exactly() {
        let sink = MemorySink::new(180);
        let mut engine = ProgressionEngine::new(
            RampKind::Brightness,
            Duration::from_secs(60),
            Duration::from_millis(10),
            3,
        );
        engine
            .start(
                Box::new(BrightnessTarget::new(Box::new(sink.clone()))),
                EventSender::discard(),
                None,
            )
            .unwrap();

        wait_for(|| !sink.written().is_empty());
        engine.cancel();

        assert_eq!(engine.state(), EngineState::Cancelled);
        assert_eq!(sink.current(), 180, "pre-ramp brightness restored");
        // cancel is synchronous: no write may land after it returns
        let writes = sink.written().len();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.written().len(), writes);
    }

    #[test]
    fn double_start_is_rejected_and_existing_ramp_unaffected() {
        let sink = MemorySink::new(42);
        let mut engine = ProgressionEngine::new(
            RampKind::Brightness,
            Duration::from_secs(60),
            Duration::from_millis(10),
            3,
        );
        engine
            .start(
                Box::new(BrightnessTarget::new(Box::new(sink.clone()))),
                EventSender::discard(),
                None,
            )
            .unwrap();

        let err = engine
            .start(
                Box::new(BrightnessTarget::new(Box::new(sink.clone()))),
                EventSender::discard(),
                None,
            )
            .unwrap_err();
        assert!(err.downcast_ref::<AlreadyRunningError>().is_some());
        assert_eq!(engine.state(), EngineState::Running);
        engine.cancel();
    }

    #[test]
    fn cancel_from_idle_and_completed_is_a_no_op() {
        let mut engine = ProgressionEngine::new(
            RampKind::Brightness,
            Duration::from_millis(20),
            Duration::from_millis(5),
            3,
        );
        engine.cancel();
        assert_eq!(engine.state(), EngineState::Idle);

        let sink = MemorySink::new(42);
        engine
            .start(
                Box::new(BrightnessTarget::new(Box::new(sink))),
                EventSender::discard(),
                None,
            )
            .unwrap();
        wait_for(|| engine.state() == EngineState::Completed);
        engine.cancel();
        assert_eq!(engine.state(), EngineState::Completed);
    }

    #[test]
    fn failing_sink_does_not_halt_progress_reporting() {
        let sink = MemorySink::failing();
        let (events, seen) = collector();
        let mut engine = ProgressionEngine::new(
            RampKind::Brightness,
            Duration::from_millis(40),
            Duration::from_millis(10),
            3,
        );
        engine
            .start(
                Box::new(BrightnessTarget::new(Box::new(sink))),
                events,
                None,
            )
            .unwrap();

        wait_for(|| engine.state() == EngineState::Completed);
        let events = seen.lock().unwrap();
        assert!(!events.is_empty());
        assert!(matches!(
            events.last(),
            Some(Event::ProgressTick { percent: 100, .. })
        ));
    }

    #[test]
    fn volume_ramp_drives_gain_through_sink() {
        let applied: Arc<StdMutex<Vec<f32>>> = Arc::new(StdMutex::new(Vec::new()));
        let log = applied.clone();
        let mut mock = MockVolumeSink::new();
        mock.expect_set_gain().returning(move |g| {
            log.lock().unwrap().push(g);
            Ok(())
        });

        let mut engine = ProgressionEngine::new(
            RampKind::Volume,
            Duration::from_millis(40),
            Duration::from_millis(10),
            3,
        );
        engine
            .start(
                Box::new(VolumeTarget::new(Box::new(mock))),
                EventSender::discard(),
                None,
            )
            .unwrap();

        wait_for(|| engine.state() == EngineState::Completed);
        let applied = applied.lock().unwrap();
        assert_eq!(applied[0], 0.5, "volume starts at the floor");
        for pair in applied.windows(2) {
            assert!(pair[1] >= pair[0], "gain is non-decreasing");
        }
    }

    #[test]
    fn restart_budget_gives_up_on_the_fourth_attempt() {
        struct PanickingTarget;
        impl RampTarget for PanickingTarget {
            fn capture_baseline(&mut self) -> Option<u32> {
                None
            }
            fn apply(&mut self, _value: RampValue) -> Result<()> {
                panic!("tick thread killed");
            }
            fn restore(&mut self, _baseline: u32) -> Result<()> {
                Ok(())
            }
        }

        // Silence the expected panic backtraces from the dying workers.
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let mut engine = ProgressionEngine::new(
            RampKind::Brightness,
            Duration::from_secs(60),
            Duration::from_millis(5),
            3,
        );

        // Initial start plus three unwanted restarts succeed.
        for _ in 0..4 {
            engine
                .start(
                    Box::new(PanickingTarget),
                    EventSender::discard(),
                    None,
                )
                .unwrap();
            wait_for(|| {
                engine
                    .worker
                    .as_ref()
                    .is_some_and(|handle| handle.is_finished())
            });
        }

        // The fourth unwanted restart is refused for good.
        let err = engine
            .start(Box::new(PanickingTarget), EventSender::discard(), None)
            .unwrap_err();
        assert!(err.downcast_ref::<RampGaveUpError>().is_some());
        assert_eq!(engine.state(), EngineState::Failed);

        std::panic::set_hook(default_hook);
    }
}
