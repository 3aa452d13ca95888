//! In-process wake-timer table.
//!
//! Holds armed triggers keyed by request identifier and delivers each
//! payload through a callback when its wall-clock deadline arrives. A
//! dedicated dispatcher thread sleeps until the earliest deadline, capped so
//! it re-reads the wall clock regularly: after a suspend/resume cycle every
//! overdue trigger fires promptly, back-to-back, in deadline order — the
//! same behavior a device waking from sleep exhibits.
//!
//! Deadlines already in the past deliver on the next dispatcher pass. This
//! is deliberate (an alarm scheduled inside the light lead window arms a
//! light trigger in the past and expects it to fire immediately).

use anyhow::Result;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::constants::TIMER_WAIT_CAP_SECS;
use crate::scheduler::{RequestId, TriggerPayload};

use super::TimerBackend;

/// Callback receiving fired payloads, invoked on the dispatcher thread.
pub type FireCallback = Box<dyn Fn(TriggerPayload) + Send>;

struct Armed {
    fires_at: DateTime<Local>,
    payload: TriggerPayload,
}

struct Table {
    armed: HashMap<i64, Armed>,
    shutdown: bool,
}

/// Timer backend backed by a thread in this process.
pub struct InProcessTimers {
    table: Arc<(Mutex<Table>, Condvar)>,
    dispatcher: Option<JoinHandle<()>>,
}

impl InProcessTimers {
    /// Spawn the dispatcher thread; fired payloads go to `on_fire`.
    pub fn new(on_fire: FireCallback) -> Self {
        let table = Arc::new((
            Mutex::new(Table {
                armed: HashMap::new(),
                shutdown: false,
            }),
            Condvar::new(),
        ));

        let dispatch_table = table.clone();
        let dispatcher = std::thread::Builder::new()
            .name("dawnr-timers".into())
            .spawn(move || dispatch_loop(dispatch_table, on_fire))
            .expect("failed to spawn timer dispatcher thread");

        Self {
            table,
            dispatcher: Some(dispatcher),
        }
    }

    /// Request identifiers currently armed, unordered.
    pub fn armed_request_ids(&self) -> Vec<i64> {
        let (lock, _) = &*self.table;
        lock.lock().unwrap().armed.keys().copied().collect()
    }

    /// A handle for observing the armed table after ownership of the
    /// backend itself has moved into a scheduler.
    pub fn inspector(&self) -> TimerInspector {
        TimerInspector {
            table: self.table.clone(),
        }
    }
}

/// Read-only view into an [`InProcessTimers`] armed table.
#[derive(Clone)]
pub struct TimerInspector {
    table: Arc<(Mutex<Table>, Condvar)>,
}

impl TimerInspector {
    pub fn armed_request_ids(&self) -> Vec<i64> {
        let (lock, _) = &*self.table;
        lock.lock().unwrap().armed.keys().copied().collect()
    }
}

impl TimerBackend for InProcessTimers {
    fn arm(
        &mut self,
        id: RequestId,
        fires_at: DateTime<Local>,
        payload: TriggerPayload,
    ) -> Result<()> {
        let (lock, cvar) = &*self.table;
        let mut table = lock.lock().unwrap();
        table.armed.insert(id.0, Armed { fires_at, payload });
        cvar.notify_one();
        Ok(())
    }

    fn cancel(&mut self, id: RequestId) {
        let (lock, cvar) = &*self.table;
        let mut table = lock.lock().unwrap();
        table.armed.remove(&id.0);
        cvar.notify_one();
    }

    fn supports_exact(&self) -> bool {
        true
    }
}

impl Drop for InProcessTimers {
    fn drop(&mut self) {
        {
            let (lock, cvar) = &*self.table;
            let mut table = lock.lock().unwrap();
            table.shutdown = true;
            cvar.notify_one();
        }
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
    }
}

fn dispatch_loop(table: Arc<(Mutex<Table>, Condvar)>, on_fire: FireCallback) {
    let (lock, cvar) = &*table;
    let mut guard = lock.lock().unwrap();
    loop {
        if guard.shutdown {
            return;
        }

        let now = Local::now();

        // Deliver everything due, earliest deadline first.
        let mut due: Vec<i64> = guard
            .armed
            .iter()
            .filter(|(_, a)| a.fires_at <= now)
            .map(|(id, _)| *id)
            .collect();
        due.sort_by_key(|id| guard.armed[id].fires_at);
        for id in due {
            // The lock is released for every callback, so an id on this
            // pass's due list may have been cancelled or re-armed with a
            // new deadline in the meantime; fire only if still due now.
            let entry = match guard.armed.get(&id) {
                Some(armed) if armed.fires_at <= Local::now() => guard.armed.remove(&id),
                _ => None,
            };
            if let Some(armed) = entry {
                // Fire without holding the table lock so the callback can
                // arm or cancel timers itself.
                drop(guard);
                on_fire(armed.payload);
                guard = lock.lock().unwrap();
                if guard.shutdown {
                    return;
                }
            }
        }

        // Sleep until the next deadline, capped for wall-clock re-checks.
        let wait = guard
            .armed
            .values()
            .map(|a| a.fires_at)
            .min()
            .map(|earliest| {
                (earliest - Local::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO)
            })
            .unwrap_or(Duration::from_secs(TIMER_WAIT_CAP_SECS))
            .min(Duration::from_secs(TIMER_WAIT_CAP_SECS));

        if wait.is_zero() {
            continue;
        }
        let (g, _timeout) = cvar.wait_timeout(guard, wait).unwrap();
        guard = g;
    }
}
