//! Typed outbound event bridge.
//!
//! The scheduler and ramp engine report outward through this one-way
//! channel instead of a loosely-typed broadcast bus: progress ticks while a
//! ramp runs, and a phase-fired notification when a timer delivers. The
//! daemon forwards these to whatever presentation layer is attached; tests
//! collect them.

use std::sync::Arc;

use crate::engine::RampKind;
use crate::scheduler::Phase;

/// One-way notification from the core to the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Emitted on every ramp tick with whole-percent progress (0-100).
    ProgressTick { kind: RampKind, percent: u8 },
    /// Emitted once per timer fire.
    PhaseFired { phase: Phase },
}

/// Cloneable handle the engine and scheduler emit through.
///
/// Wraps a consumer callback; delivery failures are the consumer's problem,
/// never the emitter's.
#[derive(Clone)]
pub struct EventSender {
    deliver: Arc<dyn Fn(Event) + Send + Sync>,
}

impl EventSender {
    pub fn new(deliver: impl Fn(Event) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// A sender that drops every event (for contexts with no presentation
    /// layer attached).
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    pub fn send(&self, event: Event) {
        (self.deliver)(event);
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventSender")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn sender_delivers_to_consumer() {
        let seen: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sender = EventSender::new(move |e| sink.lock().unwrap().push(e));

        sender.send(Event::PhaseFired {
            phase: Phase::Light,
        });
        sender.send(Event::ProgressTick {
            kind: RampKind::Brightness,
            percent: 40,
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1],
            Event::ProgressTick {
                kind: RampKind::Brightness,
                percent: 40
            }
        );
    }

    #[test]
    fn discard_sender_is_a_no_op() {
        EventSender::discard().send(Event::PhaseFired {
            phase: Phase::Sound,
        });
    }
}
