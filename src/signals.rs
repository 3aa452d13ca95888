//! Unix signal handling for the daemon.
//!
//! Signals are the daemon's external control surface: SIGUSR2 asks for a
//! re-arm pass over the persisted alarms (one-shot commands send it after
//! mutating the store), and SIGTERM/SIGINT/SIGHUP request shutdown. A
//! dedicated listener thread converts raw signals into typed messages on the
//! daemon's channel so the main loop only ever sees one message stream.

use anyhow::{Context, Result};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR2};
use signal_hook::iterator::Signals;

/// Typed form of a received signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Re-run the re-arm pass over the alarm store (SIGUSR2).
    Rearm,
    /// Terminate cleanly (SIGTERM, SIGINT, SIGHUP).
    Shutdown,
}

/// Spawn the signal listener thread. Messages are delivered through
/// `deliver` until shutdown; the thread is detached and torn down with the
/// process.
pub fn setup_signal_handler(
    deliver: impl Fn(SignalMessage) + Send + 'static,
) -> Result<()> {
    let mut signals = Signals::new([SIGUSR2, SIGTERM, SIGINT, SIGHUP])
        .context("failed to register signal handlers")?;

    std::thread::Builder::new()
        .name("dawnr-signals".into())
        .spawn(move || {
            for signal in signals.forever() {
                let message = match signal {
                    SIGUSR2 => SignalMessage::Rearm,
                    _ => SignalMessage::Shutdown,
                };
                deliver(message);
                if message == SignalMessage::Shutdown {
                    return;
                }
            }
        })
        .context("failed to spawn signal listener thread")?;

    Ok(())
}
