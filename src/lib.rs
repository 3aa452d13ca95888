//! # dawnr Library
//!
//! Internal library for the dawnr binary application
//!
//! This library exists to enable testing of the scheduling and ramp internals
//! and to provide clean separation between CLI dispatch (main.rs) and the
//! daemon logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Dawnr` struct runs the daemon with resource management
//! - **Scheduling**: `trigger` resolves wall-clock alarm times, `scheduler`
//!   arms the light/sound timer pair, `store` persists alarm definitions
//! - **Ramps**: `engine` drives the brightness and volume progressions
//! - **Platform boundary**: `backend` holds the timer and sink trait seams
//! - **Infrastructure**: signal handling, pid lock, logging, configuration

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod constants;
pub mod engine;
pub mod events;
pub mod scheduler;
pub mod signals;
pub mod sounds;
pub mod store;
pub mod time_source;
pub mod trigger;

// Internal modules
mod dawnr;
pub(crate) mod lock;

// Re-export for binary
pub use dawnr::Dawnr;
