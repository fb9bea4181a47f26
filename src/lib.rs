//! MIDI event latch and timing engine.
//!
//! Bridges MIDI input, which arrives asynchronously, to a host that samples
//! state once per scheduler turn. Decoded events raise read-and-reset
//! latches so nothing is missed between polls, and a transport clock derives
//! beat pulses and tick counts for timed behaviour.

pub mod cli;
pub mod clock;
pub mod config;
pub mod engine;
pub mod latch;
pub mod logging;
pub mod midi;
pub mod monitor;
pub mod rest;

pub use cli::Args;
pub use clock::TransportClock;
pub use config::EngineConfig;
pub use engine::{Engine, EngineHandle, EngineMessage, EngineState};
pub use latch::{LatchBank, Register};
pub use rest::{RestFrame, RestStatus};

use midi::MidiBackend;

/// Names of the MIDI ports visible to the default backend
pub fn handle_device_list() -> Vec<String> {
    midi::DefaultBackend::default().list_devices()
}
