//! MIDI functionality for midilatch
//!
//! This module provides the wire-level pieces of the engine:
//! - [`decode`] turning raw channel messages into [`ChannelEvent`]s
//! - [`OutputMessage`] and [`OutputPort`] for outbound note messages
//! - [`DeviceSession`] owning every open port, over a [`MidiBackend`]
//!
//! [`MidirBackend`] talks to the host MIDI subsystem; [`MockBackend`] stands
//! in for it in tests.
//!
mod decoder;
mod error;
pub mod midir_backend;
pub mod mock_backend;
mod output;
mod session;

pub use decoder::{decode, ChannelEvent, EventKind, UnknownEventKind};
pub use error::{MidiError, Result};
pub use midir_backend::MidirBackend;
pub use mock_backend::MockBackend;
pub use output::{broadcast, OutputMessage, OutputPort};
pub use session::{DeviceSession, InputPort, MessageSink, MidiBackend, SessionInfo};

#[cfg(not(feature = "test-mock"))]
pub type DefaultBackend = MidirBackend;

#[cfg(feature = "test-mock")]
pub type DefaultBackend = MockBackend;
