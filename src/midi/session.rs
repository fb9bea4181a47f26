use super::{broadcast, OutputMessage, OutputPort, Result};
use crate::engine::EngineMessage;
use crossbeam::channel::Sender;
use log::{error, info};

/// Where input ports deliver raw message bytes
pub type MessageSink = Sender<EngineMessage>;

/// A subscribed input port. Dropping it unsubscribes.
pub trait InputPort {
    fn name(&self) -> &str;
}

/// Access to a host MIDI subsystem.
pub trait MidiBackend {
    /// Names of every port the backend can see
    fn list_devices(&self) -> Vec<String>;

    /// Opens every input and output port. Each input forwards the raw bytes
    /// of every message it receives to `sink` as [`EngineMessage::Midi`].
    #[allow(clippy::type_complexity)]
    fn open(
        &mut self,
        sink: MessageSink,
    ) -> Result<(Vec<Box<dyn InputPort>>, Vec<Box<dyn OutputPort>>)>;
}

/// Snapshot of a session, as reported to the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub failure: Option<String>,
}

/// The set of ports currently held open.
///
/// A session that failed to open holds no ports: sends become no-ops and the
/// latch bank simply never receives input.
#[derive(Default)]
pub struct DeviceSession {
    inputs: Vec<Box<dyn InputPort>>,
    outputs: Vec<Box<dyn OutputPort>>,
    failure: Option<String>,
}

impl DeviceSession {
    pub fn open<B: MidiBackend + ?Sized>(backend: &mut B, sink: MessageSink) -> Self {
        match backend.open(sink) {
            Ok((inputs, outputs)) => {
                info!(
                    "MIDI session open with {} input(s) and {} output(s)",
                    inputs.len(),
                    outputs.len()
                );
                for port in &inputs {
                    info!("Listening on input port: {}", port.name());
                }
                for port in &outputs {
                    info!("Sending to output port: {}", port.name());
                }
                Self {
                    inputs,
                    outputs,
                    failure: None,
                }
            }
            Err(e) => {
                error!("Failed to open MIDI session: {}", e);
                Self {
                    failure: Some(e.to_string()),
                    ..Self::default()
                }
            }
        }
    }

    /// Broadcasts to every open output port; returns the number reached.
    pub fn send(&mut self, message: OutputMessage) -> usize {
        broadcast(&mut self.outputs, message)
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            inputs: self.inputs.iter().map(|p| p.name().to_string()).collect(),
            outputs: self.outputs.iter().map(|p| p.name().to_string()).collect(),
            failure: self.failure.clone(),
        }
    }

    pub fn close(&mut self) {
        if !self.inputs.is_empty() || !self.outputs.is_empty() {
            info!("Closing MIDI session");
        }
        self.inputs.clear();
        self.outputs.clear();
    }
}
