use super::{InputPort, MessageSink, MidiBackend, MidiError, OutputPort, Result};
use crate::engine::EngineMessage;
use std::sync::{Arc, Mutex};

/// In-memory backend. Clones share state, so a test can keep one clone while
/// the engine owns another.
#[derive(Debug, Clone)]
pub struct MockBackend {
    inputs: Vec<String>,
    outputs: Vec<String>,
    failure: Option<String>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    sink: Arc<Mutex<Option<MessageSink>>>,
}

struct MockInput {
    name: String,
}

impl InputPort for MockInput {
    fn name(&self) -> &str {
        &self.name
    }
}

struct MockOutput {
    name: String,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl OutputPort for MockOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        true
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| MidiError::SendError("mock output poisoned".to_string()))?
            .push(bytes.to_vec());
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_ports(&["Mock Device 1", "Mock Device 2"], &["Mock Device 1"])
    }

    pub fn with_ports(inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            failure: None,
            sent: Arc::new(Mutex::new(Vec::new())),
            sink: Arc::new(Mutex::new(None)),
        }
    }

    /// A backend whose session request is always denied
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::with_ports(&[], &[])
        }
    }

    /// Every message written to any output port, in order
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Delivers `bytes` as if they arrived on an input port. Returns false
    /// when no session is open.
    pub fn inject(&self, bytes: &[u8]) -> bool {
        let sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(_) => return false,
        };
        match sink.as_ref() {
            Some(tx) if !self.inputs.is_empty() => {
                tx.send(EngineMessage::Midi(bytes.to_vec())).is_ok()
            }
            _ => false,
        }
    }
}

impl MidiBackend for MockBackend {
    fn list_devices(&self) -> Vec<String> {
        let mut devices = self.inputs.clone();
        for name in &self.outputs {
            if !devices.contains(name) {
                devices.push(name.clone());
            }
        }
        devices
    }

    fn open(
        &mut self,
        sink: MessageSink,
    ) -> Result<(Vec<Box<dyn InputPort>>, Vec<Box<dyn OutputPort>>)> {
        if let Some(reason) = &self.failure {
            return Err(MidiError::InitError(reason.clone()));
        }

        if let Ok(mut slot) = self.sink.lock() {
            *slot = Some(sink);
        }

        let inputs = self
            .inputs
            .iter()
            .map(|name| Box::new(MockInput { name: name.clone() }) as Box<dyn InputPort>)
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|name| {
                Box::new(MockOutput {
                    name: name.clone(),
                    sent: self.sent.clone(),
                }) as Box<dyn OutputPort>
            })
            .collect();

        Ok((inputs, outputs))
    }
}
