use super::{InputPort, MessageSink, MidiBackend, MidiError, OutputPort, Result};
use crate::engine::EngineMessage;
use log::{debug, warn};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

/// Backend over the host MIDI subsystem (ALSA, CoreMIDI, WinMM) via midir.
pub struct MidirBackend {
    client_name: String,
}

struct MidirInput {
    name: String,
    _connection: MidiInputConnection<()>,
}

impl InputPort for MidirInput {
    fn name(&self) -> &str {
        &self.name
    }
}

struct MidirOutput {
    name: String,
    connection: Option<MidiOutputConnection>,
}

impl OutputPort for MidirOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| MidiError::SendError("output port closed".to_string()))?;
        if let Err(e) = conn.send(bytes) {
            // a port that fails once is treated as gone
            self.connection = None;
            return Err(e.into());
        }
        Ok(())
    }
}

impl MidirBackend {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    // midir consumes the client on connect, so every port gets its own
    fn connect_input(&self, index: usize, sink: MessageSink) -> Result<MidirInput> {
        let mut midi_in = MidiInput::new(&format!("{}-in", self.client_name))?;
        // channel messages only
        midi_in.ignore(Ignore::All);

        let in_ports = midi_in.ports();
        let in_port = in_ports.get(index).ok_or_else(|| {
            MidiError::ConnectionError(format!("input port {} disappeared", index))
        })?;
        let name = midi_in.port_name(in_port)?;

        let connection = midi_in.connect(
            in_port,
            &format!("{}-input-{}", self.client_name, index),
            move |_stamp, message, _| {
                let _ = sink.send(EngineMessage::Midi(message.to_vec()));
            },
            (),
        )?;

        Ok(MidirInput {
            name,
            _connection: connection,
        })
    }

    fn connect_output(&self, index: usize) -> Result<MidirOutput> {
        let midi_out = MidiOutput::new(&format!("{}-out", self.client_name))?;

        let out_ports = midi_out.ports();
        let out_port = out_ports.get(index).ok_or_else(|| {
            MidiError::ConnectionError(format!("output port {} disappeared", index))
        })?;
        let name = midi_out.port_name(out_port)?;

        let connection =
            midi_out.connect(out_port, &format!("{}-output-{}", self.client_name, index))?;

        Ok(MidirOutput {
            name,
            connection: Some(connection),
        })
    }
}

impl Default for MidirBackend {
    fn default() -> Self {
        Self::new("midilatch")
    }
}

impl MidiBackend for MidirBackend {
    fn list_devices(&self) -> Vec<String> {
        let mut devices = Vec::new();

        if let Ok(midi_in) = MidiInput::new(&format!("{}-list", self.client_name)) {
            for port in midi_in.ports() {
                if let Ok(name) = midi_in.port_name(&port) {
                    devices.push(format!("{} [Input]", name));
                }
            }
        }

        if let Ok(midi_out) = MidiOutput::new(&format!("{}-list", self.client_name)) {
            for port in midi_out.ports() {
                if let Ok(name) = midi_out.port_name(&port) {
                    devices.push(format!("{} [Output]", name));
                }
            }
        }

        devices
    }

    fn open(
        &mut self,
        sink: MessageSink,
    ) -> Result<(Vec<Box<dyn InputPort>>, Vec<Box<dyn OutputPort>>)> {
        // Probing both directions first turns a missing MIDI subsystem into
        // one session error instead of a warning per port.
        let input_count = MidiInput::new(&format!("{}-scan", self.client_name))?.port_count();
        let output_count = MidiOutput::new(&format!("{}-scan", self.client_name))?.port_count();
        debug!(
            "Found {} input and {} output port(s)",
            input_count, output_count
        );

        let mut inputs: Vec<Box<dyn InputPort>> = Vec::with_capacity(input_count);
        for index in 0..input_count {
            match self.connect_input(index, sink.clone()) {
                Ok(port) => inputs.push(Box::new(port)),
                Err(e) => warn!("Skipping input port {}: {}", index, e),
            }
        }

        let mut outputs: Vec<Box<dyn OutputPort>> = Vec::with_capacity(output_count);
        for index in 0..output_count {
            match self.connect_output(index) {
                Ok(port) => outputs.push(Box::new(port)),
                Err(e) => warn!("Skipping output port {}: {}", index, e),
            }
        }

        Ok((inputs, outputs))
    }
}
