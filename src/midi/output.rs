use super::Result;
use log::debug;

/// A three-byte channel message ready for the wire.
///
/// Construction masks instead of rejecting: the status byte is forced into
/// the channel-voice range 0x80-0xEF and both data bytes into 0-127.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMessage {
    status: u8,
    data1: u8,
    data2: u8,
}

impl OutputMessage {
    pub fn new(status: u8, data1: u8, data2: u8) -> Self {
        let kind = ((status & 0x70) | 0x80).min(0xE0);
        Self {
            status: kind | (status & 0x0F),
            data1: data1 & 0x7F,
            data2: data2 & 0x7F,
        }
    }

    /// `channel` is 1-based; values outside 1-16 wrap around modulo 16.
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(0x90 | Self::channel_nibble(channel), note, velocity)
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(0x80 | Self::channel_nibble(channel), note, velocity)
    }

    fn channel_nibble(channel: u8) -> u8 {
        channel.wrapping_sub(1) & 0x0F
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn bytes(&self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }
}

/// An outbound port the session can broadcast to
pub trait OutputPort {
    fn name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Sends `message` to every open port and returns how many accepted it.
/// Closed ports and per-port failures are skipped.
pub fn broadcast(ports: &mut [Box<dyn OutputPort>], message: OutputMessage) -> usize {
    let bytes = message.bytes();
    let mut delivered = 0;
    for port in ports.iter_mut() {
        if !port.is_open() {
            continue;
        }
        match port.send(&bytes) {
            Ok(()) => delivered += 1,
            Err(e) => debug!("Skipping output port {}: {}", port.name(), e),
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiError;
    use std::sync::{Arc, Mutex};

    struct RecordingPort {
        open: bool,
        fail: bool,
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl OutputPort for RecordingPort {
        fn name(&self) -> &str {
            "recording"
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn send(&mut self, bytes: &[u8]) -> Result<()> {
            if self.fail {
                return Err(MidiError::SendError("port gone".to_string()));
            }
            self.sent.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_note_on_status_byte() {
        assert_eq!(OutputMessage::note_on(1, 60, 127).bytes(), [0x90, 60, 127]);
        assert_eq!(OutputMessage::note_on(16, 60, 127).status(), 0x9F);
        assert_eq!(OutputMessage::note_off(10, 60, 0).bytes(), [0x89, 60, 0]);
    }

    #[test]
    fn test_out_of_range_arguments_are_masked() {
        assert_eq!(OutputMessage::note_on(1, 200, 255).bytes(), [0x90, 72, 127]);
        // channel 0 wraps to 16, channel 17 to 1
        assert_eq!(OutputMessage::note_on(0, 60, 1).status(), 0x9F);
        assert_eq!(OutputMessage::note_on(17, 60, 1).status(), 0x90);
    }

    #[test]
    fn test_status_is_kept_in_channel_voice_range() {
        assert_eq!(OutputMessage::new(0x12, 0, 0).status(), 0x92);
        assert_eq!(OutputMessage::new(0xF3, 0, 0).status(), 0xE3);
        assert_eq!(OutputMessage::new(0xB4, 7, 100).bytes(), [0xB4, 7, 100]);
    }

    #[test]
    fn test_broadcast_skips_closed_and_failing_ports() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut ports: Vec<Box<dyn OutputPort>> = vec![
            Box::new(RecordingPort {
                open: true,
                fail: false,
                sent: sent.clone(),
            }),
            Box::new(RecordingPort {
                open: false,
                fail: false,
                sent: sent.clone(),
            }),
            Box::new(RecordingPort {
                open: true,
                fail: true,
                sent: sent.clone(),
            }),
        ];

        let delivered = broadcast(&mut ports, OutputMessage::note_on(1, 60, 100));
        assert_eq!(delivered, 1);
        assert_eq!(*sent.lock().unwrap(), vec![vec![0x90, 60, 100]]);
    }

    #[test]
    fn test_broadcast_without_ports_is_a_no_op() {
        let mut ports: Vec<Box<dyn OutputPort>> = Vec::new();
        assert_eq!(broadcast(&mut ports, OutputMessage::note_on(1, 60, 127)), 0);
    }
}
