//! Decoding of raw MIDI channel messages into typed events.
//!
//! Only the five channel-voice categories the latch bank tracks are decoded.
//! Everything else (aftertouch, channel pressure, system messages) and any
//! message that is too short is dropped without an error, so a single bad
//! frame never interrupts the input stream.

use std::fmt;
use std::str::FromStr;

/// A decoded channel message. The channel nibble is not kept: the latch bank
/// merges all sixteen channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Note On with a non-zero velocity
    NoteOn { note: u8, velocity: u8 },
    /// Note Off, or a Note On with velocity 0
    NoteOff { note: u8 },
    /// Control Change with controller number and value
    ControlChange { controller: u8, value: u8 },
    /// Program Change with program number
    ProgramChange { program: u8 },
    /// Pitch Bend, most significant data byte only
    PitchBend { value: u8 },
}

impl ChannelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChannelEvent::NoteOn { .. } => EventKind::NoteOn,
            ChannelEvent::NoteOff { .. } => EventKind::NoteOff,
            ChannelEvent::ControlChange { .. } => EventKind::ControlChange,
            ChannelEvent::ProgramChange { .. } => EventKind::ProgramChange,
            ChannelEvent::PitchBend { .. } => EventKind::PitchBend,
        }
    }
}

/// Event category, used to address edge and sticky latches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    ControlChange,
    PitchBend,
    ProgramChange,
}

impl EventKind {
    pub const COUNT: usize = 5;

    pub const ALL: [EventKind; EventKind::COUNT] = [
        EventKind::NoteOn,
        EventKind::NoteOff,
        EventKind::ControlChange,
        EventKind::PitchBend,
        EventKind::ProgramChange,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Selector value used by the host's event-type menu.
    pub fn selector(self) -> &'static str {
        match self {
            EventKind::NoteOn => "key-on",
            EventKind::NoteOff => "key-of",
            EventKind::ControlChange => "cc-chg",
            EventKind::PitchBend => "p-bend",
            EventKind::ProgramChange => "pg-chg",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Returned when a host selector names no known event category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind(pub String);

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event selector: {}", self.0)
    }
}

impl std::error::Error for UnknownEventKind {}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.selector() == s.trim())
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Parses a raw 1-3 byte MIDI message.
///
/// Pitch bend keeps only the MSB (data2); the LSB is ignored, which gives the
/// same 0-127 range as every other register.
pub fn decode(data: &[u8]) -> Option<ChannelEvent> {
    let status = *data.first()?;
    let data1 = data.get(1).map(|b| b & 0x7F);
    let data2 = data.get(2).map(|b| b & 0x7F);

    match status & 0xF0 {
        0x80 => Some(ChannelEvent::NoteOff { note: data1? }),
        0x90 => match (data1?, data2?) {
            (note, 0) => Some(ChannelEvent::NoteOff { note }),
            (note, velocity) => Some(ChannelEvent::NoteOn { note, velocity }),
        },
        0xB0 => Some(ChannelEvent::ControlChange {
            controller: data1?,
            value: data2?,
        }),
        0xC0 => Some(ChannelEvent::ProgramChange { program: data1? }),
        0xE0 => Some(ChannelEvent::PitchBend { value: data2? }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_any_channel() {
        assert_eq!(
            decode(&[0x90, 60, 100]),
            Some(ChannelEvent::NoteOn {
                note: 60,
                velocity: 100
            })
        );
        assert_eq!(
            decode(&[0x9F, 61, 1]),
            Some(ChannelEvent::NoteOn {
                note: 61,
                velocity: 1
            })
        );
    }

    #[test]
    fn test_zero_velocity_note_on_is_note_off() {
        assert_eq!(
            decode(&[0x93, 64, 0]),
            Some(ChannelEvent::NoteOff { note: 64 })
        );
    }

    #[test]
    fn test_note_off_ignores_release_velocity() {
        assert_eq!(
            decode(&[0x80, 60, 64]),
            Some(ChannelEvent::NoteOff { note: 60 })
        );
        assert_eq!(decode(&[0x80, 60]), Some(ChannelEvent::NoteOff { note: 60 }));
    }

    #[test]
    fn test_control_and_program_change() {
        assert_eq!(
            decode(&[0xB0, 7, 99]),
            Some(ChannelEvent::ControlChange {
                controller: 7,
                value: 99
            })
        );
        assert_eq!(
            decode(&[0xC5, 42]),
            Some(ChannelEvent::ProgramChange { program: 42 })
        );
    }

    #[test]
    fn test_pitch_bend_reads_msb_only() {
        assert_eq!(
            decode(&[0xE0, 0x7F, 0x20]),
            Some(ChannelEvent::PitchBend { value: 0x20 })
        );
    }

    #[test]
    fn test_unsupported_status_is_dropped() {
        assert_eq!(decode(&[0xA0, 60, 10]), None);
        assert_eq!(decode(&[0xD0, 10]), None);
        assert_eq!(decode(&[0xF8]), None);
        assert_eq!(decode(&[0xF0, 0x7E, 0x7F]), None);
    }

    #[test]
    fn test_partial_messages_are_dropped() {
        assert_eq!(decode(&[]), None);
        assert_eq!(decode(&[0x90]), None);
        assert_eq!(decode(&[0x90, 60]), None);
        assert_eq!(decode(&[0xB0, 7]), None);
        assert_eq!(decode(&[0xE0, 0]), None);
        assert_eq!(decode(&[0xC0]), None);
    }

    #[test]
    fn test_data_bytes_are_masked() {
        assert_eq!(
            decode(&[0xB0, 0x87, 0xFF]),
            Some(ChannelEvent::ControlChange {
                controller: 7,
                value: 0x7F
            })
        );
    }

    #[test]
    fn test_selector_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.selector().parse::<EventKind>(), Ok(kind));
        }
        assert!("key-up".parse::<EventKind>().is_err());
    }
}
