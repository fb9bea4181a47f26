use crate::midi::{ChannelEvent, EventKind};
use log::trace;

pub const NOTE_COUNT: usize = 128;
pub const CONTROLLER_COUNT: usize = 128;
pub const PITCH_BEND_CENTER: u8 = 64;

/// A fixed table of read-and-reset flags.
///
/// A flag is raised by `set` and only lowered by a `take` that observed it
/// raised, so each consumer sees every burst at most once.
#[derive(Debug, Clone)]
pub struct ConsumerLatch<const N: usize> {
    flags: [bool; N],
}

impl<const N: usize> Default for ConsumerLatch<N> {
    fn default() -> Self {
        Self { flags: [false; N] }
    }
}

impl<const N: usize> ConsumerLatch<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: usize) {
        self.flags[index] = true;
    }

    pub fn take(&mut self, index: usize) -> bool {
        std::mem::replace(&mut self.flags[index], false)
    }
}

/// Non-destructive level registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Note,
    Velocity,
    Controller(u8),
    PitchBend,
    Program,
}

/// Latch state written by decoded input and drained by host polls.
#[derive(Debug, Clone)]
pub struct LatchBank {
    edge: ConsumerLatch<{ EventKind::COUNT }>,
    sticky: ConsumerLatch<{ EventKind::COUNT }>,
    any: ConsumerLatch<1>,
    key_down: ConsumerLatch<NOTE_COUNT>,
    last_note: u8,
    last_velocity: u8,
    pitch_bend: u8,
    program: u8,
    controllers: [u8; CONTROLLER_COUNT],
}

impl Default for LatchBank {
    fn default() -> Self {
        Self {
            edge: ConsumerLatch::new(),
            sticky: ConsumerLatch::new(),
            any: ConsumerLatch::new(),
            key_down: ConsumerLatch::new(),
            last_note: 0,
            last_velocity: 0,
            pitch_bend: PITCH_BEND_CENTER,
            program: 0,
            controllers: [0; CONTROLLER_COUNT],
        }
    }
}

impl LatchBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one decoded event. Writes only ever raise flags.
    pub fn record(&mut self, event: ChannelEvent) {
        trace!("Recording {:?}", event);
        match event {
            ChannelEvent::NoteOn { note, velocity } => {
                self.last_note = note & 0x7F;
                self.last_velocity = velocity & 0x7F;
                if self.last_velocity > 0 {
                    self.key_down.set(usize::from(self.last_note));
                }
            }
            ChannelEvent::NoteOff { note } => {
                self.last_note = note & 0x7F;
                self.last_velocity = 0;
            }
            ChannelEvent::ControlChange { controller, value } => {
                self.controllers[usize::from(controller & 0x7F)] = value & 0x7F;
            }
            ChannelEvent::ProgramChange { program } => {
                self.program = program & 0x7F;
            }
            ChannelEvent::PitchBend { value } => {
                self.pitch_bend = value & 0x7F;
            }
        }

        let index = event.kind().index();
        self.edge.set(index);
        self.sticky.set(index);
        self.any.set(0);
    }

    /// Consumes the category's edge flag (the "any new event of this kind" poller).
    pub fn poll_edge(&mut self, kind: EventKind) -> bool {
        self.edge.take(kind.index())
    }

    /// Consumes the category's sticky flag (the selector-addressed poller).
    pub fn poll_sticky(&mut self, kind: EventKind) -> bool {
        self.sticky.take(kind.index())
    }

    /// Consumes the flag raised by any recognized event.
    pub fn poll_any(&mut self) -> bool {
        self.any.take(0)
    }

    /// Consumes the note-on flag for one note number; `note` is masked to 0-127.
    pub fn poll_key_down(&mut self, note: u8) -> bool {
        self.key_down.take(usize::from(note & 0x7F))
    }

    pub fn read(&self, register: Register) -> u8 {
        match register {
            Register::Note => self.last_note,
            Register::Velocity => self.last_velocity,
            Register::Controller(n) => self.controllers[usize::from(n & 0x7F)],
            Register::PitchBend => self.pitch_bend,
            Register::Program => self.program,
        }
    }
}
