//! The engine actor.
//!
//! One thread owns the [`LatchBank`] and [`TransportClock`]. MIDI input
//! callbacks and the [`Ticker`] enqueue [`EngineMessage`]s; host polls are
//! request/reply messages answered from the owning thread. Every message is
//! handled to completion before the next, so each read-and-reset is atomic
//! and events are recorded in delivery order.

use crate::clock::{Ticker, TransportClock};
use crate::config::EngineConfig;
use crate::latch::{LatchBank, Register, PITCH_BEND_CENTER};
use crate::midi::{
    decode, DeviceSession, EventKind, MidiBackend, MidiError, OutputMessage, Result,
    SessionInfo,
};
use crate::rest::{RestFrame, RestStatus};
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Messages accepted by the engine thread
#[derive(Debug)]
pub enum EngineMessage {
    /// Raw bytes of one inbound MIDI message
    Midi(Vec<u8>),
    /// One background clock period elapsed
    Tick,
    /// Outbound message to broadcast on every output port
    Send(OutputMessage),
    Query(Query, Sender<Reply>),
    Shutdown,
}

/// Host requests that need an answer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Query {
    PollEdge(EventKind),
    PollSticky(EventKind),
    PollAny,
    PollKeyDown(u8),
    Read(Register),
    PollBeat(f64),
    ReadTicks,
    RestDuration(u32),
    Session,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Flag(bool),
    Value(u8),
    Ticks(u32),
    Duration(Duration),
    Session(SessionInfo),
}

/// Latch and clock state, without any threads attached.
#[derive(Debug, Clone)]
pub struct EngineState {
    latch: LatchBank,
    clock: TransportClock,
    tick_period: Duration,
}

impl EngineState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            latch: LatchBank::new(),
            clock: TransportClock::new(config.resolution, config.default_tempo),
            tick_period: config.tick_period(),
        }
    }

    pub fn clock(&self) -> &TransportClock {
        &self.clock
    }

    /// Decodes and records one raw message; unsupported messages are dropped.
    pub fn handle_midi(&mut self, bytes: &[u8]) {
        match decode(bytes) {
            Some(event) => self.latch.record(event),
            None => debug!("Ignoring MIDI message {:02X?}", bytes),
        }
    }

    pub fn tick(&mut self) {
        self.clock.advance(self.tick_period);
    }

    /// Answers every query except [`Query::Session`], which needs the session.
    pub fn answer(&mut self, query: Query) -> Reply {
        match query {
            Query::PollEdge(kind) => Reply::Flag(self.latch.poll_edge(kind)),
            Query::PollSticky(kind) => Reply::Flag(self.latch.poll_sticky(kind)),
            Query::PollAny => Reply::Flag(self.latch.poll_any()),
            Query::PollKeyDown(note) => Reply::Flag(self.latch.poll_key_down(note)),
            Query::Read(register) => Reply::Value(self.latch.read(register)),
            Query::PollBeat(tempo) => Reply::Flag(self.clock.poll_beat(tempo)),
            Query::ReadTicks => Reply::Ticks(self.clock.read_ticks()),
            Query::RestDuration(ticks) => Reply::Duration(self.clock.ticks_to_duration(ticks)),
            Query::Session => Reply::Session(SessionInfo::default()),
        }
    }
}

fn run_actor<B>(
    mut state: EngineState,
    mut backend: B,
    sink: Sender<EngineMessage>,
    rx: Receiver<EngineMessage>,
) where
    B: MidiBackend,
{
    let mut session = DeviceSession::open(&mut backend, sink);
    info!("Engine running");

    while let Ok(message) = rx.recv() {
        match message {
            EngineMessage::Midi(bytes) => state.handle_midi(&bytes),
            EngineMessage::Tick => state.tick(),
            EngineMessage::Send(msg) => {
                let delivered = session.send(msg);
                debug!("Sent {:02X?} to {} port(s)", msg.bytes(), delivered);
            }
            EngineMessage::Query(Query::Session, reply) => {
                let _ = reply.send(Reply::Session(session.info()));
            }
            EngineMessage::Query(query, reply) => {
                let _ = reply.send(state.answer(query));
            }
            EngineMessage::Shutdown => break,
        }
    }

    session.close();
    info!("Engine stopped");
}

/// Cloneable host-side handle.
///
/// Once the engine is gone every poll returns false and every read returns
/// the register's default.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: Sender<EngineMessage>,
}

impl EngineHandle {
    fn ask(&self, query: Query) -> Option<Reply> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx.send(EngineMessage::Query(query, reply_tx)).ok()?;
        reply_rx.recv().ok()
    }

    fn ask_flag(&self, query: Query) -> bool {
        matches!(self.ask(query), Some(Reply::Flag(true)))
    }

    fn ask_value(&self, register: Register) -> u8 {
        match self.ask(Query::Read(register)) {
            Some(Reply::Value(value)) => value,
            _ if register == Register::PitchBend => PITCH_BEND_CENTER,
            _ => 0,
        }
    }

    pub fn poll_edge(&self, kind: EventKind) -> bool {
        self.ask_flag(Query::PollEdge(kind))
    }

    pub fn poll_sticky(&self, kind: EventKind) -> bool {
        self.ask_flag(Query::PollSticky(kind))
    }

    /// Sticky poll addressed by a host menu selector such as `"key-on"`.
    /// Unknown selectors never match.
    pub fn poll_selector(&self, selector: &str) -> bool {
        match selector.parse::<EventKind>() {
            Ok(kind) => self.poll_sticky(kind),
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    pub fn poll_any_event(&self) -> bool {
        self.ask_flag(Query::PollAny)
    }

    pub fn poll_key_down(&self, note: u8) -> bool {
        self.ask_flag(Query::PollKeyDown(note))
    }

    pub fn read_note(&self) -> u8 {
        self.ask_value(Register::Note)
    }

    pub fn read_velocity(&self) -> u8 {
        self.ask_value(Register::Velocity)
    }

    pub fn read_controller(&self, controller: u8) -> u8 {
        self.ask_value(Register::Controller(controller))
    }

    pub fn read_pitch_bend(&self) -> u8 {
        self.ask_value(Register::PitchBend)
    }

    pub fn read_program(&self) -> u8 {
        self.ask_value(Register::Program)
    }

    pub fn poll_beat(&self, tempo: f64) -> bool {
        self.ask_flag(Query::PollBeat(tempo))
    }

    pub fn read_ticks(&self) -> u32 {
        match self.ask(Query::ReadTicks) {
            Some(Reply::Ticks(ticks)) => ticks,
            _ => 0,
        }
    }

    /// One scheduler turn of a "rest `ticks` ticks" command. The tick count
    /// is converted at the tempo current on first entry.
    pub fn rest_ticks(&self, ticks: u32, frame: &mut RestFrame) -> RestStatus {
        frame.resume(|| match self.ask(Query::RestDuration(ticks)) {
            Some(Reply::Duration(duration)) => duration,
            _ => Duration::ZERO,
        })
    }

    pub fn send_note_on(&self, channel: u8, note: u8, velocity: u8) {
        self.send(OutputMessage::note_on(channel, note, velocity));
    }

    pub fn send_note_off(&self, channel: u8, note: u8, velocity: u8) {
        self.send(OutputMessage::note_off(channel, note, velocity));
    }

    pub fn send(&self, message: OutputMessage) {
        let _ = self.tx.send(EngineMessage::Send(message));
    }

    /// Feeds raw bytes through the same path as an input port.
    pub fn feed(&self, bytes: &[u8]) {
        let _ = self.tx.send(EngineMessage::Midi(bytes.to_vec()));
    }

    pub fn session_info(&self) -> SessionInfo {
        match self.ask(Query::Session) {
            Some(Reply::Session(info)) => info,
            _ => SessionInfo {
                failure: Some("engine stopped".to_string()),
                ..SessionInfo::default()
            },
        }
    }

    /// Forwards host diagnostic text to the log.
    pub fn write_log(&self, text: &str) {
        info!("{}", text);
    }
}

/// A running engine: actor thread, ticker and device session.
///
/// Dropping the engine tears all three down.
pub struct Engine {
    handle: EngineHandle,
    actor: Option<JoinHandle<()>>,
    ticker: Option<Ticker>,
}

impl Engine {
    /// Starts the engine thread and the ticker. Settings that fail
    /// [`EngineConfig::validate`] are rejected before anything is spawned.
    pub fn start<B>(config: &EngineConfig, backend: B) -> Result<Self>
    where
        B: MidiBackend + Send + 'static,
    {
        let config = config
            .clone()
            .validate()
            .map_err(|e| MidiError::InvalidConfig(e.to_string()))?;

        let (tx, rx) = unbounded();
        let state = EngineState::new(&config);
        let sink = tx.clone();

        let actor = thread::Builder::new()
            .name("midilatch-engine".to_string())
            .spawn(move || run_actor(state, backend, sink, rx))?;

        let ticker = match Ticker::start(config.tick_period(), tx.clone()) {
            Ok(ticker) => ticker,
            Err(e) => {
                error!("Failed to start ticker: {}", e);
                let _ = tx.send(EngineMessage::Shutdown);
                let _ = actor.join();
                return Err(e.into());
            }
        };

        info!(
            "Engine started: resolution {}, tick period {:?}, tempo {}",
            config.resolution,
            config.tick_period(),
            config.default_tempo
        );

        Ok(Self {
            handle: EngineHandle { tx },
            actor: Some(actor),
            ticker: Some(ticker),
        })
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn shutdown(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        if let Some(actor) = self.actor.take() {
            let _ = self.handle.tx.send(EngineMessage::Shutdown);
            let _ = actor.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
