//! Musical transport clock.
//!
//! [`TransportClock`] turns fixed-period background ticks into fractional
//! musical ticks at the current tempo. [`Ticker`] is the background thread
//! that produces those periodic ticks.

use crate::engine::EngineMessage;
use crossbeam::channel::Sender;
use log::{info, trace};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Ticks per quarter note
pub const DEFAULT_RESOLUTION: u32 = 480;
pub const DEFAULT_TEMPO: f64 = 120.0;
pub const BEATS_PER_MEASURE: u32 = 4;

/// Clock positions are counted in 1/60_000_000ths of a tick, which makes one
/// period's advance `tempo * resolution * period_us` units: exact for whole
/// tempos and microsecond periods.
const UNITS_PER_TICK: u64 = 60_000_000;

#[derive(Debug, Clone)]
pub struct TransportClock {
    resolution: u32,
    tempo: f64,
    // position within the measure, always in [0, resolution * 4) ticks
    tick_units: u64,
    // units since the last reported beat; drained one beat per poll
    beat_units: u64,
}

impl Default for TransportClock {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION, DEFAULT_TEMPO)
    }
}

impl TransportClock {
    pub fn new(resolution: u32, tempo: f64) -> Self {
        let mut clock = Self {
            resolution: resolution.max(1),
            tempo: DEFAULT_TEMPO,
            tick_units: 0,
            beat_units: 0,
        };
        clock.set_tempo(tempo);
        clock
    }

    pub fn ticks_per_beat(&self) -> u32 {
        self.resolution
    }

    fn beat_units_threshold(&self) -> u64 {
        u64::from(self.resolution) * UNITS_PER_TICK
    }

    fn measure_units(&self) -> u64 {
        self.beat_units_threshold() * u64::from(BEATS_PER_MEASURE)
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Non-finite or negative tempos are ignored; 0 freezes the clock.
    pub fn set_tempo(&mut self, tempo: f64) {
        if tempo.is_finite() && tempo >= 0.0 {
            self.tempo = tempo;
        } else {
            trace!("Ignoring invalid tempo {}", tempo);
        }
    }

    fn units_per_period(&self, period: Duration) -> u64 {
        let period_us = period.as_micros() as f64;
        (self.tempo * f64::from(self.resolution) * period_us).round() as u64
    }

    /// Musical ticks covered by one background period at the current tempo
    pub fn ticks_per_period(&self, period: Duration) -> f64 {
        self.units_per_period(period) as f64 / UNITS_PER_TICK as f64
    }

    /// Advances by one background period.
    pub fn advance(&mut self, period: Duration) {
        let units = self.units_per_period(period);
        self.advance_units(units);
    }

    pub fn advance_ticks(&mut self, delta: f64) {
        if !(delta.is_finite() && delta > 0.0) {
            return;
        }
        self.advance_units((delta * UNITS_PER_TICK as f64).round() as u64);
    }

    fn advance_units(&mut self, units: u64) {
        let measure = self.measure_units();
        self.tick_units = (self.tick_units + units % measure) % measure;
        self.beat_units = self.beat_units.saturating_add(units);
    }

    /// Adopts `tempo`, then reports at most one beat boundary.
    ///
    /// Exactly one beat's worth of ticks is removed per `true`, so overshoot
    /// carries into the next poll and beats that elapsed between polls are
    /// reported on the following polls rather than lost.
    pub fn poll_beat(&mut self, tempo: f64) -> bool {
        self.set_tempo(tempo);
        let threshold = self.beat_units_threshold();
        if self.beat_units >= threshold {
            self.beat_units -= threshold;
            true
        } else {
            false
        }
    }

    /// Whole ticks into the current measure.
    pub fn read_ticks(&self) -> u32 {
        (self.tick_units / UNITS_PER_TICK) as u32
    }

    /// Ticks accumulated toward the next beat report
    pub fn beat_accumulator(&self) -> f64 {
        self.beat_units as f64 / UNITS_PER_TICK as f64
    }

    /// Wall-clock length of `ticks` at the current tempo. A frozen clock
    /// never finishes a non-empty rest.
    pub fn ticks_to_duration(&self, ticks: u32) -> Duration {
        if ticks == 0 {
            return Duration::ZERO;
        }
        let ticks_per_second = self.tempo * f64::from(self.resolution) / 60.0;
        if ticks_per_second <= 0.0 {
            return Duration::MAX;
        }
        Duration::try_from_secs_f64(f64::from(ticks) / ticks_per_second).unwrap_or(Duration::MAX)
    }
}

/// Sends [`EngineMessage::Tick`] at a fixed period from a background thread.
pub struct Ticker {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Fails with `InvalidInput` for a zero period.
    pub fn start(period: Duration, sink: Sender<EngineMessage>) -> std::io::Result<Self> {
        if period.is_zero() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "tick period must be non-zero",
            ));
        }
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("midilatch-ticker".to_string())
            .spawn(move || {
                info!("Ticker started with period {:?}", period);
                let mut next = Instant::now() + period;
                while thread_running.load(Ordering::SeqCst) {
                    if sink.send(EngineMessage::Tick).is_err() {
                        break;
                    }

                    // Sleep to the next deadline so scheduling jitter does not accumulate
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    }
                    next += period;
                }
                info!("Ticker stopped");
            })?;

        Ok(Self {
            running,
            thread_handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
