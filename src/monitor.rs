//! Terminal host for the engine.
//!
//! The monitor plays the role of a poll-driven runtime: once per turn it
//! drains every edge latch, reads the matching registers and advances a
//! beat display from `poll_beat`.

use crate::clock::BEATS_PER_MEASURE;
use crate::engine::EngineHandle;
use crate::midi::EventKind;
use crate::rest::{RestFrame, RestStatus};
use chrono::Local;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};
use std::thread;
use std::time::Duration;

/// Interval between host turns
pub const TURN_INTERVAL: Duration = Duration::from_millis(20);

fn create_beat_progress(multi_progress: &MultiProgress) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new(u64::from(BEATS_PER_MEASURE)));
    if let Ok(style) =
        ProgressStyle::default_bar().template("{prefix:.bold} [{bar:20.cyan}] {pos}/{len}")
    {
        pb.set_style(style.progress_chars("⣀⣤⣦⣶⣷⣿ "));
    }
    pb.set_prefix("Beat");
    pb
}

fn create_status_spinner(multi_progress: &MultiProgress) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new_spinner());
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{prefix:.bold.dim} {spinner} {wide_msg}")
    {
        pb.set_style(style);
    }
    pb.set_prefix("Clock");
    pb
}

pub struct Monitor {
    handle: EngineHandle,
    tempo: f64,
    multi_progress: MultiProgress,
    beat_pb: ProgressBar,
    status_pb: ProgressBar,
    beats: u64,
}

impl Monitor {
    pub fn new(handle: EngineHandle, tempo: f64) -> Self {
        Self::with_draw_target(handle, tempo, ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(
        handle: EngineHandle,
        tempo: f64,
        target: ProgressDrawTarget,
    ) -> Self {
        let multi_progress = MultiProgress::with_draw_target(target);
        let beat_pb = create_beat_progress(&multi_progress);
        let status_pb = create_status_spinner(&multi_progress);

        Self {
            handle,
            tempo,
            multi_progress,
            beat_pb,
            status_pb,
            beats: 0,
        }
    }

    pub fn beats(&self) -> u64 {
        self.beats
    }

    fn describe(&self, kind: EventKind) -> String {
        match kind {
            EventKind::NoteOn => format!(
                "{} note={} vel={}",
                kind,
                self.handle.read_note(),
                self.handle.read_velocity()
            ),
            EventKind::NoteOff => format!("{} note={}", kind, self.handle.read_note()),
            EventKind::ControlChange => kind.to_string(),
            EventKind::PitchBend => format!("{} value={}", kind, self.handle.read_pitch_bend()),
            EventKind::ProgramChange => {
                format!("{} program={}", kind, self.handle.read_program())
            }
        }
    }

    /// One host turn. Returns a timestamped line per category that fired.
    pub fn turn(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        if self.handle.poll_any_event() {
            let stamp = Local::now().format("%H:%M:%S%.3f");
            for kind in EventKind::ALL {
                if self.handle.poll_edge(kind) {
                    lines.push(format!("[{}] {}", stamp, self.describe(kind)));
                }
            }
        }

        if self.handle.poll_beat(self.tempo) {
            self.beats += 1;
            self.beat_pb
                .set_position((self.beats - 1) % u64::from(BEATS_PER_MEASURE) + 1);
        }

        self.status_pb.set_message(format!(
            "BPM: {}, Tick: {}, Beats: {}",
            self.tempo,
            self.handle.read_ticks(),
            self.beats
        ));
        self.status_pb.tick();

        lines
    }

    /// Runs host turns until the process exits.
    pub fn run(&mut self) -> ! {
        info!("Monitor running at {} BPM", self.tempo);
        loop {
            for line in self.turn() {
                debug!("{}", line);
                let _ = self.multi_progress.println(line);
            }
            thread::sleep(TURN_INTERVAL);
        }
    }
}

/// Plays middle C for `ticks` ticks, resting on the engine clock between
/// the note on and the note off.
pub fn play_test_note(handle: &EngineHandle, ticks: u32) {
    info!("Sending test note (Middle C)");
    handle.send_note_on(1, 60, 127);

    let mut frame = RestFrame::new();
    while handle.rest_ticks(ticks, &mut frame) == RestStatus::Waiting {
        thread::sleep(TURN_INTERVAL);
    }

    handle.send_note_off(1, 60, 0);
    info!("Test note released");
}
