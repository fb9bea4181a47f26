//! The "rest N ticks" suspend point.
//!
//! The host scheduler owns one [`RestFrame`] per running rest invocation and
//! resumes it once per scheduler turn until it reports
//! [`RestStatus::Complete`]. Dropping the frame cancels the rest; nothing is
//! left to undo.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestStatus {
    /// Not yet elapsed, yield back to the scheduler
    Waiting,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestState {
    Idle,
    Running { started: Instant, duration: Duration },
    Done,
}

/// Continuation state for one rest invocation
#[derive(Debug, Clone)]
pub struct RestFrame {
    state: RestState,
}

impl Default for RestFrame {
    fn default() -> Self {
        Self {
            state: RestState::Idle,
        }
    }
}

impl RestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first resumption has started the countdown
    pub fn needs_init(&self) -> bool {
        self.state == RestState::Idle
    }

    pub fn is_complete(&self) -> bool {
        self.state == RestState::Done
    }

    /// Starts the countdown and yields.
    pub fn start(&mut self, now: Instant, duration: Duration) -> RestStatus {
        self.state = RestState::Running {
            started: now,
            duration,
        };
        RestStatus::Waiting
    }

    /// Resumes the rest at `now`. `duration` is only consulted on the first
    /// resumption.
    pub fn resume_at<F>(&mut self, now: Instant, duration: F) -> RestStatus
    where
        F: FnOnce() -> Duration,
    {
        match self.state {
            RestState::Idle => self.start(now, duration()),
            RestState::Running { started, duration } => {
                if now.saturating_duration_since(started) < duration {
                    RestStatus::Waiting
                } else {
                    self.state = RestState::Done;
                    RestStatus::Complete
                }
            }
            RestState::Done => RestStatus::Complete,
        }
    }

    pub fn resume<F>(&mut self, duration: F) -> RestStatus
    where
        F: FnOnce() -> Duration,
    {
        self.resume_at(Instant::now(), duration)
    }
}
