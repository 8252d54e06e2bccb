//! Per-question countdown.
//!
//! The timer is a plain owned struct with no clock of its own: the session
//! engine calls [`QuestionTimer::tick`] once per second (the runtime's
//! interval is the single tick source), which keeps expiry behavior fully
//! deterministic under test.

use tracing::debug;

/// Countdown for the active question. Re-arms whenever the armed question
/// index changes; the `expired` latch guarantees expiry fires exactly once
/// per question even if ticks keep arriving.
#[derive(Debug, Default)]
pub struct QuestionTimer {
    armed: Option<usize>,
    seconds_left: u32,
    expired: bool,
}

impl QuestionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the countdown entirely (phase left in-progress, session reset).
    pub fn disarm(&mut self) {
        self.armed = None;
        self.seconds_left = 0;
        self.expired = false;
    }

    /// Arms the timer for `question_index` with a fresh countdown. A no-op if
    /// that question is already armed; a changed index (or a re-arm after
    /// disarm) resets the countdown and clears the expired latch.
    pub fn sync(&mut self, question_index: usize, time_limit: u32) {
        if self.armed != Some(question_index) {
            debug!("timer armed for question {question_index}: {time_limit}s");
            self.armed = Some(question_index);
            self.seconds_left = time_limit;
            self.expired = false;
        }
    }

    /// Advances the countdown by one second. Returns `true` exactly once,
    /// on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.armed.is_none() || self.expired {
            return false;
        }
        if self.seconds_left > 0 {
            self.seconds_left -= 1;
        }
        if self.seconds_left == 0 {
            self.expired = true;
            return true;
        }
        false
    }

    /// Remaining seconds for `question_index`, or `None` when that question
    /// is not the armed one. Keeps a just-expired countdown from leaking into
    /// the next question's display before the re-arming tick.
    pub fn seconds_left(&self, question_index: usize) -> Option<u32> {
        (self.armed == Some(question_index)).then_some(self.seconds_left)
    }
}
