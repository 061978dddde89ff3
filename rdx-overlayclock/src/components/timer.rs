//! Count-up and count-down counters with read-time recompute.

use crate::common::Timestamp;
use tracing::trace;

/// Seconds between `last_update` and `now`, never negative.
///
/// A wall clock stepped backwards must not run a stopwatch in reverse.
fn elapsed_since(last_update: Timestamp, now: Timestamp) -> f64 {
    (now - last_update).max(0.0)
}

/// A count-up stopwatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    /// Elapsed seconds, never negative.
    pub value: f64,
    pub running: bool,
    /// Display hint only.
    pub visible: bool,
    /// The instant `value` was last brought up to date.
    pub last_update: Timestamp,
}

impl Timer {
    pub fn new(now: Timestamp) -> Self {
        Self {
            value: 0.0,
            running: false,
            visible: true,
            last_update: now,
        }
    }

    /// Applies the time elapsed since the last recompute.
    ///
    /// The anchor moves to `now` even when stopped, so the next start measures
    /// from the last observed instant.
    pub fn recompute(&mut self, now: Timestamp) {
        if self.running {
            let elapsed = elapsed_since(self.last_update, now);
            self.value += elapsed;
            trace!(elapsed, value = self.value, "timer advanced");
        }
        self.last_update = now;
    }

    pub fn start(&mut self, now: Timestamp) {
        self.running = true;
        self.last_update = now;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
        self.running = false;
    }
}

/// A count-down timer that stops itself at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    /// Remaining seconds, clamped to zero.
    pub value: f64,
    /// The remaining seconds at the last start. Only used for progress.
    pub initial: f64,
    pub running: bool,
    pub visible: bool,
    pub last_update: Timestamp,
}

impl Countdown {
    pub fn new(now: Timestamp) -> Self {
        Self {
            value: 0.0,
            initial: 0.0,
            running: false,
            visible: true,
            last_update: now,
        }
    }

    /// Applies the time elapsed since the last recompute while running.
    ///
    /// Returns `true` exactly when this call hit zero and stopped the countdown.
    /// That transition is the only state change nobody asked for.
    pub fn recompute(&mut self, now: Timestamp) -> bool {
        if !self.running {
            return false;
        }
        let elapsed = elapsed_since(self.last_update, now);
        self.value = (self.value - elapsed).max(0.0);
        self.last_update = now;
        trace!(elapsed, value = self.value, "countdown advanced");
        if self.value <= 0.0 {
            self.value = 0.0;
            self.running = false;
            return true;
        }
        false
    }

    /// Starts counting down from `seconds`. Callers validate the input.
    pub fn start(&mut self, seconds: f64, now: Timestamp) {
        self.value = seconds;
        self.initial = seconds;
        self.running = true;
        self.last_update = now;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
        self.initial = 0.0;
        self.running = false;
    }

    /// Fraction of the last start still remaining, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.initial > 0.0 {
            (self.value / self.initial).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
