//! Defines the events broadcast by the `StateStore` after each applied command.
//!
//! The display page never sees these; it polls. They exist so the server log
//! and the operator shell can follow what the control panel is doing.

use crate::common::{Target, Timestamp};

/// A command the store has applied, or the countdown reaching zero on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    TimerStarted,
    TimerStopped,
    TimerReset,
    /// Fired when a countdown is (re)started from `seconds`.
    CountdownStarted { seconds: f64 },
    CountdownStopped,
    CountdownReset,
    /// Fired once when a recompute finds the countdown at zero and stops it.
    CountdownFinished,
    VisibilityToggled { target: Target, visible: bool },
    MessageSet { text: String, expires_at: Timestamp },
    MessageCleared,
    EventTriggered { event_type: String, expires_at: Timestamp },
}
