//! The overlay state and its wire-format snapshot.

use crate::common::Timestamp;
use crate::components::{Countdown, Event, Message, Timer};
use serde::{Deserialize, Serialize};

/// Everything the display page renders, guarded as one unit by the store's lock.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub timer: Timer,
    pub countdown: Countdown,
    pub message: Message,
    pub event: Event,
}

impl OverlayState {
    pub fn new(now: Timestamp) -> Self {
        Self {
            timer: Timer::new(now),
            countdown: Countdown::new(now),
            message: Message::default(),
            event: Event::default(),
        }
    }

    /// Brings both counters up to `now`.
    ///
    /// Returns `true` if the countdown reached zero during this call.
    pub fn recompute(&mut self, now: Timestamp) -> bool {
        self.timer.recompute(now);
        self.countdown.recompute(now)
    }

    /// Copies the state into its wire form. Does not recompute.
    pub fn snapshot(&self, now: Timestamp) -> Snapshot {
        Snapshot {
            timer: TimerView {
                value: self.timer.value,
                running: self.timer.running,
                visible: self.timer.visible,
                last_update: self.timer.last_update,
            },
            countdown: CountdownView {
                value: self.countdown.value,
                initial: self.countdown.initial,
                running: self.countdown.running,
                visible: self.countdown.visible,
                last_update: self.countdown.last_update,
                progress: self.countdown.progress(),
            },
            message: MessageView {
                text: self.message.text.clone(),
                color: self.message.color.clone(),
                expires_at: self.message.expires_at,
                active: self.message.is_active(now),
            },
            event: EventView {
                event_type: self.event.event_type.clone(),
                expires_at: self.event.expires_at,
                active: self.event.is_active(now),
            },
        }
    }
}

/// A fully recomputed, read-only copy of the overlay state.
///
/// Serializes to the JSON the display page polls. The `progress` and `active`
/// fields are derived when the snapshot is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timer: TimerView,
    pub countdown: CountdownView,
    pub message: MessageView,
    pub event: EventView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub value: f64,
    pub running: bool,
    pub visible: bool,
    pub last_update: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownView {
    pub value: f64,
    pub initial: f64,
    pub running: bool,
    pub visible: bool,
    pub last_update: Timestamp,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub text: String,
    pub color: String,
    pub expires_at: Timestamp,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    #[serde(rename = "type")]
    pub event_type: String,
    pub expires_at: Timestamp,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_matches_wire_format() {
        let mut state = OverlayState::new(1000.0);
        state.event.trigger("glitch".into(), 5.0, 1000.0);
        let value = serde_json::to_value(state.snapshot(1001.0)).unwrap();
        assert_eq!(
            value,
            json!({
                "timer": { "value": 0.0, "running": false, "visible": true, "last_update": 1000.0 },
                "countdown": {
                    "value": 0.0, "initial": 0.0, "running": false, "visible": true,
                    "last_update": 1000.0, "progress": 0.0
                },
                "message": { "text": "", "color": "#b71c1c", "expires_at": 0.0, "active": false },
                "event": { "type": "glitch", "expires_at": 1005.0, "active": true }
            })
        );
    }

    #[test]
    fn recompute_reports_countdown_finish() {
        let mut state = OverlayState::new(0.0);
        state.countdown.start(1.0, 0.0);
        state.timer.start(0.0);
        assert!(state.recompute(2.0));
        assert_eq!(state.timer.value, 2.0);
        assert!(!state.recompute(3.0));
    }
}
