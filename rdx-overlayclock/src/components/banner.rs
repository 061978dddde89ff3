//! Transient banners whose activity is derived from an expiry timestamp.
//!
//! Neither type stores an "active" flag. A banner is showing iff it has
//! content and the clock is still before `expires_at`.

use crate::common::Timestamp;

/// The color a message gets when the caller does not pick one.
pub const DEFAULT_MESSAGE_COLOR: &str = "#b71c1c";

/// A text banner shown over the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Empty means no message.
    pub text: String,
    pub color: String,
    pub expires_at: Timestamp,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: DEFAULT_MESSAGE_COLOR.to_string(),
            expires_at: 0.0,
        }
    }
}

impl Message {
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.text.is_empty() && now < self.expires_at
    }

    /// Seconds until the message expires, zero once inactive.
    pub fn remaining(&self, now: Timestamp) -> f64 {
        if self.is_active(now) {
            self.expires_at - now
        } else {
            0.0
        }
    }

    pub fn set(&mut self, text: String, color: String, duration: f64, now: Timestamp) {
        self.text = text;
        self.color = color;
        self.expires_at = now + duration;
    }

    /// Forces the message inactive regardless of the clock. Keeps the color.
    pub fn clear(&mut self) {
        self.text.clear();
        self.expires_at = 0.0;
    }
}

/// A short-lived visual trigger such as `"confetti"` or `"glitch"`.
///
/// The display page decides when a trigger is new by comparing the tag across
/// polls; the store only records the latest one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Empty means no event.
    pub event_type: String,
    pub expires_at: Timestamp,
}

impl Event {
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.event_type.is_empty() && now < self.expires_at
    }

    pub fn trigger(&mut self, event_type: String, duration: f64, now: Timestamp) {
        self.event_type = event_type;
        self.expires_at = now + duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_expires_without_clear() {
        let mut message = Message::default();
        message.set("hi".into(), "#fff".into(), 1.0, 100.0);
        assert!(message.is_active(100.0));
        assert!(message.is_active(100.999));
        assert!(!message.is_active(101.0));
        assert_eq!(message.text, "hi");
    }

    #[test]
    fn empty_text_is_never_active() {
        let mut message = Message::default();
        message.set(String::new(), "#fff".into(), 30.0, 0.0);
        assert!(!message.is_active(1.0));
        assert_eq!(message.remaining(1.0), 0.0);
    }

    #[test]
    fn clear_forces_inactive_and_is_idempotent() {
        let mut message = Message::default();
        message.set("hello".into(), "#00ff00".into(), 60.0, 0.0);
        message.clear();
        assert!(!message.is_active(1.0));
        message.clear();
        assert_eq!(message.text, "");
        assert_eq!(message.expires_at, 0.0);
        assert_eq!(message.color, "#00ff00");
    }

    #[test]
    fn remaining_counts_down() {
        let mut message = Message::default();
        message.set("x".into(), DEFAULT_MESSAGE_COLOR.into(), 5.0, 10.0);
        assert_eq!(message.remaining(12.0), 3.0);
    }

    #[test]
    fn event_activity_is_derived() {
        let mut event = Event::default();
        assert!(!event.is_active(0.0));
        event.trigger("confetti".into(), 5.0, 10.0);
        assert!(event.is_active(14.0));
        assert!(!event.is_active(15.0));
        assert_eq!(event.event_type, "confetti");
    }
}
