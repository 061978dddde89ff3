//! Contains common, primitive types shared across the Overlayclock crate.
//!
//! Time is carried as a plain `f64` of seconds since the Unix epoch, the same
//! unit the display page compares against `Date.now() / 1000`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds since the Unix epoch, with sub-second precision.
pub type Timestamp = f64;

/// An overlay element whose visibility can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Timer,
    Countdown,
}

impl Target {
    /// Resolves a route or shell argument to a target.
    ///
    /// Unknown names yield `None`; callers treat that as a no-op rather than an error.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "timer" => Some(Target::Timer),
            "countdown" => Some(Target::Countdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Timer => "timer",
            Target::Countdown => "countdown",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_targets() {
        assert_eq!(Target::parse("timer"), Some(Target::Timer));
        assert_eq!(Target::parse("countdown"), Some(Target::Countdown));
    }

    #[test]
    fn unknown_target_is_none() {
        assert_eq!(Target::parse("message"), None);
        assert_eq!(Target::parse("Timer"), None);
        assert_eq!(Target::parse(""), None);
    }
}
