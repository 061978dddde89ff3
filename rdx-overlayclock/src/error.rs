//! Error types surfaced by the control API.

use thiserror::Error;

/// A command the store refused to apply. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },
}

impl ControlError {
    /// Accepts a finite, non-negative number for `field`.
    pub(crate) fn check_duration(field: &'static str, value: f64) -> Result<f64, Self> {
        if !value.is_finite() {
            return Err(ControlError::InvalidInput {
                field,
                reason: "must be a finite number",
            });
        }
        if value < 0.0 {
            return Err(ControlError::InvalidInput {
                field,
                reason: "must not be negative",
            });
        }
        Ok(value)
    }
}
