//! Engine error taxonomy
//!
//! Argument and transition errors are rejected at the call boundary with no
//! partial mutation. Transient per-tick conditions (a probe miss, a fade
//! still in flight) are never errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThrowError {
    /// A caller-supplied value is unusable (zero direction, non-finite input)
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A clip reference is empty or has no playable length
    #[error("invalid clip: {0}")]
    InvalidClip(&'static str),

    /// A normalized value fell outside [0, 1]
    #[error("{what} must be within [0, 1], got {value}")]
    OutOfRange { what: &'static str, value: f32 },

    /// An operation was attempted from the wrong state
    #[error("cannot {op} while {state}")]
    InvalidTransition {
        op: &'static str,
        state: &'static str,
    },

    /// A required collaborator reference is absent
    #[error("missing reference: {0}")]
    MissingReference(&'static str),
}
