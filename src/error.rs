//! Conversion failures.
//!
//! Unset input is not an error and never reaches this type; the normalizer
//! reports it as `Ok(None)`.

use crate::temporal::Shape;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// No known shape matched, or a matched shape carried an out-of-range
    /// component (month 13, nanoseconds past one second).
    #[error("unparseable {shape} value `{raw}`: {reason}")]
    Unparseable {
        shape: Shape,
        raw: String,
        reason: String,
    },

    /// The shape matched but the components do not name a real moment in
    /// the configured zone (a daylight-saving gap).
    #[error("{shape} value `{raw}` is not a real moment: {reason}")]
    InvalidInstant {
        shape: Shape,
        raw: String,
        reason: String,
    },
}

impl NormalizeError {
    pub fn unparseable(shape: Shape, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        NormalizeError::Unparseable {
            shape,
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_instant(
        shape: Shape,
        raw: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        NormalizeError::InvalidInstant {
            shape,
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            NormalizeError::Unparseable { shape, .. }
            | NormalizeError::InvalidInstant { shape, .. } => *shape,
        }
    }

    /// The offending input as received, for diagnostics.
    pub fn raw(&self) -> &str {
        match self {
            NormalizeError::Unparseable { raw, .. } | NormalizeError::InvalidInstant { raw, .. } => {
                raw
            }
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            NormalizeError::Unparseable { reason, .. }
            | NormalizeError::InvalidInstant { reason, .. } => reason,
        }
    }
}
