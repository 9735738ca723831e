//! Error types for nominal-delta operations.

use thiserror::Error;

use crate::point::PointKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeltaError {
    #[error("Non-integral {field}: {value}")]
    NonIntegral { field: &'static str, value: f64 },

    #[error("Invalid seconds: {0}")]
    InvalidSeconds(String),

    #[error("Unsupported scale factor: {0} is not an integer")]
    NonIntegralFactor(f64),

    #[error("Cannot diff a {left} against a {right}")]
    MismatchedPoints { left: PointKind, right: PointKind },

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Nonexistent local time: {0}")]
    NonexistentLocalTime(String),

    #[error("Ambiguous local time: {0}")]
    AmbiguousLocalTime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, DeltaError>;
