//! Error types for seiswave core types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error for invalid time spans and timestamps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeSpanError {
    /// Start is after end.
    #[error("Invalid time span: {start} > {end}")]
    InvalidSpan {
        /// The start time.
        start: DateTime<Utc>,
        /// The end time.
        end: DateTime<Utc>,
    },

    /// Timestamp text could not be parsed.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Error for an unrecognized chunk size.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkSizeError {
    /// Neither a positive day count nor the month sentinel.
    #[error("Chunk size {0:?} is invalid: expected a positive number of days or \"mon\"")]
    Invalid(String),
}

/// Error for an invalid geographic bounding box.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A coordinate is NaN or infinite.
    #[error("Bounding box coordinates must be finite")]
    NotFinite,

    /// Latitude outside [-90, 90].
    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180].
    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// Minimum exceeds maximum.
    #[error("Minimum {axis} {min} is greater than maximum {max}")]
    Inverted {
        /// Which axis is inverted.
        axis: &'static str,
        /// The minimum value.
        min: f64,
        /// The maximum value.
        max: f64,
    },
}
