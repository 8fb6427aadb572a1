//! Configuration errors.

use seiswave_types::{DomainError, TimeSpanError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or parsed.
    #[error("Failed to load configuration '{path}': {source}")]
    Read {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying INI error.
        source: ini::Error,
    },

    /// The configuration text is not valid INI.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] ini::ParseError),

    /// A required key is missing.
    #[error("Missing required key '{key}' in section [{section}]")]
    MissingKey {
        /// Section name.
        section: &'static str,
        /// Key name.
        key: &'static str,
    },

    /// A value could not be converted to the expected type.
    #[error("Invalid value {value:?} for '{key}' in section [{section}]: expected {expected}")]
    InvalidValue {
        /// Section name.
        section: &'static str,
        /// Key name.
        key: &'static str,
        /// The offending value.
        value: String,
        /// Description of the expected type.
        expected: &'static str,
    },

    /// A timestamp value could not be parsed.
    #[error("Invalid timestamp for '{key}' in section [{section}]: {source}")]
    Timestamp {
        /// Section name.
        section: &'static str,
        /// Key name.
        key: &'static str,
        /// The underlying parse error.
        source: TimeSpanError,
    },

    /// The global time range is inverted.
    #[error(transparent)]
    TimeRange(TimeSpanError),

    /// The bounding box is invalid.
    #[error("Invalid map bounding box: {0}")]
    Domain(#[from] DomainError),
}
