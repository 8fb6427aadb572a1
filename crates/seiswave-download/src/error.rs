//! Run errors.

use seiswave_config::ConfigError;
use seiswave_fetch::ArchiveError;
use seiswave_format::FormatError;
use seiswave_types::ChunkSizeError;
use thiserror::Error;

/// Errors that abort a download run.
#[derive(Error, Debug)]
pub enum RunError {
    /// The configuration is incomplete for the requested mode.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured chunk size is invalid.
    #[error(transparent)]
    ChunkSize(#[from] ChunkSizeError),

    /// A metadata query failed.
    #[error("Archive query failed: {0}")]
    Archive(#[from] ArchiveError),

    /// Metadata could not be written.
    #[error("Failed to write metadata: {0}")]
    Format(#[from] FormatError),

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Worker(String),

    /// Some chunks failed; every other chunk was attempted.
    #[error("{failed} of {total} chunks failed")]
    ChunksFailed {
        /// Failed chunk count.
        failed: usize,
        /// Total chunk count.
        total: usize,
    },
}
