//! Download chunking of network time spans.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::{ChunkSizeError, SpanChunks, TimeSpan};

/// How a network's time span is split into download chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkSize {
    /// One chunk per calendar month.
    Month,
    /// Fixed-length chunks of the given number of days.
    Days(NonZeroU32),
}

impl ChunkSize {
    /// The configuration sentinel selecting calendar-month chunks.
    pub const MONTH_SENTINEL: &'static str = "mon";

    /// Returns the day count for fixed-length chunking.
    #[must_use]
    pub const fn days(&self) -> Option<u32> {
        match self {
            Self::Month => None,
            Self::Days(days) => Some(days.get()),
        }
    }

    /// Splits a span according to this chunk size.
    #[must_use]
    pub fn partition(&self, span: &TimeSpan) -> SpanChunks {
        match self {
            Self::Month => span.months(),
            Self::Days(days) => span.days(days.get()),
        }
    }
}

impl std::fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Month => f.write_str(Self::MONTH_SENTINEL),
            Self::Days(days) => write!(f, "{days}"),
        }
    }
}

impl FromStr for ChunkSize {
    type Err = ChunkSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(Self::MONTH_SENTINEL) {
            return Ok(Self::Month);
        }
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self::Days)
            .ok_or_else(|| ChunkSizeError::Invalid(s.to_string()))
    }
}

/// The effective download span of one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpan {
    /// Network code.
    pub network: String,
    /// Network lifetime intersected with the configured global range.
    pub span: TimeSpan,
}

impl NetworkSpan {
    /// Creates a new network span.
    #[must_use]
    pub fn new(network: impl Into<String>, span: TimeSpan) -> Self {
        Self {
            network: network.into(),
            span,
        }
    }

    /// Splits the network span into download chunks.
    pub fn chunks(&self, size: ChunkSize) -> impl Iterator<Item = DownloadChunk> + '_ {
        size.partition(&self.span)
            .map(|span| DownloadChunk::new(self.network.clone(), span))
    }
}

/// A unit of continuous-mode download work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadChunk {
    /// Network code.
    pub network: String,
    /// Chunk time span, within the parent network span.
    pub span: TimeSpan,
}

impl DownloadChunk {
    /// Creates a new download chunk.
    #[must_use]
    pub fn new(network: impl Into<String>, span: TimeSpan) -> Self {
        Self {
            network: network.into(),
            span,
        }
    }
}

impl std::fmt::Display for DownloadChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.network, self.span)
    }
}
