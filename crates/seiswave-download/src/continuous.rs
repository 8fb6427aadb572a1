//! Continuous-mode work items.

use chrono::TimeDelta;
use seiswave_config::Settings;
use seiswave_fetch::{DownloadReport, Restrictions};
use seiswave_types::{ChunkSize, DownloadChunk};
use serde::Serialize;

/// Minimum covered fraction for continuous traces.
const CONTINUOUS_MINIMUM_LENGTH: f64 = 0.01;

/// Minimum spacing between stations in continuous mode.
const CONTINUOUS_MINIMUM_DISTANCE_M: f64 = 100.0;

/// Builds the restrictions for one continuous-mode chunk.
///
/// Day-sized chunks also fix the file length to the chunk size; monthly
/// chunks produce one file per channel and chunk.
#[must_use]
pub fn chunk_restrictions(settings: &Settings, chunk: &DownloadChunk, size: ChunkSize) -> Restrictions {
    let restrictions = Restrictions::new(chunk.span)
        .with_network(chunk.network.clone())
        .with_station(settings.station.station.clone())
        .with_channel_priorities(settings.station.channel_priorities())
        .with_reject_gaps(false)
        .with_minimum_length(CONTINUOUS_MINIMUM_LENGTH)
        .with_minimum_interstation_distance(CONTINUOUS_MINIMUM_DISTANCE_M);

    match size.days() {
        Some(days) => restrictions.with_chunk_length(TimeDelta::days(i64::from(days))),
        None => restrictions,
    }
}

/// Summary of a continuous-mode run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContinuousReport {
    /// Networks in the filtered inventory.
    pub networks: usize,
    /// Chunks submitted to the pool.
    pub chunks: usize,
    /// Chunks that completed without error.
    pub completed: usize,
    /// Download counts summed over completed chunks.
    pub totals: DownloadReport,
}
