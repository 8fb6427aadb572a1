//! Network time spans and their partitioning into download chunks.

use chrono::{DateTime, Utc};
use seiswave_config::Settings;
use seiswave_types::{DownloadChunk, Inventory, NetworkSpan, TimeSpan};

use crate::RunError;

/// Computes the effective span of every network.
///
/// The span runs from the earliest station start to the latest station end
/// (or `now` if any station is still open) and is clipped to the global
/// time range. A network that does not overlap the range gets an empty span
/// inside it; networks without stations are skipped.
#[must_use]
pub fn get_nettime(inventory: &Inventory, settings: &Settings, now: DateTime<Utc>) -> Vec<NetworkSpan> {
    let range = settings.station.time_range;

    inventory
        .iter()
        .filter_map(|network| {
            let lifetime = network.lifetime(now)?;
            let start = lifetime.start.max(range.start).min(range.end);
            let end = lifetime.end.min(range.end).max(start);
            Some(NetworkSpan::new(network.code.clone(), TimeSpan { start, end }))
        })
        .collect()
}

/// Splits every network span into chunks of the configured size.
///
/// The chunk size is validated before any span is computed.
///
/// # Errors
///
/// Returns an error if the chunk size is neither a positive day count nor
/// `mon`.
pub fn get_download_list(
    inventory: &Inventory,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Vec<DownloadChunk>, RunError> {
    let size = settings.station.chunk_size()?;

    let chunks: Vec<DownloadChunk> = get_nettime(inventory, settings, now)
        .iter()
        .flat_map(|network| {
            if network.span.is_empty() {
                tracing::debug!(network = %network.network, "no overlap with the configured time range");
            }
            network.chunks(size).collect::<Vec<_>>()
        })
        .collect();

    tracing::info!(chunks = chunks.len(), chunk_size = %size, "partitioned download");
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{settings_in, station};
    use chrono::{Datelike, TimeDelta, TimeZone};
    use seiswave_types::ChunkSizeError;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn settings(start: DateTime<Utc>, end: DateTime<Utc>, chunk: &str) -> Settings {
        let mut settings = settings_in(std::path::Path::new("."));
        settings.station.time_range = TimeSpan::new(start, end).unwrap();
        settings.station.chunk_size = chunk.to_string();
        settings
    }

    #[test]
    fn test_nettime_clips_to_range() {
        let inventory: Inventory = [station("IU", "ANMO", 2010, 2030), station("IU", "TUC", 2015, 2016)]
            .into_iter()
            .collect();
        let settings = settings(utc(2020, 1, 1), utc(2021, 1, 1), "1");

        let spans = get_nettime(&inventory, &settings, utc(2025, 1, 1));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].span, settings.station.time_range);
    }

    #[test]
    fn test_nettime_open_station_uses_now() {
        let mut open = station("IU", "ANMO", 2010, 2011);
        open.end_date = None;
        let inventory: Inventory = std::iter::once(open).collect();
        let settings = settings(utc(2000, 1, 1), utc(2030, 1, 1), "1");

        let spans = get_nettime(&inventory, &settings, utc(2024, 6, 1));
        assert_eq!(spans[0].span.start, utc(2010, 1, 1));
        assert_eq!(spans[0].span.end, utc(2024, 6, 1));
    }

    #[test]
    fn test_no_overlap_gives_no_chunks() {
        let inventory: Inventory = std::iter::once(station("IU", "ANMO", 2000, 2005)).collect();
        let settings = settings(utc(2020, 1, 1), utc(2021, 1, 1), "1");

        let spans = get_nettime(&inventory, &settings, utc(2025, 1, 1));
        assert!(spans[0].span.is_empty());
        assert!(settings.station.time_range.encloses(&spans[0].span));
        assert!(get_download_list(&inventory, &settings, utc(2025, 1, 1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_monthly_chunks_tile_the_span() {
        let inventory: Inventory = std::iter::once(station("IU", "ANMO", 2000, 2030)).collect();
        let start = Utc.with_ymd_and_hms(2020, 1, 15, 6, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 4, 10, 0, 0, 0).unwrap();
        let settings = settings(start, end, "MON");

        let chunks = get_download_list(&inventory, &settings, utc(2025, 1, 1)).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].span.start, start);
        assert_eq!(chunks[3].span.end, end);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].span.end, pair[1].span.start);
        }
        for chunk in &chunks[..3] {
            let last = chunk.span.last_day();
            assert_eq!(last.month(), chunk.span.start.month());
            assert_eq!((last + TimeDelta::days(1)).day(), 1);
        }
    }

    #[test]
    fn test_day_chunks() {
        let inventory: Inventory = std::iter::once(station("IU", "ANMO", 2000, 2030)).collect();
        let settings = settings(utc(2020, 1, 1), utc(2020, 3, 15), "30");

        let chunks = get_download_list(&inventory, &settings, utc(2025, 1, 1)).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].span.duration(), TimeDelta::days(30));
        assert_eq!(chunks[1].span.duration(), TimeDelta::days(30));
        assert_eq!(chunks[2].span.end, utc(2020, 3, 15));
        assert!(chunks.iter().all(|c| c.network == "IU"));
    }

    #[test]
    fn test_invalid_chunk_size() {
        let inventory: Inventory = std::iter::once(station("IU", "ANMO", 2000, 2030)).collect();

        for value in ["notanumber", "0", "-3", ""] {
            let settings = settings(utc(2020, 1, 1), utc(2020, 3, 15), value);
            let err = get_download_list(&inventory, &settings, utc(2025, 1, 1)).unwrap_err();
            assert!(
                matches!(&err, RunError::ChunkSize(ChunkSizeError::Invalid(v)) if v == value),
                "{value}: {err}"
            );
        }
    }
}
