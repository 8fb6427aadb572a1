//! Restriction-driven bulk waveform download.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use glob::Pattern;
use seiswave_types::{
    Channel, Inventory, RectangularDomain, Station, TimeSpan, great_circle_distance_m,
};
use serde::Serialize;
use thiserror::Error;

use crate::archive::{Archive, ArchiveError};
use crate::mseed::{parse_records, summarize};
use crate::query::{Level, StationQuery, WaveformQuery};
use crate::restrictions::Restrictions;
use crate::storage::{StorageLayout, write_atomic};

/// Errors that can occur during a mass download.
#[derive(Error, Debug)]
pub enum MassDownloadError {
    /// The channel inventory query failed.
    #[error("Channel query failed: {0}")]
    Archive(#[from] ArchiveError),

    /// A channel priority is not a valid pattern.
    #[error("Invalid channel pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying error.
        #[source]
        source: glob::PatternError,
    },

    /// Some requests failed; the rest of the download completed.
    #[error("{failed} of {total} requests failed")]
    Incomplete {
        /// Failed request count.
        failed: usize,
        /// Total request count.
        total: usize,
    },
}

/// Counts describing one mass download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// Stations kept after domain and spacing filters.
    pub stations_selected: usize,
    /// Channels selected by priority.
    pub channels_selected: usize,
    /// Waveform files written.
    pub files_written: usize,
    /// Waveform files already present.
    pub files_existing: usize,
    /// Requests the archive had no data for.
    pub no_data: usize,
    /// Traces dropped for insufficient coverage or gaps.
    pub rejected: usize,
    /// Requests that failed.
    pub failed: usize,
    /// StationXML files written.
    pub station_xml_written: usize,
}

impl std::ops::AddAssign for DownloadReport {
    fn add_assign(&mut self, other: Self) {
        self.stations_selected += other.stations_selected;
        self.channels_selected += other.channels_selected;
        self.files_written += other.files_written;
        self.files_existing += other.files_existing;
        self.no_data += other.no_data;
        self.rejected += other.rejected;
        self.failed += other.failed;
        self.station_xml_written += other.station_xml_written;
    }
}

/// Downloads every waveform matching a set of restrictions.
#[async_trait]
pub trait WaveformDownloader: Send + Sync + std::fmt::Debug {
    /// Downloads waveforms and station metadata into `layout`.
    async fn download(
        &self,
        domain: RectangularDomain,
        restrictions: &Restrictions,
        layout: &StorageLayout,
    ) -> Result<DownloadReport, MassDownloadError>;
}

/// [`WaveformDownloader`] that fans out per-channel requests to an [`Archive`].
#[derive(Debug, Clone)]
pub struct MassDownloader {
    archive: Arc<dyn Archive>,
    concurrency: usize,
}

#[derive(Debug)]
struct ChannelTask {
    query: WaveformQuery,
    path: PathBuf,
}

#[derive(Debug)]
enum Outcome {
    Written,
    NoData,
    Rejected,
    Failed,
}

impl MassDownloader {
    /// Creates a downloader issuing at most `concurrency` requests at once.
    #[must_use]
    pub fn new(archive: Arc<dyn Archive>, concurrency: usize) -> Self {
        Self {
            archive,
            concurrency: concurrency.max(1),
        }
    }

    async fn fetch_channel(&self, task: ChannelTask, restrictions: &Restrictions) -> Outcome {
        let id = task.query.id();
        let data = match self.archive.get_waveforms(&task.query).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%id, span = %task.query.span, "no data");
                return Outcome::NoData;
            }
            Err(e) => {
                tracing::warn!(%id, span = %task.query.span, error = %e, "waveform request failed");
                return Outcome::Failed;
            }
        };

        if let Err(reason) = check_trace(&data, &task.query.span, restrictions) {
            tracing::debug!(%id, span = %task.query.span, %reason, "trace rejected");
            return Outcome::Rejected;
        }

        match write_atomic(&task.path, &data).await {
            Ok(()) => Outcome::Written,
            Err(e) => {
                tracing::warn!(path = %task.path.display(), error = %e, "failed to write waveform");
                Outcome::Failed
            }
        }
    }

    async fn fetch_station_xml(
        &self,
        station: &Station,
        domain: RectangularDomain,
        span: TimeSpan,
        layout: &StorageLayout,
    ) -> Outcome {
        let path = layout.stationxml_path(&station.network, &station.code);
        if file_exists(&path).await {
            return Outcome::NoData;
        }

        let query = StationQuery {
            network: station.network.clone(),
            station: station.code.clone(),
            location: "*".to_string(),
            channel: "*".to_string(),
            span,
            domain,
            level: Level::Response,
        };
        match self.archive.get_station_xml(&query).await {
            Ok(Some(xml)) => match write_atomic(&path, &xml).await {
                Ok(()) => Outcome::Written,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to write StationXML");
                    Outcome::Failed
                }
            },
            Ok(None) => Outcome::NoData,
            Err(e) => {
                tracing::warn!(station = %station.id(), error = %e, "StationXML request failed");
                Outcome::Failed
            }
        }
    }
}

#[async_trait]
impl WaveformDownloader for MassDownloader {
    async fn download(
        &self,
        domain: RectangularDomain,
        restrictions: &Restrictions,
        layout: &StorageLayout,
    ) -> Result<DownloadReport, MassDownloadError> {
        let patterns = compile_priorities(&restrictions.channel_priorities)?;

        let query = StationQuery {
            network: restrictions.network.clone(),
            station: restrictions.station.clone(),
            location: restrictions.location.clone(),
            channel: "*".to_string(),
            span: restrictions.span,
            domain,
            level: Level::Channel,
        };
        let inventory = self.archive.get_stations(&query).await?;
        let selection = select_channels(&inventory, domain, restrictions, &patterns);

        let mut report = DownloadReport {
            stations_selected: selection.len(),
            channels_selected: selection.iter().map(|(_, c)| c.len()).sum(),
            ..Default::default()
        };

        let mut tasks = Vec::new();
        let mut with_data: BTreeSet<usize> = BTreeSet::new();
        for (idx, (station, channels)) in selection.iter().enumerate() {
            for channel in channels {
                for piece in restrictions.pieces() {
                    let path = layout.waveform_path(
                        &station.network,
                        &station.code,
                        &channel.location,
                        &channel.code,
                        &piece,
                    );
                    if file_exists(&path).await {
                        report.files_existing += 1;
                        with_data.insert(idx);
                        continue;
                    }
                    tasks.push((
                        idx,
                        ChannelTask {
                            query: WaveformQuery {
                                network: station.network.clone(),
                                station: station.code.clone(),
                                location: channel.location.clone(),
                                channel: channel.code.clone(),
                                span: piece,
                            },
                            path,
                        },
                    ));
                }
            }
        }

        tracing::debug!(
            stations = report.stations_selected,
            requests = tasks.len(),
            existing = report.files_existing,
            "starting waveform requests"
        );
        let total_requests = tasks.len();

        let outcomes: Vec<(usize, Outcome)> = stream::iter(tasks)
            .map(|(idx, task)| async move { (idx, self.fetch_channel(task, restrictions).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (idx, outcome) in outcomes {
            match outcome {
                Outcome::Written => {
                    report.files_written += 1;
                    with_data.insert(idx);
                }
                Outcome::NoData => report.no_data += 1,
                Outcome::Rejected => report.rejected += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        let stations: Vec<Station> = with_data
            .iter()
            .map(|&idx| selection[idx].0.clone())
            .collect();
        let xml_outcomes: Vec<Outcome> = stream::iter(stations)
            .map(|station| async move {
                self.fetch_station_xml(&station, domain, restrictions.span, layout)
                    .await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        for outcome in xml_outcomes {
            match outcome {
                Outcome::Written => report.station_xml_written += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::NoData | Outcome::Rejected => {}
            }
        }

        if report.failed > 0 {
            return Err(MassDownloadError::Incomplete {
                failed: report.failed,
                total: total_requests + with_data.len(),
            });
        }
        Ok(report)
    }
}

fn compile_priorities(priorities: &[String]) -> Result<Vec<Pattern>, MassDownloadError> {
    priorities
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| MassDownloadError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

/// Applies the domain, spacing and channel priority rules.
///
/// Stations are visited in inventory order; a station closer than the
/// minimum distance to an already selected one is skipped. Stations with no
/// channel matching any priority are dropped.
fn select_channels<'a>(
    inventory: &'a Inventory,
    domain: RectangularDomain,
    restrictions: &Restrictions,
    patterns: &[Pattern],
) -> Vec<(&'a Station, Vec<&'a Channel>)> {
    let mut selected: Vec<(&Station, Vec<&Channel>)> = Vec::new();

    for station in inventory.stations() {
        if !domain.contains(station.latitude, station.longitude) {
            continue;
        }

        let too_close = restrictions.minimum_interstation_distance_m > 0.0
            && selected.iter().any(|(other, _)| {
                great_circle_distance_m(
                    station.latitude,
                    station.longitude,
                    other.latitude,
                    other.longitude,
                ) < restrictions.minimum_interstation_distance_m
            });
        if too_close {
            tracing::debug!(station = %station.id(), "skipped: too close to a selected station");
            continue;
        }

        let channels = patterns.iter().find_map(|pattern| {
            let mut seen = BTreeSet::new();
            let matching: Vec<&Channel> = station
                .channels
                .iter()
                .filter(|c| c.is_active_during(&restrictions.span) && pattern.matches(&c.code))
                .filter(|c| seen.insert((c.location.as_str(), c.code.as_str())))
                .collect();
            (!matching.is_empty()).then_some(matching)
        });

        if let Some(channels) = channels {
            selected.push((station, channels));
        }
    }

    selected
}

/// Checks a miniSEED payload against the coverage and gap rules.
fn check_trace(data: &Bytes, piece: &TimeSpan, restrictions: &Restrictions) -> Result<(), String> {
    let records = parse_records(data).map_err(|e| e.to_string())?;
    let summaries = summarize(&records);
    let Some(trace) = summaries.first() else {
        return Err("no samples".to_string());
    };

    if restrictions.reject_channels_with_gaps && trace.gap_count() > 0 {
        return Err(format!("{} gaps", trace.gap_count()));
    }

    let covered = trace
        .segments
        .iter()
        .filter_map(|s| s.intersect(piece))
        .fold(chrono::TimeDelta::zero(), |acc, s| acc + s.duration());
    if covered < restrictions.required_coverage(piece) {
        return Err(format!("covers {}s of {}s", covered.num_seconds(), piece.duration().num_seconds()));
    }

    Ok(())
}

async fn file_exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::archive::FdsnArchive;
    use crate::mseed::tests::record;
    use byteorder::ByteOrder;
    use chrono::{TimeDelta, TimeZone, Utc};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHANNELS: &str = "\
#Network|Station|Location|Channel|Latitude|Longitude|Elevation|Depth|Azimuth|Dip|SensorDescription|Scale|ScaleFreq|ScaleUnits|SampleRate|StartTime|EndTime
IU|ANMO|00|BHZ|34.9459|-106.4572|1850|100|0|-90|KS-54000|3.4e9|0.02|M/S|20|2000-01-01T00:00:00|
IU|ANMO|00|LHZ|34.9459|-106.4572|1850|100|0|-90|KS-54000|3.4e9|0.02|M/S|1|2000-01-01T00:00:00|
IU|ANMX|00|BHZ|34.9460|-106.4572|1850|100|0|-90|KS-54000|3.4e9|0.02|M/S|20|2000-01-01T00:00:00|
IU|FAR|00|BHZ|10.0|-106.4572|1850|100|0|-90|KS-54000|3.4e9|0.02|M/S|20|2000-01-01T00:00:00|
";

    fn piece() -> TimeSpan {
        TimeSpan::new(
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 20).unwrap(),
        )
        .unwrap()
    }

    fn domain() -> RectangularDomain {
        RectangularDomain::new(30.0, 40.0, -110.0, -100.0).unwrap()
    }

    fn restrictions() -> Restrictions {
        Restrictions::new(piece())
            .with_network("IU")
            .with_channel_priorities(["BH[ZNE]", "LH[ZNE]"])
            .with_minimum_length(0.9)
            .with_minimum_interstation_distance(100.0)
    }

    async fn server_with(waveform: Vec<u8>) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/station/1/query"))
            .and(query_param("level", "channel"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CHANNELS))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/station/1/query"))
            .and(query_param("level", "response"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<FDSNStationXML/>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/dataselect/1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(waveform))
            .mount(&server)
            .await;
        server
    }

    fn downloader(server: &MockServer) -> MassDownloader {
        let archive = FdsnArchive::connect(
            &server.uri(),
            ClientConfig {
                max_retries: 0,
                ..Default::default()
            },
        )
        .unwrap();
        MassDownloader::new(Arc::new(archive), 2)
    }

    #[test]
    fn test_select_channels_priority_and_spacing() {
        let inventory = crate::parse::parse_channels(CHANNELS).unwrap();
        let patterns = compile_priorities(&restrictions().channel_priorities).unwrap();

        let selection = select_channels(&inventory, domain(), &restrictions(), &patterns);

        // ANMX is ~11 m from ANMO and FAR is outside the domain
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].0.code, "ANMO");
        assert_eq!(selection[0].1.len(), 1);
        assert_eq!(selection[0].1[0].code, "BHZ");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = compile_priorities(&["BH[".to_string()]).unwrap_err();
        assert!(matches!(err, MassDownloadError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_download_writes_waveform_and_station_xml() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::under(dir.path());
        let data = record(("IU", "ANMO", "00", "BHZ"), piece().start, 400, 20);
        let server = server_with(data).await;

        let report = downloader(&server)
            .download(domain(), &restrictions(), &layout)
            .await
            .unwrap();

        assert_eq!(report.stations_selected, 1);
        assert_eq!(report.files_written, 1);
        assert_eq!(report.station_xml_written, 1);
        assert!(layout
            .waveform_path("IU", "ANMO", "00", "BHZ", &piece())
            .exists());
        assert!(layout.stationxml_path("IU", "ANMO").exists());

        // Second run finds everything on disk
        let again = downloader(&server)
            .download(domain(), &restrictions(), &layout)
            .await
            .unwrap();
        assert_eq!(again.files_written, 0);
        assert_eq!(again.files_existing, 1);
        assert_eq!(again.station_xml_written, 0);
    }

    #[tokio::test]
    async fn test_short_trace_is_rejected() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::under(dir.path());
        // 5 s of data for a 20 s window
        let data = record(("IU", "ANMO", "00", "BHZ"), piece().start, 100, 20);
        let server = server_with(data).await;

        let report = downloader(&server)
            .download(domain(), &restrictions(), &layout)
            .await
            .unwrap();

        assert_eq!(report.rejected, 1);
        assert_eq!(report.files_written, 0);
        assert!(!layout.stationxml_path("IU", "ANMO").exists());
    }

    #[tokio::test]
    async fn test_unrepresentable_record_end_is_rejected() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::under(dir.path());
        let mut data = record(("IU", "ANMO", "00", "BHZ"), piece().start, u16::MAX, 20);
        byteorder::BigEndian::write_i16(&mut data[32..34], i16::MIN);
        byteorder::BigEndian::write_i16(&mut data[34..36], i16::MIN);
        let server = server_with(data).await;

        let report = downloader(&server)
            .download(domain(), &restrictions(), &layout)
            .await
            .unwrap();

        assert_eq!(report.rejected, 1);
        assert_eq!(report.files_written, 0);
    }

    #[tokio::test]
    async fn test_gappy_trace_rejected_when_requested() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::under(dir.path());
        let mut data = record(("IU", "ANMO", "00", "BHZ"), piece().start, 180, 20);
        data.extend(record(
            ("IU", "ANMO", "00", "BHZ"),
            piece().start + TimeDelta::seconds(10),
            200,
            20,
        ));
        let server = server_with(data).await;

        let lenient = restrictions().with_minimum_length(0.5);
        let report = downloader(&server)
            .download(domain(), &lenient.clone().with_reject_gaps(true), &layout)
            .await
            .unwrap();
        assert_eq!(report.rejected, 1);

        let report = downloader(&server)
            .download(domain(), &lenient, &layout)
            .await
            .unwrap();
        assert_eq!(report.files_written, 1);
    }

    #[tokio::test]
    async fn test_failed_requests_make_download_incomplete() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/station/1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CHANNELS))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/dataselect/1/query"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = downloader(&server)
            .download(domain(), &restrictions(), &StorageLayout::under(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, MassDownloadError::Incomplete { failed: 1, total: 1 }));
    }

    #[test]
    fn test_report_accumulates() {
        let mut total = DownloadReport::default();
        total += DownloadReport {
            files_written: 2,
            ..Default::default()
        };
        total += DownloadReport {
            files_written: 1,
            rejected: 1,
            ..Default::default()
        };
        assert_eq!(total.files_written, 3);
        assert_eq!(total.rejected, 1);
    }
}
