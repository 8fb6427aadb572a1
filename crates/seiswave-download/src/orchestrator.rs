//! Continuous and event-mode download runs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use indicatif::ProgressBar;
use seiswave_config::Settings;
use seiswave_fetch::{
    Archive, ClientConfig, FdsnArchive, MassDownloader, StorageLayout, WaveformDownloader,
};
use seiswave_format::{QuakeMlFormatter, persist};
use seiswave_types::Catalog;

use crate::continuous::{ContinuousReport, chunk_restrictions};
use crate::event::{EventOutcome, EventReport, EventStatus, event_restrictions};
use crate::partition::get_download_list;
use crate::pool::WorkerPool;
use crate::resolve::{get_event_radius, get_station};
use crate::RunError;

/// Drives a download run over injected archive and downloader handles.
///
/// Settings are shared read-only with every worker task; the geographic
/// domain is copied into each task.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    settings: Arc<Settings>,
    archive: Arc<dyn Archive>,
    downloader: Arc<dyn WaveformDownloader>,
    progress: ProgressBar,
}

impl Orchestrator {
    /// Creates an orchestrator from explicit service handles.
    #[must_use]
    pub fn new(
        settings: Arc<Settings>,
        archive: Arc<dyn Archive>,
        downloader: Arc<dyn WaveformDownloader>,
    ) -> Self {
        Self {
            settings,
            archive,
            downloader,
            progress: ProgressBar::hidden(),
        }
    }

    /// Creates an orchestrator talking to the configured FDSN provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown or the HTTP client cannot
    /// be built.
    pub fn connect(settings: Settings) -> Result<Self, RunError> {
        let config = ClientConfig {
            concurrency: settings.client.concurrency,
            timeout: Duration::from_secs(settings.client.timeout_secs),
            max_retries: settings.client.max_retries,
            ..Default::default()
        };
        let archive: Arc<dyn Archive> =
            Arc::new(FdsnArchive::connect(&settings.client.provider, config)?);
        let downloader = Arc::new(MassDownloader::new(
            Arc::clone(&archive),
            settings.client.concurrency,
        ));
        tracing::debug!(provider = %settings.client.provider, "connected archive");

        Ok(Self::new(Arc::new(settings), archive, downloader))
    }

    /// Reports pool progress on the given bar.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the run settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn pool(&self) -> WorkerPool {
        WorkerPool::new(self.settings.ncpu).with_progress(self.progress.clone())
    }

    fn layout(&self) -> Arc<StorageLayout> {
        Arc::new(StorageLayout::under(&self.settings.data_dir))
    }

    /// Downloads continuous waveforms for every network chunk.
    ///
    /// Every chunk is attempted even if others fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk size is invalid, the inventory query
    /// fails, or any chunk fails.
    pub async fn run_continuous(&self) -> Result<ContinuousReport, RunError> {
        let size = self.settings.station.chunk_size()?;
        let inventory = get_station(self.archive.as_ref(), &self.settings).await?;
        let chunks = get_download_list(&inventory, &self.settings, Utc::now())?;

        let mut report = ContinuousReport {
            networks: inventory.len(),
            chunks: chunks.len(),
            ..Default::default()
        };
        tracing::info!(
            chunks = report.chunks,
            workers = self.settings.ncpu,
            "starting continuous download"
        );

        let settings = Arc::clone(&self.settings);
        let downloader = Arc::clone(&self.downloader);
        let layout = self.layout();
        let domain = self.settings.domain;

        let results = self
            .pool()
            .run(chunks, move |chunk| {
                let settings = Arc::clone(&settings);
                let downloader = Arc::clone(&downloader);
                let layout = Arc::clone(&layout);
                async move {
                    let restrictions = chunk_restrictions(&settings, &chunk, size);
                    tracing::debug!(%chunk, "downloading chunk");
                    let result = downloader.download(domain, &restrictions, &layout).await;
                    (chunk, result)
                }
            })
            .await?;

        let mut failed = 0;
        for (chunk, result) in results {
            match result {
                Ok(counts) => {
                    report.completed += 1;
                    report.totals += counts;
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(%chunk, error = %e, "chunk failed");
                }
            }
        }

        tracing::info!(
            completed = report.completed,
            failed,
            files = report.totals.files_written,
            "continuous download finished"
        );

        if failed > 0 {
            return Err(RunError::ChunksFailed {
                failed,
                total: report.chunks,
            });
        }
        Ok(report)
    }

    /// Downloads the event window of every catalog event.
    ///
    /// When `eventCatlog` is set, the catalog is written before the first
    /// download and re-written atomically with the final flags once every
    /// event has been processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the event window is not configured, the catalog
    /// query fails, or the catalog cannot be written. Individual event
    /// failures are reported in the outcomes instead.
    pub async fn run_event(&self) -> Result<EventReport, RunError> {
        let (before, after) = self.settings.event.window()?;
        let search = self.settings.event;
        let catalog = get_event_radius(
            self.archive.as_ref(),
            search.min_radius,
            search.max_radius,
            search.min_magnitude,
            &self.settings,
        )
        .await?;

        let report = self.download_events(catalog, before, after).await?;

        tracing::info!(
            downloaded = report.downloaded(),
            skipped = report.already_downloaded(),
            failed = report.failed(),
            "event download finished"
        );

        if self.settings.save.event_catalog {
            let path = self.settings.event_catalog_path();
            persist(&QuakeMlFormatter::new(), &report.catalog, &path)?;
            tracing::info!(path = %path.display(), "updated event catalog");
        }

        Ok(report)
    }

    /// Downloads every event of `catalog` that is not flagged yet.
    ///
    /// Flagged events are reported as already downloaded without reaching
    /// the downloader. The returned catalog keeps the input order.
    ///
    /// # Errors
    ///
    /// Returns an error only if a worker task panicked.
    pub async fn download_events(
        &self,
        catalog: Catalog,
        before: TimeDelta,
        after: TimeDelta,
    ) -> Result<EventReport, RunError> {
        let events = catalog.into_events();
        tracing::info!(
            events = events.len(),
            workers = self.settings.ncpu,
            "starting event download"
        );

        let settings = Arc::clone(&self.settings);
        let downloader = Arc::clone(&self.downloader);
        let layout = self.layout();
        let domain = self.settings.domain;

        let outcomes = self
            .pool()
            .run(events.clone(), move |event| {
                let settings = Arc::clone(&settings);
                let downloader = Arc::clone(&downloader);
                let layout = Arc::clone(&layout);
                async move {
                    let status = if event.is_downloaded() {
                        EventStatus::AlreadyDownloaded
                    } else {
                        let restrictions = event_restrictions(&settings, &event, before, after);
                        match downloader.download(domain, &restrictions, &layout).await {
                            Ok(counts) => {
                                tracing::debug!(event = %event, files = counts.files_written, "event downloaded");
                                EventStatus::Downloaded
                            }
                            Err(e) => {
                                tracing::warn!(event = %event, error = %e, "event download failed");
                                EventStatus::Failed {
                                    reason: e.to_string(),
                                }
                            }
                        }
                    };
                    EventOutcome {
                        resource_id: event.resource_id,
                        origin_time: event.origin_time,
                        status,
                    }
                }
            })
            .await?;

        Ok(EventReport::rebuild(events, outcomes))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone};
    use seiswave_fetch::{
        ArchiveError, DownloadReport, EventQuery, MassDownloadError, Restrictions, StationQuery,
        WaveformQuery,
    };
    use seiswave_types::{Event, Inventory, RectangularDomain, Station, TimeSpan};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Minimal valid settings writing under `dir`.
    pub(crate) fn settings_in(dir: &Path) -> Settings {
        let mut settings = Settings::from_ini_str(
            "[Map Info]\n\
             minLatitude = 30\n\
             maxLatitude = 40\n\
             minLongitude = -110\n\
             maxLongitude = -100\n\
             [Event Info]\n\
             startTime_sec = 60\n\
             endTime_sec = 600\n",
        )
        .unwrap();
        settings.data_dir = dir.to_path_buf();
        settings
    }

    /// A station active from January 1 of `start` to January 1 of `end`.
    pub(crate) fn station(network: &str, code: &str, start: i32, end: i32) -> Station {
        Station {
            network: network.to_string(),
            code: code.to_string(),
            latitude: 35.0,
            longitude: -105.0,
            elevation: 1000.0,
            site_name: format!("{network} {code}"),
            start_date: Utc.with_ymd_and_hms(start, 1, 1, 0, 0, 0).unwrap(),
            end_date: Some(Utc.with_ymd_and_hms(end, 1, 1, 0, 0, 0).unwrap()),
            channels: Vec::new(),
        }
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[derive(Debug, Default)]
    pub(crate) struct MockArchive {
        stations: Vec<Station>,
        events: Vec<Event>,
        station_queries: Mutex<Vec<StationQuery>>,
        event_queries: Mutex<Vec<EventQuery>>,
    }

    impl MockArchive {
        pub(crate) fn with_stations(stations: Vec<Station>) -> Self {
            Self {
                stations,
                ..Default::default()
            }
        }

        pub(crate) fn with_events(count: u32) -> Self {
            Self {
                events: (1..=count)
                    .map(|i| {
                        let mut event = Event::new(
                            format!("smi:local/event/{i}"),
                            utc(2020, 1, i),
                            50.0,
                            170.0,
                        );
                        // Catalog services never know about the flag
                        event.downloaded = true;
                        event
                    })
                    .collect(),
                ..Default::default()
            }
        }

        pub(crate) fn last_station_query(&self) -> Option<StationQuery> {
            self.station_queries.lock().unwrap().last().cloned()
        }

        pub(crate) fn last_event_query(&self) -> Option<EventQuery> {
            self.event_queries.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Archive for MockArchive {
        async fn get_stations(&self, query: &StationQuery) -> Result<Inventory, ArchiveError> {
            self.station_queries.lock().unwrap().push(query.clone());
            Ok(self.stations.iter().cloned().collect())
        }

        async fn get_events(&self, query: &EventQuery) -> Result<Catalog, ArchiveError> {
            self.event_queries.lock().unwrap().push(query.clone());
            Ok(self.events.iter().cloned().collect())
        }

        async fn get_waveforms(&self, _: &WaveformQuery) -> Result<Option<Bytes>, ArchiveError> {
            Ok(None)
        }

        async fn get_station_xml(&self, _: &StationQuery) -> Result<Option<Bytes>, ArchiveError> {
            Ok(None)
        }
    }

    /// Records every request and fails those starting at one of `fail_at`.
    #[derive(Debug, Default)]
    struct MockDownloader {
        calls: Mutex<Vec<Restrictions>>,
        fail_at: Vec<DateTime<Utc>>,
    }

    impl MockDownloader {
        fn failing_at(fail_at: Vec<DateTime<Utc>>) -> Self {
            Self {
                fail_at,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Restrictions> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WaveformDownloader for MockDownloader {
        async fn download(
            &self,
            domain: RectangularDomain,
            restrictions: &Restrictions,
            layout: &StorageLayout,
        ) -> Result<DownloadReport, MassDownloadError> {
            assert_eq!(domain.min_latitude, 30.0);
            assert!(
                layout
                    .stationxml_path("IU", "ANMO")
                    .ends_with("station/IU.ANMO.xml")
            );
            self.calls.lock().unwrap().push(restrictions.clone());

            if self.fail_at.contains(&restrictions.span.start) {
                return Err(MassDownloadError::Incomplete {
                    failed: 1,
                    total: 1,
                });
            }
            Ok(DownloadReport {
                files_written: 1,
                ..Default::default()
            })
        }
    }

    fn orchestrator(
        settings: Settings,
        archive: MockArchive,
        downloader: &Arc<MockDownloader>,
    ) -> Orchestrator {
        Orchestrator::new(
            Arc::new(settings),
            Arc::new(archive),
            Arc::clone(downloader) as Arc<dyn WaveformDownloader>,
        )
    }

    fn continuous_settings(dir: &Path, chunk: &str, ncpu: usize) -> Settings {
        let mut settings = settings_in(dir);
        settings.station.time_range = TimeSpan::new(utc(2020, 1, 1), utc(2020, 3, 15)).unwrap();
        settings.station.chunk_size = chunk.to_string();
        settings.ncpu = ncpu;
        settings
    }

    fn iu_network() -> MockArchive {
        let mut anmo = station("IU", "ANMO", 2020, 2021);
        anmo.end_date = Some(utc(2020, 3, 15));
        MockArchive::with_stations(vec![anmo])
    }

    #[tokio::test]
    async fn test_continuous_end_to_end() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::default());
        let run = orchestrator(continuous_settings(dir.path(), "30", 2), iu_network(), &downloader);

        let report = run.run_continuous().await.unwrap();
        assert_eq!(report.networks, 1);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.completed, 3);
        assert_eq!(report.totals.files_written, 3);

        let mut spans: Vec<TimeSpan> = downloader.calls().iter().map(|r| r.span).collect();
        spans.sort_by_key(|s| s.start);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].start, utc(2020, 1, 1));
        assert_eq!(spans[2].end, utc(2020, 3, 15));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(spans.iter().all(|s| s.duration() <= TimeDelta::days(30)));
        assert!(downloader.calls().iter().all(|r| r.network == "IU"));
    }

    #[tokio::test]
    async fn test_continuous_sequential_order() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::default());
        let run = orchestrator(continuous_settings(dir.path(), "mon", 1), iu_network(), &downloader);

        run.run_continuous().await.unwrap();
        let starts: Vec<DateTime<Utc>> = downloader.calls().iter().map(|r| r.span.start).collect();
        assert_eq!(starts, vec![utc(2020, 1, 1), utc(2020, 2, 1), utc(2020, 3, 1)]);
    }

    #[tokio::test]
    async fn test_continuous_failed_chunk_fails_run_after_batch() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::failing_at(vec![utc(2020, 1, 31)]));
        let run = orchestrator(continuous_settings(dir.path(), "30", 1), iu_network(), &downloader);

        let err = run.run_continuous().await.unwrap_err();
        assert!(matches!(err, RunError::ChunksFailed { failed: 1, total: 3 }));
        assert_eq!(downloader.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_chunk_size_fails_before_query() {
        let dir = TempDir::new().unwrap();
        let archive = Arc::new(iu_network());
        let downloader = Arc::new(MockDownloader::default());
        let run = Orchestrator::new(
            Arc::new(continuous_settings(dir.path(), "notanumber", 1)),
            Arc::clone(&archive) as Arc<dyn Archive>,
            Arc::clone(&downloader) as Arc<dyn WaveformDownloader>,
        );

        let err = run.run_continuous().await.unwrap_err();
        assert!(err.to_string().contains("notanumber"));
        assert!(archive.last_station_query().is_none());
        assert!(downloader.calls().is_empty());
    }

    #[tokio::test]
    async fn test_already_downloaded_event_is_never_resubmitted() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::default());
        let run = orchestrator(settings_in(dir.path()), MockArchive::default(), &downloader);

        let mut done = Event::new("smi:local/done", utc(2020, 5, 1), 0.0, 0.0);
        done.downloaded = true;
        let fresh = Event::new("smi:local/fresh", utc(2020, 6, 1), 0.0, 0.0);
        let catalog: Catalog = [done, fresh].into_iter().collect();

        let report = run
            .download_events(catalog, TimeDelta::seconds(60), TimeDelta::seconds(600))
            .await
            .unwrap();

        let calls = downloader.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].span.start, utc(2020, 6, 1) - TimeDelta::seconds(60));
        assert_eq!(report.outcomes[0].status, EventStatus::AlreadyDownloaded);
        assert_eq!(report.outcomes[1].status, EventStatus::Downloaded);
        assert_eq!(report.catalog.downloaded_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_event_keeps_flag_false() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(dir.path());
        settings.ncpu = 3;
        settings.save.event_catalog = true;
        // Event 2 window starts 60 s before its origin
        let downloader = Arc::new(MockDownloader::failing_at(vec![
            utc(2020, 1, 2) - TimeDelta::seconds(60),
        ]));
        let run = orchestrator(settings, MockArchive::with_events(3), &downloader);

        let report = run.run_event().await.unwrap();

        assert_eq!(downloader.calls().len(), 3);
        assert_eq!(report.downloaded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            &report.outcomes[1].status,
            EventStatus::Failed { reason } if reason.contains("1 of 1")
        ));

        let flags: Vec<bool> = report.catalog.iter().map(|e| e.downloaded).collect();
        assert_eq!(flags, vec![true, false, true]);

        let xml = std::fs::read_to_string(dir.path().join("evcatalog.xml")).unwrap();
        assert_eq!(xml.matches("<ns0:downloaded>True</ns0:downloaded>").count(), 2);
        assert_eq!(xml.matches("<ns0:downloaded>False</ns0:downloaded>").count(), 1);
    }

    #[tokio::test]
    async fn test_event_mode_requires_window() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(dir.path());
        settings.event.after_secs = None;
        let downloader = Arc::new(MockDownloader::default());
        let run = orchestrator(settings, MockArchive::with_events(1), &downloader);

        let err = run.run_event().await.unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
        assert!(downloader.calls().is_empty());
    }

    #[test]
    fn test_connect_unknown_provider() {
        let mut settings = settings_in(Path::new("."));
        settings.client.provider = "NOWHERE".to_string();
        let err = Orchestrator::connect(settings).unwrap_err();
        assert!(matches!(err, RunError::Archive(_)));
    }
}
