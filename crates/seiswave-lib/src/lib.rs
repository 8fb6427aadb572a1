//! Library for downloading seismic waveforms from FDSN data centers.
//!
//! This is a facade crate that re-exports functionality from the seiswave
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use seiswave_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load("para.ini")?;
//!     let run = Orchestrator::connect(settings)?;
//!
//!     let report = run.run_continuous().await?;
//!     println!("{} chunks, {} files", report.chunks, report.totals.files_written);
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/Aaaapril4/SeisWaveDownloader/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use seiswave_types::*;

// Re-export configuration
pub use seiswave_config::{
    ClientSettings, ConfigError, DEFAULT_CONFIG_PATH, EventSettings, SaveSettings, Settings,
    StationSettings,
};

#[cfg(feature = "fetch")]
pub use seiswave_fetch::{
    Archive, ArchiveError, ClientConfig, DownloadClient, DownloadReport, EventQuery, FdsnArchive,
    FetchError, Level, MassDownloadError, MassDownloader, ParseError, Restrictions, StationQuery,
    StorageLayout, WaveformDownloader, WaveformQuery, mseed,
};

#[cfg(feature = "format")]
pub use seiswave_format::{
    FormatError, Formatter, JsonFormatter, QuakeMlFormatter, StationTextFormatter, persist,
};

#[cfg(feature = "download")]
pub use seiswave_download::{
    ContinuousReport, EventOutcome, EventReport, EventStatus, Orchestrator, RunError, WorkerPool,
    chunk_restrictions, event_restrictions, get_download_list, get_event_radius, get_nettime,
    get_station,
};

/// Prelude module for convenient imports.
///
/// ```
/// use seiswave_lib::prelude::*;
/// ```
pub mod prelude {
    pub use seiswave_types::{
        Catalog, ChunkSize, DownloadChunk, Event, Inventory, NetworkSpan, RectangularDomain,
        Station, TimeSpan,
    };

    pub use seiswave_config::Settings;

    #[cfg(feature = "fetch")]
    pub use seiswave_fetch::{Archive, FdsnArchive, MassDownloader, WaveformDownloader};

    #[cfg(feature = "format")]
    pub use seiswave_format::{Formatter, JsonFormatter, QuakeMlFormatter, persist};

    #[cfg(feature = "download")]
    pub use seiswave_download::{
        ContinuousReport, EventReport, EventStatus, Orchestrator, RunError,
    };
}
