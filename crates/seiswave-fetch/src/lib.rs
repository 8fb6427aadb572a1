//! FDSN web-service client and mass downloader for seiswave.
//!
//! This crate provides the data retrieval pipeline:
//!
//! - [`DownloadClient`] - HTTP client with connection pooling and retries
//! - [`url::FdsnEndpoints`] - FDSN service URLs per data provider
//! - [`Archive`] / [`FdsnArchive`] - Station, event and waveform queries
//! - [`mseed::parse_records`] - miniSEED record header decoding
//! - [`WaveformDownloader`] / [`MassDownloader`] - Restriction-driven bulk download

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/Aaaapril4/SeisWaveDownloader/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod archive;
mod client;
mod mass;
pub mod mseed;
mod parse;
mod query;
mod restrictions;
mod storage;
pub mod url;

pub use archive::{Archive, ArchiveError, FdsnArchive};
pub use client::{ClientConfig, DownloadClient, FetchError};
pub use mass::{DownloadReport, MassDownloadError, MassDownloader, WaveformDownloader};
pub use parse::{ParseError, parse_channels, parse_events, parse_stations};
pub use query::{EventQuery, Level, StationQuery, WaveformQuery};
pub use restrictions::Restrictions;
pub use storage::{StorageLayout, write_atomic};
