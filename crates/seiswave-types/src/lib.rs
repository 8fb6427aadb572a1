//! Core types for the seiswave seismic data downloader.
//!
//! This crate provides the fundamental data structures used throughout seiswave:
//!
//! - [`RectangularDomain`] - Geographic bounding box used for every query
//! - [`TimeSpan`] - Half-open UTC time interval with month/day partitioning
//! - [`ChunkSize`] - Calendar-month or fixed N-day download chunking
//! - [`Inventory`] - Networks, stations and channels with activation dates
//! - [`Catalog`] - Seismic events carrying a `downloaded` annotation

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/Aaaapril4/SeisWaveDownloader/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chunk;
mod domain;
mod error;
mod event;
mod inventory;
mod time_span;

pub use chunk::{ChunkSize, DownloadChunk, NetworkSpan};
pub use domain::{RectangularDomain, great_circle_distance_m};
pub use error::{ChunkSizeError, DomainError, TimeSpanError};
pub use event::{Catalog, DOWNLOADED_NAMESPACE, Event};
pub use inventory::{Channel, Inventory, Network, Station};
pub use time_span::{SpanChunks, TimeSpan, days_in_month, floor_day, parse_timestamp};
