//! Download orchestration for the seiswave seismic data downloader.
//!
//! - [`get_station`] / [`get_event_radius`] - Metadata resolution
//! - [`get_nettime`] / [`get_download_list`] - Time-range partitioning
//! - [`WorkerPool`] - Bounded, order-preserving task fan-out
//! - [`Orchestrator`] - Continuous and event-mode runs

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/Aaaapril4/SeisWaveDownloader/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod continuous;
mod error;
mod event;
mod orchestrator;
mod partition;
mod pool;
mod resolve;

pub use continuous::{ContinuousReport, chunk_restrictions};
pub use error::RunError;
pub use event::{EventOutcome, EventReport, EventStatus, event_restrictions};
pub use orchestrator::Orchestrator;
pub use partition::{get_download_list, get_nettime};
pub use pool::WorkerPool;
pub use resolve::{get_event_radius, get_station};
