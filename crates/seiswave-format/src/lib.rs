//! Metadata writers for seiswave.
//!
//! This crate writes the metadata files produced alongside waveforms:
//!
//! - [`StationTextFormatter`] - FDSN station text
//! - [`QuakeMlFormatter`] - QuakeML event catalogs
//! - [`JsonFormatter`] - JSON run reports
//! - [`persist`] - atomic file replacement

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/Aaaapril4/SeisWaveDownloader/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod formatter;
mod json;
mod quakeml;
mod station;

pub use formatter::{FormatError, Formatter, persist};
pub use json::JsonFormatter;
pub use quakeml::QuakeMlFormatter;
pub use station::StationTextFormatter;
