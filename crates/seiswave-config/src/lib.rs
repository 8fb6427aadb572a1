//! INI configuration loading for the seiswave seismic data downloader.
//!
//! [`Settings::load`] reads a sectioned key/value file and produces an
//! immutable, typed view including the [`RectangularDomain`] used for every
//! archive query.
//!
//! [`RectangularDomain`]: seiswave_types::RectangularDomain

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/Aaaapril4/SeisWaveDownloader/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{
    ClientSettings, DEFAULT_CONFIG_PATH, EventSettings, SaveSettings, Settings, StationSettings,
};
