//! Parsing of FDSN pipe-separated text responses.
//!
//! Station level:
//! `#Network|Station|Latitude|Longitude|Elevation|SiteName|StartTime|EndTime`
//!
//! Channel level:
//! `#Network|Station|Location|Channel|Latitude|Longitude|Elevation|Depth|Azimuth|Dip|SensorDescription|Scale|ScaleFreq|ScaleUnits|SampleRate|StartTime|EndTime`
//!
//! Event:
//! `#EventID|Time|Latitude|Longitude|Depth/km|Author|Catalog|Contributor|ContributorID|MagType|Magnitude|MagAuthor|EventLocationName`

use chrono::{DateTime, Utc};
use seiswave_types::{Catalog, Channel, Event, Inventory, Station, parse_timestamp};
use thiserror::Error;

/// Errors that can occur while parsing FDSN text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A data line has fewer columns than the format requires.
    #[error("Line {line}: expected at least {expected} columns, found {found}")]
    MissingColumns {
        /// 1-based line number.
        line: usize,
        /// Required column count.
        expected: usize,
        /// Columns present.
        found: usize,
    },

    /// A numeric column could not be parsed.
    #[error("Line {line}: invalid number {value:?} in column {column}")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// Column name.
        column: &'static str,
        /// The offending value.
        value: String,
    },

    /// A time column could not be parsed.
    #[error("Line {line}: invalid time {value:?} in column {column}")]
    InvalidTime {
        /// 1-based line number.
        line: usize,
        /// Column name.
        column: &'static str,
        /// The offending value.
        value: String,
    },
}

/// One data line split into trimmed columns.
struct Row<'a> {
    line: usize,
    cols: Vec<&'a str>,
}

impl<'a> Row<'a> {
    fn text(&self, idx: usize) -> &'a str {
        self.cols.get(idx).copied().unwrap_or("")
    }

    fn number(&self, idx: usize, column: &'static str) -> Result<f64, ParseError> {
        let value = self.text(idx);
        value.parse().map_err(|_| ParseError::InvalidNumber {
            line: self.line,
            column,
            value: value.to_string(),
        })
    }

    fn optional_number(&self, idx: usize, column: &'static str) -> Result<Option<f64>, ParseError> {
        if self.text(idx).is_empty() {
            return Ok(None);
        }
        self.number(idx, column).map(Some)
    }

    fn time(&self, idx: usize, column: &'static str) -> Result<DateTime<Utc>, ParseError> {
        let value = self.text(idx);
        parse_timestamp(value).map_err(|_| ParseError::InvalidTime {
            line: self.line,
            column,
            value: value.to_string(),
        })
    }

    fn optional_time(
        &self,
        idx: usize,
        column: &'static str,
    ) -> Result<Option<DateTime<Utc>>, ParseError> {
        if self.text(idx).is_empty() {
            return Ok(None);
        }
        self.time(idx, column).map(Some)
    }
}

/// Splits text into data rows, skipping comments and blank lines.
fn rows(text: &str, expected: usize) -> impl Iterator<Item = Result<Row<'_>, ParseError>> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('#')
        })
        .map(move |(i, l)| {
            let cols: Vec<&str> = l.split('|').map(str::trim).collect();
            if cols.len() < expected {
                return Err(ParseError::MissingColumns {
                    line: i + 1,
                    expected,
                    found: cols.len(),
                });
            }
            Ok(Row { line: i + 1, cols })
        })
}

/// Parses a station-level text response into an inventory.
///
/// # Errors
///
/// Returns an error if a line is malformed.
pub fn parse_stations(text: &str) -> Result<Inventory, ParseError> {
    let mut inventory = Inventory::new();

    for row in rows(text, 8) {
        let row = row?;
        inventory.push_station(Station {
            network: row.text(0).to_string(),
            code: row.text(1).to_string(),
            latitude: row.number(2, "Latitude")?,
            longitude: row.number(3, "Longitude")?,
            elevation: row.optional_number(4, "Elevation")?.unwrap_or(0.0),
            site_name: row.text(5).to_string(),
            start_date: row.time(6, "StartTime")?,
            end_date: row.optional_time(7, "EndTime")?,
            channels: Vec::new(),
        });
    }

    Ok(inventory)
}

/// Parses a channel-level text response into an inventory.
///
/// Stations are synthesized from their channels: position from the first
/// channel, start from the earliest channel start, end open if any channel
/// is open-ended.
///
/// # Errors
///
/// Returns an error if a line is malformed.
pub fn parse_channels(text: &str) -> Result<Inventory, ParseError> {
    let mut stations: Vec<Station> = Vec::new();

    for row in rows(text, 17) {
        let row = row?;
        let channel = Channel {
            location: row.text(2).to_string(),
            code: row.text(3).to_string(),
            latitude: row.number(4, "Latitude")?,
            longitude: row.number(5, "Longitude")?,
            elevation: row.optional_number(6, "Elevation")?.unwrap_or(0.0),
            depth: row.optional_number(7, "Depth")?.unwrap_or(0.0),
            sample_rate: row.optional_number(14, "SampleRate")?.unwrap_or(0.0),
            start_date: row.time(15, "StartTime")?,
            end_date: row.optional_time(16, "EndTime")?,
        };

        let (network, code) = (row.text(0), row.text(1));
        match stations
            .iter_mut()
            .find(|s| s.network == network && s.code == code)
        {
            Some(station) => {
                station.start_date = station.start_date.min(channel.start_date);
                station.end_date = match (station.end_date, channel.end_date) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    _ => None,
                };
                station.channels.push(channel);
            }
            None => stations.push(Station {
                network: network.to_string(),
                code: code.to_string(),
                latitude: channel.latitude,
                longitude: channel.longitude,
                elevation: channel.elevation,
                site_name: String::new(),
                start_date: channel.start_date,
                end_date: channel.end_date,
                channels: vec![channel],
            }),
        }
    }

    Ok(stations.into_iter().collect())
}

/// Parses an event text response into a catalog.
///
/// Every event starts with `downloaded = false`.
///
/// # Errors
///
/// Returns an error if a line is malformed.
pub fn parse_events(text: &str) -> Result<Catalog, ParseError> {
    rows(text, 13)
        .map(|row| {
            let row = row?;
            let id = row.text(0);
            let mut event = Event::new(
                if id.contains(':') {
                    id.to_string()
                } else {
                    format!("smi:local/event/{id}")
                },
                row.time(1, "Time")?,
                row.number(2, "Latitude")?,
                row.number(3, "Longitude")?,
            );
            event.depth_km = row.optional_number(4, "Depth/km")?;
            event.magnitude_type = Some(row.text(9)).filter(|s| !s.is_empty()).map(str::to_string);
            event.magnitude = row.optional_number(10, "Magnitude")?;
            event.description = Some(row.text(12)).filter(|s| !s.is_empty()).map(str::to_string);
            Ok(event)
        })
        .collect()
}
