//! Station inventory: networks, stations and channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TimeSpan;

/// A recording channel of a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Location code (may be empty).
    pub location: String,
    /// Channel code (e.g., "BHZ").
    pub code: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Elevation in meters.
    pub elevation: f64,
    /// Sensor depth in meters.
    pub depth: f64,
    /// Nominal sample rate in Hz.
    pub sample_rate: f64,
    /// Activation time.
    pub start_date: DateTime<Utc>,
    /// Deactivation time, `None` if still active.
    pub end_date: Option<DateTime<Utc>>,
}

impl Channel {
    /// Returns true if the channel was operating at any point during the span.
    #[must_use]
    pub fn is_active_during(&self, span: &TimeSpan) -> bool {
        span.overlaps_epoch(self.start_date, self.end_date)
    }
}

/// A seismic station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Network code the station belongs to.
    pub network: String,
    /// Station code.
    pub code: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Elevation in meters.
    pub elevation: f64,
    /// Free-form site name.
    pub site_name: String,
    /// Activation time.
    pub start_date: DateTime<Utc>,
    /// Deactivation time, `None` if still active.
    pub end_date: Option<DateTime<Utc>>,
    /// Channels, populated only for channel-level queries.
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Station {
    /// Returns the `NET.STA` identifier.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}.{}", self.network, self.code)
    }

    /// Returns true if the station was operating at any point during the span.
    #[must_use]
    pub fn is_active_during(&self, span: &TimeSpan) -> bool {
        span.overlaps_epoch(self.start_date, self.end_date)
    }
}

/// A seismic network and its stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Network code (e.g., "IU").
    pub code: String,
    /// Stations in query order.
    pub stations: Vec<Station>,
}

impl Network {
    /// Creates an empty network.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            stations: Vec::new(),
        }
    }

    /// Returns the span from the earliest station activation to the latest
    /// deactivation, using `now` when any station is still active.
    ///
    /// Returns `None` for a network without stations or whose stations all
    /// start after `now`.
    #[must_use]
    pub fn lifetime(&self, now: DateTime<Utc>) -> Option<TimeSpan> {
        let begin = self.stations.iter().map(|s| s.start_date).min()?;
        let end = if self.stations.iter().any(|s| s.end_date.is_none()) {
            now
        } else {
            self.stations.iter().filter_map(|s| s.end_date).max()?
        };
        TimeSpan::new(begin, end).ok()
    }
}

/// A collection of networks returned by a station query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    networks: Vec<Network>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            networks: Vec::new(),
        }
    }

    /// Creates an inventory from networks.
    #[must_use]
    pub const fn from_networks(networks: Vec<Network>) -> Self {
        Self { networks }
    }

    /// Adds a station, creating its network on first sight.
    ///
    /// Network order follows the order in which networks are first seen.
    pub fn push_station(&mut self, station: Station) {
        match self.networks.iter_mut().find(|n| n.code == station.network) {
            Some(network) => network.stations.push(station),
            None => {
                let mut network = Network::new(station.network.clone());
                network.stations.push(station);
                self.networks.push(network);
            }
        }
    }

    /// Removes every network with the given code, returning how many were removed.
    pub fn remove_network(&mut self, code: &str) -> usize {
        let before = self.networks.len();
        self.networks.retain(|n| n.code != code);
        before - self.networks.len()
    }

    /// Returns the networks.
    #[must_use]
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Returns an iterator over the networks.
    pub fn iter(&self) -> std::slice::Iter<'_, Network> {
        self.networks.iter()
    }

    /// Returns an iterator over all stations of all networks.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.networks.iter().flat_map(|n| n.stations.iter())
    }

    /// Returns the network codes in order.
    pub fn network_codes(&self) -> impl Iterator<Item = &str> {
        self.networks.iter().map(|n| n.code.as_str())
    }

    /// Returns the number of networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Returns true if there are no networks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Returns the total number of stations.
    #[must_use]
    pub fn station_count(&self) -> usize {
        self.networks.iter().map(|n| n.stations.len()).sum()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a Network;
    type IntoIter = std::slice::Iter<'a, Network>;

    fn into_iter(self) -> Self::IntoIter {
        self.networks.iter()
    }
}

impl FromIterator<Station> for Inventory {
    fn from_iter<I: IntoIterator<Item = Station>>(iter: I) -> Self {
        let mut inventory = Self::new();
        for station in iter {
            inventory.push_station(station);
        }
        inventory
    }
}
