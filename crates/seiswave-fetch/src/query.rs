//! FDSN query parameter sets.

use seiswave_types::{RectangularDomain, TimeSpan};

use crate::url::{fdsn_location, fdsn_time};

/// Detail level of a station query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Network level.
    Network,
    /// Station level.
    Station,
    /// Channel level.
    Channel,
    /// Full instrument response (StationXML only).
    Response,
}

impl Level {
    /// Returns the FDSN parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Station => "station",
            Self::Channel => "channel",
            Self::Response => "response",
        }
    }
}

/// An `fdsnws-station` query.
#[derive(Debug, Clone, PartialEq)]
pub struct StationQuery {
    /// Network pattern.
    pub network: String,
    /// Station pattern.
    pub station: String,
    /// Location pattern.
    pub location: String,
    /// Channel pattern.
    pub channel: String,
    /// Time range the stations must overlap.
    pub span: TimeSpan,
    /// Bounding box the stations must lie in.
    pub domain: RectangularDomain,
    /// Detail level.
    pub level: Level,
}

impl StationQuery {
    /// Returns the query parameters.
    ///
    /// Text output is requested for every level except [`Level::Response`],
    /// which is only available as StationXML.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let format = if self.level == Level::Response { "xml" } else { "text" };
        vec![
            ("network", self.network.clone()),
            ("station", self.station.clone()),
            ("location", self.location.clone()),
            ("channel", self.channel.clone()),
            ("starttime", fdsn_time(self.span.start)),
            ("endtime", fdsn_time(self.span.end)),
            ("minlatitude", self.domain.min_latitude.to_string()),
            ("maxlatitude", self.domain.max_latitude.to_string()),
            ("minlongitude", self.domain.min_longitude.to_string()),
            ("maxlongitude", self.domain.max_longitude.to_string()),
            ("level", self.level.as_str().to_string()),
            ("format", format.to_string()),
        ]
    }
}

/// An `fdsnws-event` radius query.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    /// Origin time range.
    pub span: TimeSpan,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Minimum distance from the center in degrees.
    pub min_radius: Option<f64>,
    /// Maximum distance from the center in degrees.
    pub max_radius: Option<f64>,
    /// Minimum magnitude.
    pub min_magnitude: Option<f64>,
}

impl EventQuery {
    /// Returns the query parameters.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("starttime", fdsn_time(self.span.start)),
            ("endtime", fdsn_time(self.span.end)),
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
        ];
        if let Some(r) = self.min_radius {
            params.push(("minradius", r.to_string()));
        }
        if let Some(r) = self.max_radius {
            params.push(("maxradius", r.to_string()));
        }
        if let Some(m) = self.min_magnitude {
            params.push(("minmagnitude", m.to_string()));
        }
        params.push(("format", "text".to_string()));
        params
    }
}

/// An `fdsnws-dataselect` query for a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformQuery {
    /// Network code.
    pub network: String,
    /// Station code.
    pub station: String,
    /// Location code (may be empty).
    pub location: String,
    /// Channel code.
    pub channel: String,
    /// Requested time range.
    pub span: TimeSpan,
}

impl WaveformQuery {
    /// Returns the query parameters.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("network", self.network.clone()),
            ("station", self.station.clone()),
            ("location", fdsn_location(&self.location).to_string()),
            ("channel", self.channel.clone()),
            ("starttime", fdsn_time(self.span.start)),
            ("endtime", fdsn_time(self.span.end)),
        ]
    }

    /// Returns the `NET.STA.LOC.CHA` identifier.
    #[must_use]
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }
}
