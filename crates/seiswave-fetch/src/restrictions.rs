//! Download restrictions for one mass-download call.

use chrono::TimeDelta;
use seiswave_types::TimeSpan;

/// What to download and which traces to keep.
///
/// Network, station and location are FDSN patterns passed straight to the
/// archive. Channel priorities are tried in order per station; the first
/// pattern that matches any channel selects the channels to download.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use seiswave_fetch::Restrictions;
/// use seiswave_types::TimeSpan;
///
/// let span = TimeSpan::new(
///     Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
/// )
/// .unwrap();
/// let restrictions = Restrictions::new(span)
///     .with_network("IU")
///     .with_channel_priorities(["HH[ZNE]", "BH[ZNE]"])
///     .with_minimum_length(0.5);
/// assert_eq!(restrictions.channel_priorities.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Restrictions {
    /// Requested time span.
    pub span: TimeSpan,
    /// Split the span into pieces of this length, one file each.
    pub chunk_length: Option<TimeDelta>,
    /// Network pattern.
    pub network: String,
    /// Station pattern.
    pub station: String,
    /// Location pattern.
    pub location: String,
    /// Channel patterns in priority order.
    pub channel_priorities: Vec<String>,
    /// Drop traces that contain gaps.
    pub reject_channels_with_gaps: bool,
    /// Minimum covered fraction of each piece, in `[0, 1]`.
    pub minimum_length: f64,
    /// Stations closer than this to an already selected one are skipped.
    pub minimum_interstation_distance_m: f64,
}

impl Restrictions {
    /// Creates restrictions accepting everything in `span`.
    #[must_use]
    pub fn new(span: TimeSpan) -> Self {
        Self {
            span,
            chunk_length: None,
            network: "*".to_string(),
            station: "*".to_string(),
            location: "*".to_string(),
            channel_priorities: vec!["*".to_string()],
            reject_channels_with_gaps: false,
            minimum_length: 0.0,
            minimum_interstation_distance_m: 0.0,
        }
    }

    /// Sets the network pattern.
    #[must_use]
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Sets the station pattern.
    #[must_use]
    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.station = station.into();
        self
    }

    /// Sets the location pattern.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Sets the channel priority list.
    #[must_use]
    pub fn with_channel_priorities<I, S>(mut self, priorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel_priorities = priorities.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the piece length.
    #[must_use]
    pub const fn with_chunk_length(mut self, length: TimeDelta) -> Self {
        self.chunk_length = Some(length);
        self
    }

    /// Enables or disables rejection of gappy traces.
    #[must_use]
    pub const fn with_reject_gaps(mut self, reject: bool) -> Self {
        self.reject_channels_with_gaps = reject;
        self
    }

    /// Sets the minimum covered fraction, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_minimum_length(mut self, fraction: f64) -> Self {
        self.minimum_length = fraction.clamp(0.0, 1.0);
        self
    }

    /// Sets the minimum inter-station distance in meters.
    #[must_use]
    pub const fn with_minimum_interstation_distance(mut self, meters: f64) -> Self {
        self.minimum_interstation_distance_m = meters;
        self
    }

    /// Returns the pieces the span is downloaded in.
    #[must_use]
    pub fn pieces(&self) -> Vec<TimeSpan> {
        match self.chunk_length {
            Some(length) if length > TimeDelta::zero() => self.span.split(length).collect(),
            _ if self.span.is_empty() => Vec::new(),
            _ => vec![self.span],
        }
    }

    /// Returns the minimum data duration a piece must be covered by.
    #[must_use]
    pub fn required_coverage(&self, piece: &TimeSpan) -> TimeDelta {
        let micros = piece.duration().num_microseconds().unwrap_or(i64::MAX) as f64;
        TimeDelta::microseconds((micros * self.minimum_length) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day() -> TimeSpan {
        TimeSpan::new(
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_accept_everything() {
        let r = Restrictions::new(day());
        assert_eq!(r.network, "*");
        assert_eq!(r.channel_priorities, vec!["*"]);
        assert!(!r.reject_channels_with_gaps);
        assert_eq!(r.pieces(), vec![day()]);
    }

    #[test]
    fn test_pieces_by_chunk_length() {
        let r = Restrictions::new(day()).with_chunk_length(TimeDelta::hours(10));
        let pieces = r.pieces();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].duration(), TimeDelta::hours(10));
        assert_eq!(pieces[2].duration(), TimeDelta::hours(4));
        assert_eq!(pieces[2].end, day().end);
    }

    #[test]
    fn test_required_coverage() {
        let r = Restrictions::new(day()).with_minimum_length(0.5);
        assert_eq!(r.required_coverage(&day()), TimeDelta::hours(12));

        let clamped = Restrictions::new(day()).with_minimum_length(3.0);
        assert_eq!(clamped.minimum_length, 1.0);
    }
}
