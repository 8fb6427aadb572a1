//! Seismic events and catalogs.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::TimeSpan;

/// XML namespace of the `downloaded` annotation stored on each event.
pub const DOWNLOADED_NAMESPACE: &str = "http://test.org/xmlns/1.0";

/// A seismic event with its download annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Resource identifier assigned by the catalog.
    pub resource_id: String,
    /// Preferred origin time.
    pub origin_time: DateTime<Utc>,
    /// Origin latitude in degrees.
    pub latitude: f64,
    /// Origin longitude in degrees.
    pub longitude: f64,
    /// Origin depth in kilometers.
    pub depth_km: Option<f64>,
    /// Preferred magnitude value.
    pub magnitude: Option<f64>,
    /// Magnitude type (e.g., "Mw").
    pub magnitude_type: Option<String>,
    /// Region name or description.
    pub description: Option<String>,
    /// Whether waveforms for this event have been downloaded.
    pub downloaded: bool,
}

impl Event {
    /// Creates an event that has not been downloaded.
    #[must_use]
    pub fn new(
        resource_id: impl Into<String>,
        origin_time: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            origin_time,
            latitude,
            longitude,
            depth_km: None,
            magnitude: None,
            magnitude_type: None,
            description: None,
            downloaded: false,
        }
    }

    /// Returns true if waveforms for this event have been downloaded.
    #[must_use]
    pub const fn is_downloaded(&self) -> bool {
        self.downloaded
    }

    /// Returns the window `origin - before .. origin + after`.
    ///
    /// Negative durations are treated as zero.
    #[must_use]
    pub fn window(&self, before: TimeDelta, after: TimeDelta) -> TimeSpan {
        let start = self.origin_time - before.max(TimeDelta::zero());
        let end = self.origin_time + after.max(TimeDelta::zero());
        TimeSpan { start, end }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ", self.origin_time.format("%Y-%m-%dT%H:%M:%S%.fZ"))?;
        if let Some(mag) = self.magnitude {
            write!(f, "M{mag:.1} ")?;
        }
        write!(f, "({:.3}, {:.3})", self.latitude, self.longitude)
    }
}

/// An ordered collection of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    events: Vec<Event>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Removes all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Sets the `downloaded` annotation on every event.
    pub fn tag_all(&mut self, downloaded: bool) {
        for event in &mut self.events {
            event.downloaded = downloaded;
        }
    }

    /// Returns the events.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns an iterator over the events.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Consumes the catalog, returning its events.
    #[must_use]
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the catalog has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the number of events flagged as downloaded.
    #[must_use]
    pub fn downloaded_count(&self) -> usize {
        self.events.iter().filter(|e| e.downloaded).count()
    }
}

impl FromIterator<Event> for Catalog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Catalog {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 7, 29, 6, 15, 49).unwrap()
    }

    #[test]
    fn test_event_window() {
        let event = Event::new("smi:test/1", origin(), 55.3, -157.8);
        let window = event.window(TimeDelta::seconds(60), TimeDelta::seconds(600));

        assert_eq!(window.start, origin() - TimeDelta::seconds(60));
        assert_eq!(window.end, origin() + TimeDelta::seconds(600));
        assert!(!event.is_downloaded());
    }

    #[test]
    fn test_catalog_tagging() {
        let mut catalog: Catalog = (0..3)
            .map(|i| Event::new(format!("smi:test/{i}"), origin(), 0.0, 0.0))
            .collect();
        assert_eq!(catalog.downloaded_count(), 0);

        catalog.tag_all(true);
        assert_eq!(catalog.downloaded_count(), 3);

        catalog.clear();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_event_display() {
        let mut event = Event::new("smi:test/1", origin(), 55.3, -157.8);
        event.magnitude = Some(8.2);
        assert_eq!(event.to_string(), "2021-07-29T06:15:49Z M8.2 (55.300, -157.800)");
    }
}
