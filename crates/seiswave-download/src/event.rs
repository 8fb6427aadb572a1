//! Event-mode outcomes and catalog bookkeeping.

use chrono::{DateTime, TimeDelta, Utc};
use seiswave_config::Settings;
use seiswave_fetch::Restrictions;
use seiswave_types::{Catalog, Event};
use serde::Serialize;

/// Minimum covered fraction for event windows.
const EVENT_MINIMUM_LENGTH: f64 = 1.0;

/// Minimum spacing between stations in event mode.
const EVENT_MINIMUM_DISTANCE_M: f64 = 1000.0;

/// Result of processing one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventStatus {
    /// Waveforms were downloaded in this run.
    Downloaded,
    /// The event was already flagged and was not requested again.
    AlreadyDownloaded,
    /// The download failed; the flag stays false.
    Failed {
        /// Error description.
        reason: String,
    },
}

impl EventStatus {
    /// Returns true if the event's data is on disk after this run.
    #[must_use]
    pub const fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded | Self::AlreadyDownloaded)
    }
}

/// Per-event entry of an event-mode report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    /// Event resource identifier.
    pub resource_id: String,
    /// Origin time.
    pub origin_time: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub status: EventStatus,
}

/// Summary of an event-mode run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventReport {
    /// Outcomes in catalog order.
    pub outcomes: Vec<EventOutcome>,
    /// The catalog with updated download flags.
    #[serde(skip)]
    pub catalog: Catalog,
}

impl EventReport {
    /// Pairs the catalog with the outcomes and applies the download flags.
    ///
    /// `outcomes[i]` must describe `events[i]`.
    #[must_use]
    pub fn rebuild(events: Vec<Event>, outcomes: Vec<EventOutcome>) -> Self {
        let catalog = events
            .into_iter()
            .zip(&outcomes)
            .map(|(mut event, outcome)| {
                event.downloaded = outcome.status.is_downloaded();
                event
            })
            .collect();
        Self { outcomes, catalog }
    }

    /// Number of events downloaded in this run.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.count(|s| matches!(s, EventStatus::Downloaded))
    }

    /// Number of events skipped because they were already downloaded.
    #[must_use]
    pub fn already_downloaded(&self) -> usize {
        self.count(|s| matches!(s, EventStatus::AlreadyDownloaded))
    }

    /// Number of failed events.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, EventStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&EventStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Builds the restrictions for one event window.
#[must_use]
pub fn event_restrictions(
    settings: &Settings,
    event: &Event,
    before: TimeDelta,
    after: TimeDelta,
) -> Restrictions {
    Restrictions::new(event.window(before, after))
        .with_network(settings.station.network.clone())
        .with_station(settings.station.station.clone())
        .with_channel_priorities(settings.station.channel_priorities())
        .with_reject_gaps(false)
        .with_minimum_length(EVENT_MINIMUM_LENGTH)
        .with_minimum_interstation_distance(EVENT_MINIMUM_DISTANCE_M)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::settings_in;
    use chrono::TimeZone;

    fn event(id: &str, downloaded: bool) -> Event {
        let mut event = Event::new(
            id,
            Utc.with_ymd_and_hms(2021, 7, 29, 6, 15, 49).unwrap(),
            55.3,
            -157.8,
        );
        event.downloaded = downloaded;
        event
    }

    fn outcome(id: &str, status: EventStatus) -> EventOutcome {
        EventOutcome {
            resource_id: id.to_string(),
            origin_time: Utc.with_ymd_and_hms(2021, 7, 29, 6, 15, 49).unwrap(),
            status,
        }
    }

    #[test]
    fn test_event_restrictions_window() {
        let settings = settings_in(std::path::Path::new("/data"));
        let e = event("a", false);
        let r = event_restrictions(&settings, &e, TimeDelta::seconds(60), TimeDelta::seconds(600));

        assert_eq!(r.span.start, e.origin_time - TimeDelta::seconds(60));
        assert_eq!(r.span.end, e.origin_time + TimeDelta::seconds(600));
        assert_eq!(r.minimum_length, 1.0);
        assert_eq!(r.minimum_interstation_distance_m, 1000.0);
        assert!(!r.reject_channels_with_gaps);
    }

    #[test]
    fn test_rebuild_applies_flags_in_order() {
        let events = vec![event("a", false), event("b", true), event("c", false)];
        let outcomes = vec![
            outcome("a", EventStatus::Downloaded),
            outcome("b", EventStatus::AlreadyDownloaded),
            outcome(
                "c",
                EventStatus::Failed {
                    reason: "timeout".to_string(),
                },
            ),
        ];

        let report = EventReport::rebuild(events, outcomes);
        let flags: Vec<(&str, bool)> = report
            .catalog
            .iter()
            .map(|e| (e.resource_id.as_str(), e.downloaded))
            .collect();
        assert_eq!(flags, vec![("a", true), ("b", true), ("c", false)]);
        assert_eq!(report.downloaded(), 1);
        assert_eq!(report.already_downloaded(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let json = to_json(&outcome(
            "smi:local/1",
            EventStatus::Failed {
                reason: "no data".to_string(),
            },
        ));
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"reason\":\"no data\""));
    }

    fn to_json(outcome: &EventOutcome) -> String {
        use seiswave_format::{Formatter, JsonFormatter};
        let mut out = Vec::new();
        JsonFormatter::new().write(outcome, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }
}
