//! Time spans and their partitioning into download chunks.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

use crate::TimeSpanError;

/// A half-open UTC time interval `[start, end)`.
///
/// Consecutive chunks produced by [`SpanChunks`] share their boundary
/// instant, so concatenating them reproduces the original span exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Start time (inclusive).
    pub start: DateTime<Utc>,
    /// End time (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    /// Creates a new time span, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeSpanError> {
        if start > end {
            return Err(TimeSpanError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the length of the span.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Returns true if the span has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if the span contains the given instant.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Returns true if `other` lies entirely within this span.
    #[must_use]
    pub fn encloses(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Returns true if the two spans share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if an epoch starting at `start` and ending at `end` (or
    /// still open) shares any instant with this span.
    #[must_use]
    pub fn overlaps_epoch(&self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
        start < self.end && end.is_none_or(|end| end > self.start)
    }

    /// Returns the overlap of two spans, or `None` if it has no positive length.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Self { start, end })
    }

    /// Returns the calendar day of the last instant inside the span.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        if self.is_empty() {
            return self.start.date_naive();
        }
        (self.end - TimeDelta::nanoseconds(1)).date_naive()
    }

    /// Splits the span into calendar-month chunks.
    ///
    /// The first chunk starts at the span start, every boundary falls on the
    /// first instant of a month, and the last chunk is clipped to the span end.
    #[must_use]
    pub const fn months(&self) -> SpanChunks {
        SpanChunks::new(*self, Step::Month)
    }

    /// Splits the span into `days`-long chunks on day-aligned boundaries.
    ///
    /// Boundaries are `floor_day(start) + k * days`; the first and last chunks
    /// are clipped to the span.
    #[must_use]
    pub fn days(&self, days: u32) -> SpanChunks {
        SpanChunks::new(
            *self,
            Step::Fixed {
                anchor: floor_day(self.start),
                length: TimeDelta::days(i64::from(days.max(1))),
            },
        )
    }

    /// Splits the span into consecutive pieces of at most `length`, starting at the span start.
    #[must_use]
    pub fn split(&self, length: TimeDelta) -> SpanChunks {
        let length = if length > TimeDelta::zero() {
            length
        } else {
            self.duration().max(TimeDelta::nanoseconds(1))
        };
        SpanChunks::new(
            *self,
            Step::Fixed {
                anchor: self.start,
                length,
            },
        )
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%dT%H:%M:%S%.fZ"),
            self.end.format("%Y-%m-%dT%H:%M:%S%.fZ")
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Month,
    Fixed {
        anchor: DateTime<Utc>,
        length: TimeDelta,
    },
}

impl Step {
    /// Returns the first boundary strictly after `cursor`.
    fn next_boundary(&self, cursor: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Self::Month => {
                let (year, month) = if cursor.month() == 12 {
                    (cursor.year() + 1, 1)
                } else {
                    (cursor.year(), cursor.month() + 1)
                };
                month_start(year, month)
            }
            Self::Fixed { anchor, length } => {
                let length_ns = length.num_nanoseconds()?;
                let elapsed_ns = (cursor - anchor).num_nanoseconds()?;
                let steps = elapsed_ns.div_euclid(length_ns) + 1;
                anchor.checked_add_signed(TimeDelta::nanoseconds(steps.checked_mul(length_ns)?))
            }
        }
    }
}

/// Iterator over consecutive sub-spans of a [`TimeSpan`].
#[derive(Debug, Clone)]
pub struct SpanChunks {
    span: TimeSpan,
    cursor: DateTime<Utc>,
    step: Step,
}

impl SpanChunks {
    const fn new(span: TimeSpan, step: Step) -> Self {
        Self {
            span,
            cursor: span.start,
            step,
        }
    }
}

impl Iterator for SpanChunks {
    type Item = TimeSpan;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.span.end {
            return None;
        }

        let boundary = self
            .step
            .next_boundary(self.cursor)
            .map_or(self.span.end, |b| b.min(self.span.end));
        let chunk = TimeSpan {
            start: self.cursor,
            end: boundary,
        };
        self.cursor = boundary;
        Some(chunk)
    }
}

impl std::iter::FusedIterator for SpanChunks {}

/// Returns the number of days in the given month.
///
/// Returns `None` for an invalid year/month combination.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// Truncates an instant to midnight of its UTC day.
#[must_use]
pub fn floor_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y%m%dT%H:%M:%S%.f",
    "%Y%m%dT%H:%M:%S",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M%S",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Parses an ISO-like timestamp into UTC.
///
/// Accepts RFC 3339, `2020-01-01T00:00:00[.ffffff][Z]`, the compact
/// `20200101T00:00:00` form, a space in place of `T`, or a bare date.
/// Timestamps without an offset are taken as UTC.
///
/// # Errors
///
/// Returns an error if no supported format matches.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TimeSpanError> {
    let trimmed = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, format) {
            return Ok(date.and_time(NaiveTime::MIN).and_utc());
        }
    }

    Err(TimeSpanError::InvalidTimestamp(text.to_string()))
}
