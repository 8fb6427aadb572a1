//! miniSEED record header decoding.
//!
//! Only the fixed section of the data header and blockette 1000 are read;
//! sample payloads are left untouched. That is enough to measure how much
//! of a requested window a trace covers and whether it has gaps.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use seiswave_types::TimeSpan;
use thiserror::Error;

/// Length of the fixed section of the data header.
pub const FIXED_HEADER_SIZE: usize = 48;

/// Blockette type carrying encoding, word order and record length.
const BLOCKETTE_1000: u16 = 1000;

/// Errors that can occur while decoding miniSEED.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MseedError {
    /// Not enough bytes left for a record header.
    #[error("Truncated record at offset {0}")]
    Truncated(usize),

    /// The header start time is not a valid date.
    #[error("Invalid start time in record at offset {0}")]
    InvalidTime(usize),

    /// The record does not carry blockette 1000.
    #[error("Record at offset {0} has no blockette 1000")]
    MissingBlockette1000(usize),

    /// The record's last sample lies beyond the representable time range.
    #[error("Record at offset {0} ends beyond the representable time range")]
    TimeOverflow(usize),

    /// Blockette 1000 declares an impossible record length.
    #[error("Invalid record length exponent {exponent} at offset {offset}")]
    InvalidRecordLength {
        /// Record offset.
        offset: usize,
        /// Declared power of two.
        exponent: u8,
    },
}

/// Decoded header of one miniSEED record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    /// Network code.
    pub network: String,
    /// Station code.
    pub station: String,
    /// Location code (may be empty).
    pub location: String,
    /// Channel code.
    pub channel: String,
    /// Data quality indicator (`D`, `R`, `Q` or `M`).
    pub quality: char,
    /// Time of the first sample.
    pub start: DateTime<Utc>,
    /// Number of samples in the record.
    pub sample_count: u32,
    /// Nominal sample rate in Hz.
    pub sample_rate: f64,
    /// Total record length in bytes.
    pub record_length: usize,
}

impl RecordHeader {
    /// Returns the `NET.STA.LOC.CHA` identifier.
    #[must_use]
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }

    /// Returns the sample period, or zero for records without samples.
    #[must_use]
    pub fn period(&self) -> TimeDelta {
        period(self.sample_rate)
    }

    /// Returns the instant just after the last sample, or `None` if it is
    /// not representable.
    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        let micros = self
            .period()
            .num_microseconds()?
            .checked_mul(i64::from(self.sample_count))?;
        self.start
            .checked_add_signed(TimeDelta::microseconds(micros))
    }
}

fn period(sample_rate: f64) -> TimeDelta {
    if sample_rate > 0.0 {
        TimeDelta::microseconds((1_000_000.0 / sample_rate).round() as i64)
    } else {
        TimeDelta::zero()
    }
}

/// Parses every record header in a miniSEED byte stream.
///
/// Byte order is detected per record from the plausibility of the start
/// year and day of year, so mixed-endian streams decode correctly.
///
/// # Errors
///
/// Returns an error if a record is truncated or lacks the fields needed to
/// find the next record.
pub fn parse_records(data: &[u8]) -> Result<Vec<RecordHeader>, MseedError> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let remaining = &data[offset..];
        if remaining.len() < FIXED_HEADER_SIZE {
            // Trailing padding is common in dataselect responses
            if remaining.iter().all(|&b| b == 0 || b == b' ') {
                break;
            }
            return Err(MseedError::Truncated(offset));
        }

        let header = if is_big_endian(remaining) {
            parse_header::<BigEndian>(remaining, offset)?
        } else {
            parse_header::<LittleEndian>(remaining, offset)?
        };
        if header.record_length > remaining.len() {
            return Err(MseedError::Truncated(offset));
        }

        offset += header.record_length;
        records.push(header);
    }

    Ok(records)
}

fn is_big_endian(record: &[u8]) -> bool {
    let year = BigEndian::read_u16(&record[20..22]);
    let day = BigEndian::read_u16(&record[22..24]);
    (1900..=2100).contains(&year) && (1..=366).contains(&day)
}

fn ascii_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn parse_header<B: ByteOrder>(record: &[u8], offset: usize) -> Result<RecordHeader, MseedError> {
    let start = parse_btime::<B>(&record[20..30]).ok_or(MseedError::InvalidTime(offset))?;
    let sample_count = u32::from(B::read_u16(&record[30..32]));
    let factor = B::read_i16(&record[32..34]);
    let multiplier = B::read_i16(&record[34..36]);
    let time_correction = B::read_i32(&record[40..44]);
    let activity_flags = record[36];

    // Bit 1 of the activity flags means the correction is already applied
    let start = if activity_flags & 0x02 == 0 && time_correction != 0 {
        start
            .checked_add_signed(TimeDelta::microseconds(i64::from(time_correction) * 100))
            .ok_or(MseedError::InvalidTime(offset))?
    } else {
        start
    };

    let record_length = find_record_length::<B>(record, offset)?;

    let header = RecordHeader {
        network: ascii_field(&record[18..20]),
        station: ascii_field(&record[8..13]),
        location: ascii_field(&record[13..15]),
        channel: ascii_field(&record[15..18]),
        quality: char::from(record[6]),
        start,
        sample_count,
        sample_rate: sample_rate(factor, multiplier),
        record_length,
    };
    if header.end().is_none() {
        return Err(MseedError::TimeOverflow(offset));
    }
    Ok(header)
}

fn parse_btime<B: ByteOrder>(btime: &[u8]) -> Option<DateTime<Utc>> {
    let year = i32::from(B::read_u16(&btime[0..2]));
    let day = u32::from(B::read_u16(&btime[2..4]));
    let ten_thousandths = i64::from(B::read_u16(&btime[8..10]));

    let date = NaiveDate::from_yo_opt(year, day)?;
    let time = date.and_hms_opt(
        u32::from(btime[4]),
        u32::from(btime[5]),
        // Leap seconds are folded into the next minute
        u32::from(btime[6]).min(59),
    )?;
    time.and_utc()
        .checked_add_signed(TimeDelta::microseconds(ten_thousandths * 100))
}

/// Computes the sample rate from the SEED factor and multiplier.
#[must_use]
pub fn sample_rate(factor: i16, multiplier: i16) -> f64 {
    let f = f64::from(factor);
    let m = f64::from(multiplier);
    match (factor, multiplier) {
        (0, _) | (_, 0) => 0.0,
        (1.., 1..) => f * m,
        (1.., _) => -f / m,
        (_, 1..) => -m / f,
        _ => 1.0 / (f * m),
    }
}

fn find_record_length<B: ByteOrder>(record: &[u8], offset: usize) -> Result<usize, MseedError> {
    let mut next = usize::from(B::read_u16(&record[46..48]));
    let mut visited = 0;

    // Blockettes form a forward-linked list; the counter guards against cycles
    while next != 0 && next + 8 <= record.len() && visited < 16 {
        let kind = B::read_u16(&record[next..next + 2]);
        if kind == BLOCKETTE_1000 {
            let exponent = record[next + 6];
            if !(7..=20).contains(&exponent) {
                return Err(MseedError::InvalidRecordLength { offset, exponent });
            }
            return Ok(1 << exponent);
        }
        next = usize::from(B::read_u16(&record[next + 2..next + 4]));
        visited += 1;
    }

    Err(MseedError::MissingBlockette1000(offset))
}

/// Continuous coverage of one channel, as contiguous segments.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSummary {
    /// `NET.STA.LOC.CHA` identifier.
    pub id: String,
    /// Nominal sample rate in Hz.
    pub sample_rate: f64,
    /// Contiguous segments in time order.
    pub segments: Vec<TimeSpan>,
}

impl TraceSummary {
    /// Returns the number of gaps between segments.
    #[must_use]
    pub fn gap_count(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Returns the total time covered by data.
    #[must_use]
    pub fn coverage(&self) -> TimeDelta {
        self.segments
            .iter()
            .fold(TimeDelta::zero(), |acc, s| acc + s.duration())
    }
}

/// Groups records by channel and merges them into contiguous segments.
///
/// A record continues the current segment when it starts no later than
/// 1.5 sample periods after the segment's last sample. Output is ordered
/// by identifier.
#[must_use]
pub fn summarize(records: &[RecordHeader]) -> Vec<TraceSummary> {
    let mut sorted: Vec<&RecordHeader> = records.iter().filter(|r| r.sample_count > 0).collect();
    sorted.sort_by(|a, b| a.id().cmp(&b.id()).then(a.start.cmp(&b.start)));

    let mut summaries: Vec<TraceSummary> = Vec::new();
    for record in sorted {
        let Some(end) = record.end() else {
            continue;
        };
        let id = record.id();
        let span = TimeSpan {
            start: record.start,
            end,
        };

        match summaries.last_mut() {
            Some(summary) if summary.id == id => {
                let tolerance = period(summary.sample_rate) / 2;
                match summary.segments.last_mut() {
                    // `end` is one period past the last sample, so 1.5 periods
                    // after the last sample is `end + period / 2`
                    Some(last)
                        if last
                            .end
                            .checked_add_signed(tolerance)
                            .is_none_or(|limit| span.start <= limit) =>
                    {
                        last.end = last.end.max(span.end);
                    }
                    _ => summary.segments.push(span),
                }
            }
            _ => summaries.push(TraceSummary {
                id,
                sample_rate: record.sample_rate,
                segments: vec![span],
            }),
        }
    }

    summaries
}
