//! FDSN station text output format.

use seiswave_types::Inventory;
use std::io::Write;

use crate::{FormatError, Formatter};

const HEADER: &str = "#Network|Station|Latitude|Longitude|Elevation|SiteName|StartTime|EndTime";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Writes an inventory as station-level FDSN text, one line per station.
#[derive(Debug, Clone, Default)]
pub struct StationTextFormatter;

impl StationTextFormatter {
    /// Creates a new station text formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Formatter<Inventory> for StationTextFormatter {
    fn write<W: Write + Send>(&self, inventory: &Inventory, mut writer: W) -> Result<(), FormatError> {
        writeln!(writer, "{HEADER}")?;

        for station in inventory.stations() {
            writeln!(
                writer,
                "{}|{}|{}|{}|{}|{}|{}|{}",
                station.network,
                station.code,
                station.latitude,
                station.longitude,
                station.elevation,
                station.site_name.replace('|', " "),
                station.start_date.format(TIME_FORMAT),
                station
                    .end_date
                    .map(|d| d.format(TIME_FORMAT).to_string())
                    .unwrap_or_default(),
            )?;
        }

        Ok(())
    }

    fn extension(&self) -> &str {
        "txt"
    }
}
