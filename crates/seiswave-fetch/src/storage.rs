//! Deterministic on-disk layout for downloaded files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use seiswave_types::TimeSpan;

/// Time format used in waveform file names.
pub const FILE_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Path templates for waveform and StationXML files.
///
/// Waveform templates may use `{network}`, `{station}`, `{location}`,
/// `{channel}`, `{starttime}` and `{endtime}`; StationXML templates may use
/// `{network}` and `{station}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    waveform: String,
    stationxml: String,
}

impl StorageLayout {
    /// Creates a layout from explicit templates.
    #[must_use]
    pub fn new(waveform: impl Into<String>, stationxml: impl Into<String>) -> Self {
        Self {
            waveform: waveform.into(),
            stationxml: stationxml.into(),
        }
    }

    /// Returns the standard layout rooted at `data_dir`.
    ///
    /// # Example
    ///
    /// ```
    /// use seiswave_fetch::StorageLayout;
    ///
    /// let layout = StorageLayout::under("/data");
    /// assert_eq!(
    ///     layout.stationxml_path("IU", "ANMO").to_str(),
    ///     Some("/data/station/IU.ANMO.xml")
    /// );
    /// ```
    #[must_use]
    pub fn under(data_dir: impl AsRef<Path>) -> Self {
        let root = data_dir.as_ref().display().to_string();
        let root = root.trim_end_matches('/');
        Self::new(
            format!(
                "{root}/waveform/{{network}}.{{station}}/{{network}}.{{station}}.{{location}}.{{channel}}__{{starttime}}__{{endtime}}.mseed"
            ),
            format!("{root}/station/{{network}}.{{station}}.xml"),
        )
    }

    /// Returns the path of a waveform file.
    #[must_use]
    pub fn waveform_path(
        &self,
        network: &str,
        station: &str,
        location: &str,
        channel: &str,
        span: &TimeSpan,
    ) -> PathBuf {
        PathBuf::from(
            self.waveform
                .replace("{network}", network)
                .replace("{station}", station)
                .replace("{location}", location)
                .replace("{channel}", channel)
                .replace("{starttime}", &file_time(span.start))
                .replace("{endtime}", &file_time(span.end)),
        )
    }

    /// Returns the path of a station's StationXML file.
    #[must_use]
    pub fn stationxml_path(&self, network: &str, station: &str) -> PathBuf {
        PathBuf::from(
            self.stationxml
                .replace("{network}", network)
                .replace("{station}", station),
        )
    }
}

fn file_time(instant: DateTime<Utc>) -> String {
    instant.format(FILE_TIME_FORMAT).to_string()
}

/// Writes `contents` to `path` through a sibling `.part` file and a rename.
///
/// Parent directories are created as needed. Readers never observe a
/// partially written file.
///
/// # Errors
///
/// Returns an error if any filesystem operation fails.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    tokio::fs::write(&part, contents).await?;
    if let Err(e) = tokio::fs::rename(&part, path).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e);
    }
    Ok(())
}
