//! Typed view of the INI configuration.

use chrono::{DateTime, TimeDelta, Utc};
use ini::Ini;
use seiswave_types::{
    ChunkSize, ChunkSizeError, RectangularDomain, TimeSpan, TimeSpanError, parse_timestamp,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ConfigError;

/// Configuration file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "para.ini";

const DEFAULT_SECTION: &str = "DEFAULT";
const MAP_SECTION: &str = "Map Info";
const STATION_SECTION: &str = "Station Info";
const EVENT_SECTION: &str = "Event Info";
const SAVE_SECTION: &str = "Save Data";
const CLIENT_SECTION: &str = "Client";

/// Immutable run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root output directory.
    pub data_dir: PathBuf,
    /// Number of concurrent download workers (1 = sequential).
    pub ncpu: usize,
    /// Geographic bounding box for every query.
    pub domain: RectangularDomain,
    /// Station filters, global time range and chunking.
    pub station: StationSettings,
    /// Event search parameters.
    pub event: EventSettings,
    /// Metadata persistence flags.
    pub save: SaveSettings,
    /// Archive client parameters.
    pub client: ClientSettings,
}

/// The `[Station Info]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSettings {
    /// Network code pattern.
    pub network: String,
    /// Station code pattern.
    pub station: String,
    /// Comma-separated channel priority patterns.
    pub channel_priority: String,
    /// Global time range for every query.
    pub time_range: TimeSpan,
    /// Network codes removed from the inventory.
    pub network_filter: Vec<String>,
    /// Raw chunk size value, validated by [`StationSettings::chunk_size`].
    pub chunk_size: String,
}

impl StationSettings {
    /// Returns the channel priority patterns in order.
    #[must_use]
    pub fn channel_priorities(&self) -> Vec<String> {
        split_list(&self.channel_priority)
    }

    /// Parses the configured chunk size.
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is a positive day count or `mon`.
    pub fn chunk_size(&self) -> Result<ChunkSize, ChunkSizeError> {
        self.chunk_size.parse()
    }
}

/// The `[Event Info]` section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventSettings {
    /// Minimum epicentral distance in degrees.
    pub min_radius: Option<f64>,
    /// Maximum epicentral distance in degrees.
    pub max_radius: Option<f64>,
    /// Minimum magnitude.
    pub min_magnitude: Option<f64>,
    /// Seconds of data before the origin time.
    pub before_secs: Option<i64>,
    /// Seconds of data after the origin time.
    pub after_secs: Option<i64>,
}

impl EventSettings {
    /// Returns the `(before, after)` window around each origin time.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is not configured.
    pub fn window(&self) -> Result<(TimeDelta, TimeDelta), ConfigError> {
        let before = self.before_secs.ok_or(ConfigError::MissingKey {
            section: EVENT_SECTION,
            key: "startTime_sec",
        })?;
        let after = self.after_secs.ok_or(ConfigError::MissingKey {
            section: EVENT_SECTION,
            key: "endTime_sec",
        })?;
        Ok((TimeDelta::seconds(before), TimeDelta::seconds(after)))
    }
}

/// The `[Save Data]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSettings {
    /// Write the filtered inventory to `station.txt`.
    pub station_info: bool,
    /// Write the event catalog to `evcatalog.xml`.
    pub event_catalog: bool,
}

/// The optional `[Client]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// FDSN provider name or base URL.
    pub provider: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum retry attempts per request.
    pub max_retries: u32,
    /// Concurrent channel downloads within one chunk or event.
    pub concurrency: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            provider: "IRIS".to_string(),
            timeout_secs: 60,
            max_retries: 10,
            concurrency: 4,
        }
    }
}

impl Settings {
    /// Loads settings from an INI file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the bounding box is
    /// missing or invalid, or any value has the wrong type.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_ini(&ini, Utc::now())?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(settings)
    }

    /// Parses settings from INI text.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Settings::load`].
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        Self::from_ini(&ini, Utc::now())
    }

    /// Builds settings from a parsed INI document; `now` is the default end time.
    fn from_ini(ini: &Ini, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let view = IniView(ini);

        let domain = RectangularDomain::new(
            view.require::<f64>(MAP_SECTION, "minLatitude", "a number")?,
            view.require::<f64>(MAP_SECTION, "maxLatitude", "a number")?,
            view.require::<f64>(MAP_SECTION, "minLongitude", "a number")?,
            view.require::<f64>(MAP_SECTION, "maxLongitude", "a number")?,
        )?;

        let ncpu = view
            .parse::<usize>(DEFAULT_SECTION, "ncpu", "a positive integer")?
            .unwrap_or(1);
        if ncpu == 0 {
            return Err(ConfigError::InvalidValue {
                section: DEFAULT_SECTION,
                key: "ncpu",
                value: "0".to_string(),
                expected: "a positive integer",
            });
        }

        let start = view
            .timestamp(STATION_SECTION, "startTime")?
            .unwrap_or(DateTime::UNIX_EPOCH);
        let end = view.timestamp(STATION_SECTION, "endTime")?.unwrap_or(now);
        let time_range = TimeSpan::new(start, end).map_err(ConfigError::TimeRange)?;

        let station = StationSettings {
            network: view.get_or(STATION_SECTION, "network", "*"),
            station: view.get_or(STATION_SECTION, "station", "*"),
            channel_priority: view.get_or(STATION_SECTION, "channelPriority", "*"),
            time_range,
            network_filter: view
                .get(STATION_SECTION, "networkFilter")
                .map(split_list)
                .unwrap_or_default(),
            chunk_size: view.get_or(STATION_SECTION, "chunkSize", "1"),
        };

        let event = EventSettings {
            min_radius: view.parse(EVENT_SECTION, "minRadius", "a number")?,
            max_radius: view.parse(EVENT_SECTION, "maxRadius", "a number")?,
            min_magnitude: view.parse(EVENT_SECTION, "minMagnitude", "a number")?,
            before_secs: view.parse(EVENT_SECTION, "startTime_sec", "an integer")?,
            after_secs: view.parse(EVENT_SECTION, "endTime_sec", "an integer")?,
        };

        let save = SaveSettings {
            station_info: view.boolean(SAVE_SECTION, "stationInfo")?.unwrap_or(false),
            event_catalog: view.boolean(SAVE_SECTION, "eventCatlog")?.unwrap_or(false),
        };

        let defaults = ClientSettings::default();
        let client = ClientSettings {
            provider: view.get_or(CLIENT_SECTION, "provider", &defaults.provider),
            timeout_secs: view
                .parse(CLIENT_SECTION, "timeout", "a number of seconds")?
                .unwrap_or(defaults.timeout_secs),
            max_retries: view
                .parse(CLIENT_SECTION, "maxRetries", "an integer")?
                .unwrap_or(defaults.max_retries),
            concurrency: view
                .parse::<usize>(CLIENT_SECTION, "concurrency", "a positive integer")?
                .unwrap_or(defaults.concurrency)
                .max(1),
        };

        Ok(Self {
            data_dir: PathBuf::from(view.get_or(DEFAULT_SECTION, "dataDir", ".")),
            ncpu,
            domain,
            station,
            event,
            save,
            client,
        })
    }

    /// Path of the persisted station inventory.
    #[must_use]
    pub fn station_txt_path(&self) -> PathBuf {
        self.data_dir.join("station.txt")
    }

    /// Path of the persisted event catalog.
    #[must_use]
    pub fn event_catalog_path(&self) -> PathBuf {
        self.data_dir.join("evcatalog.xml")
    }
}

/// Section/key lookups with `[DEFAULT]` fallback and case-insensitive keys.
struct IniView<'a>(&'a Ini);

impl IniView<'_> {
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        lookup(self.0, section, key).or_else(|| lookup(self.0, DEFAULT_SECTION, key))
    }

    fn get_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get(section, key)
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    fn parse<T: FromStr>(
        &self,
        section: &'static str,
        key: &'static str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        match self.get(section, key).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    section,
                    key,
                    value: value.to_string(),
                    expected,
                }),
        }
    }

    fn require<T: FromStr>(
        &self,
        section: &'static str,
        key: &'static str,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        self.parse(section, key, expected)?
            .ok_or(ConfigError::MissingKey { section, key })
    }

    fn boolean(&self, section: &'static str, key: &'static str) -> Result<Option<bool>, ConfigError> {
        let Some(value) = self.get(section, key).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(Some(true)),
            "0" | "no" | "false" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                section,
                key,
                value: value.to_string(),
                expected: "a boolean",
            }),
        }
    }

    fn timestamp(
        &self,
        section: &'static str,
        key: &'static str,
    ) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.get(section, key)
            .filter(|v| !v.is_empty())
            .map(parse_timestamp)
            .transpose()
            .map_err(|source: TimeSpanError| ConfigError::Timestamp {
                section,
                key,
                source,
            })
    }
}

fn lookup<'i>(ini: &'i Ini, section: &str, key: &str) -> Option<&'i str> {
    ini.section(Some(section)).and_then(|props| {
        props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim())
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
