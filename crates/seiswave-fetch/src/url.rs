//! FDSN web-service URL construction.

use chrono::{DateTime, Utc};

/// Known FDSN data centers and their base URLs.
pub const PROVIDERS: &[(&str, &str)] = &[
    ("IRIS", "https://service.iris.edu"),
    ("EARTHSCOPE", "https://service.iris.edu"),
    ("GEOFON", "https://geofon.gfz-potsdam.de"),
    ("GFZ", "https://geofon.gfz-potsdam.de"),
    ("ORFEUS", "https://www.orfeus-eu.org"),
    ("NCEDC", "https://service.ncedc.org"),
    ("SCEDC", "https://service.scedc.caltech.edu"),
    ("USGS", "https://earthquake.usgs.gov"),
];

/// Base URLs of the FDSN services of one data center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdsnEndpoints {
    base: String,
}

impl FdsnEndpoints {
    /// Creates endpoints rooted at the given base URL.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves a provider name (case-insensitive) or an `http(s)://` base URL.
    ///
    /// # Example
    ///
    /// ```
    /// use seiswave_fetch::url::FdsnEndpoints;
    ///
    /// let iris = FdsnEndpoints::for_provider("iris").unwrap();
    /// assert_eq!(iris.station(), "https://service.iris.edu/fdsnws/station/1/query");
    /// ```
    #[must_use]
    pub fn for_provider(provider: &str) -> Option<Self> {
        let provider = provider.trim();
        if provider.starts_with("http://") || provider.starts_with("https://") {
            return Some(Self::new(provider));
        }
        PROVIDERS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider))
            .map(|(_, url)| Self::new(*url))
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the `fdsnws-station` query URL.
    #[must_use]
    pub fn station(&self) -> String {
        format!("{}/fdsnws/station/1/query", self.base)
    }

    /// Returns the `fdsnws-event` query URL.
    #[must_use]
    pub fn event(&self) -> String {
        format!("{}/fdsnws/event/1/query", self.base)
    }

    /// Returns the `fdsnws-dataselect` query URL.
    #[must_use]
    pub fn dataselect(&self) -> String {
        format!("{}/fdsnws/dataselect/1/query", self.base)
    }
}

/// Formats a timestamp the way FDSN services expect it.
#[must_use]
pub fn fdsn_time(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Formats a location code for a query; FDSN spells the empty code `--`.
#[must_use]
pub fn fdsn_location(location: &str) -> &str {
    if location.trim().is_empty() { "--" } else { location }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_provider_lookup() {
        let geofon = FdsnEndpoints::for_provider("GEOFON").unwrap();
        assert_eq!(
            geofon.dataselect(),
            "https://geofon.gfz-potsdam.de/fdsnws/dataselect/1/query"
        );
        assert!(FdsnEndpoints::for_provider("NOWHERE").is_none());
    }

    #[test]
    fn test_custom_base_url() {
        let local = FdsnEndpoints::for_provider("http://localhost:8080/").unwrap();
        assert_eq!(local.base(), "http://localhost:8080");
        assert_eq!(local.event(), "http://localhost:8080/fdsnws/event/1/query");
    }

    #[test]
    fn test_fdsn_time() {
        let t = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(fdsn_time(t), "2020-01-02T03:04:05.000000");
    }

    #[test]
    fn test_fdsn_location() {
        assert_eq!(fdsn_location(""), "--");
        assert_eq!(fdsn_location("00"), "00");
    }
}
