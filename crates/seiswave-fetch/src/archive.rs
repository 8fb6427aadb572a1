//! Data archive abstraction and its FDSN implementation.

use async_trait::async_trait;
use bytes::Bytes;
use seiswave_types::{Catalog, Inventory};
use thiserror::Error;

use crate::client::{ClientConfig, DownloadClient, FetchError};
use crate::parse::{ParseError, parse_channels, parse_events, parse_stations};
use crate::query::{EventQuery, Level, StationQuery, WaveformQuery};
use crate::url::FdsnEndpoints;

/// Errors that can occur while querying an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The response could not be parsed.
    #[error("Malformed response: {0}")]
    Parse(#[from] ParseError),

    /// The response is not valid UTF-8 text.
    #[error("Response is not valid UTF-8")]
    Encoding(#[source] std::str::Utf8Error),

    /// The provider name is not known.
    #[error("Unknown data provider: {0}")]
    UnknownProvider(String),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A remote seismic data archive.
///
/// Implementations report "no data" as an empty inventory or catalog, or as
/// `None` for binary payloads.
#[async_trait]
pub trait Archive: Send + Sync + std::fmt::Debug {
    /// Queries station or channel metadata.
    async fn get_stations(&self, query: &StationQuery) -> Result<Inventory, ArchiveError>;

    /// Queries an event catalog.
    async fn get_events(&self, query: &EventQuery) -> Result<Catalog, ArchiveError>;

    /// Fetches miniSEED data for one channel.
    async fn get_waveforms(&self, query: &WaveformQuery) -> Result<Option<Bytes>, ArchiveError>;

    /// Fetches StationXML with full instrument response.
    async fn get_station_xml(&self, query: &StationQuery) -> Result<Option<Bytes>, ArchiveError>;
}

/// [`Archive`] backed by FDSN web services.
#[derive(Debug, Clone)]
pub struct FdsnArchive {
    client: DownloadClient,
    endpoints: FdsnEndpoints,
}

impl FdsnArchive {
    /// Creates an archive from a client and endpoints.
    #[must_use]
    pub const fn new(client: DownloadClient, endpoints: FdsnEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Creates an archive for a provider name or base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown or the HTTP client cannot
    /// be built.
    pub fn connect(provider: &str, config: ClientConfig) -> Result<Self, ArchiveError> {
        let endpoints = FdsnEndpoints::for_provider(provider)
            .ok_or_else(|| ArchiveError::UnknownProvider(provider.to_string()))?;
        let client = DownloadClient::new(config).map_err(ArchiveError::Client)?;
        Ok(Self::new(client, endpoints))
    }

    /// Returns the HTTP client.
    #[must_use]
    pub const fn client(&self) -> &DownloadClient {
        &self.client
    }

    /// Returns the service endpoints.
    #[must_use]
    pub const fn endpoints(&self) -> &FdsnEndpoints {
        &self.endpoints
    }

    async fn get_text(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Option<String>, ArchiveError> {
        let Some(body) = self.client.get(url, params).await? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&body).map_err(ArchiveError::Encoding)?;
        Ok(Some(text.to_string()))
    }
}

#[async_trait]
impl Archive for FdsnArchive {
    async fn get_stations(&self, query: &StationQuery) -> Result<Inventory, ArchiveError> {
        let query = StationQuery {
            level: match query.level {
                Level::Response => Level::Channel,
                level => level,
            },
            ..query.clone()
        };
        tracing::debug!(network = %query.network, level = query.level.as_str(), "querying stations");

        let Some(text) = self.get_text(&self.endpoints.station(), &query.params()).await? else {
            return Ok(Inventory::new());
        };
        let inventory = match query.level {
            Level::Channel => parse_channels(&text)?,
            _ => parse_stations(&text)?,
        };
        Ok(inventory)
    }

    async fn get_events(&self, query: &EventQuery) -> Result<Catalog, ArchiveError> {
        tracing::debug!(span = %query.span, "querying events");
        let Some(text) = self.get_text(&self.endpoints.event(), &query.params()).await? else {
            return Ok(Catalog::new());
        };
        Ok(parse_events(&text)?)
    }

    async fn get_waveforms(&self, query: &WaveformQuery) -> Result<Option<Bytes>, ArchiveError> {
        tracing::debug!(id = %query.id(), span = %query.span, "fetching waveforms");
        Ok(self
            .client
            .get(&self.endpoints.dataselect(), &query.params())
            .await?)
    }

    async fn get_station_xml(&self, query: &StationQuery) -> Result<Option<Bytes>, ArchiveError> {
        let query = StationQuery {
            level: Level::Response,
            ..query.clone()
        };
        Ok(self
            .client
            .get(&self.endpoints.station(), &query.params())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use seiswave_types::{RectangularDomain, TimeSpan};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn archive(server: &MockServer) -> FdsnArchive {
        FdsnArchive::connect(
            &server.uri(),
            ClientConfig {
                max_retries: 0,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn span() -> TimeSpan {
        TimeSpan::new(
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 3, 15, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn station_query(level: Level) -> StationQuery {
        StationQuery {
            network: "IU".to_string(),
            station: "*".to_string(),
            location: "*".to_string(),
            channel: "*".to_string(),
            span: span(),
            domain: RectangularDomain::new(30.0, 40.0, -110.0, -100.0).unwrap(),
            level,
        }
    }

    #[test]
    fn test_unknown_provider() {
        let err = FdsnArchive::connect("ATLANTIS", ClientConfig::default()).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownProvider(p) if p == "ATLANTIS"));
    }

    #[tokio::test]
    async fn test_get_stations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/station/1/query"))
            .and(query_param("level", "station"))
            .and(query_param("format", "text"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "#Network|Station|Latitude|Longitude|Elevation|SiteName|StartTime|EndTime\n\
                 IU|ANMO|34.9459|-106.4572|1850.0|Albuquerque|2002-11-19T21:07:00|\n",
            ))
            .mount(&server)
            .await;

        let inventory = archive(&server)
            .get_stations(&station_query(Level::Station))
            .await
            .unwrap();
        assert_eq!(inventory.station_count(), 1);
    }

    #[tokio::test]
    async fn test_no_data_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let archive = archive(&server);
        let inventory = archive
            .get_stations(&station_query(Level::Channel))
            .await
            .unwrap();
        assert!(inventory.is_empty());

        let query = EventQuery {
            span: span(),
            latitude: 35.0,
            longitude: -105.0,
            min_radius: None,
            max_radius: Some(90.0),
            min_magnitude: None,
        };
        assert!(archive.get_events(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_station_xml_forces_response_level() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fdsnws/station/1/query"))
            .and(query_param("level", "response"))
            .and(query_param("format", "xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<FDSNStationXML/>"))
            .mount(&server)
            .await;

        let xml = archive(&server)
            .get_station_xml(&station_query(Level::Station))
            .await
            .unwrap();
        assert_eq!(xml.as_deref(), Some(&b"<FDSNStationXML/>"[..]));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("IU|ANMO\n"))
            .mount(&server)
            .await;

        let err = archive(&server)
            .get_stations(&station_query(Level::Station))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Parse(_)));
    }
}
