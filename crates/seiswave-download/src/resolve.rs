//! Inventory and event catalog resolution.

use seiswave_config::Settings;
use seiswave_fetch::{Archive, EventQuery, Level, StationQuery};
use seiswave_format::{QuakeMlFormatter, StationTextFormatter, persist};
use seiswave_types::{Catalog, Inventory};

use crate::RunError;

/// Queries the station inventory and drops excluded networks.
///
/// The query uses the configured network, station and channel patterns,
/// the global time range and the bounding box. When `stationInfo` is set,
/// the filtered inventory is written to `<dataDir>/station.txt`.
///
/// # Errors
///
/// Returns an error if the query fails or the inventory cannot be written.
pub async fn get_station(archive: &dyn Archive, settings: &Settings) -> Result<Inventory, RunError> {
    let query = StationQuery {
        network: settings.station.network.clone(),
        station: settings.station.station.clone(),
        location: "*".to_string(),
        channel: settings.station.channel_priority.clone(),
        span: settings.station.time_range,
        domain: settings.domain,
        level: Level::Station,
    };
    let mut inventory = archive.get_stations(&query).await?;

    for code in &settings.station.network_filter {
        let removed = inventory.remove_network(code);
        if removed > 0 {
            tracing::debug!(network = %code, stations = removed, "excluded network");
        }
    }

    tracing::info!(
        networks = inventory.len(),
        stations = inventory.station_count(),
        "resolved station inventory"
    );

    if settings.save.station_info {
        let path = settings.station_txt_path();
        persist(&StationTextFormatter::new(), &inventory, &path)?;
        tracing::info!(path = %path.display(), "saved station inventory");
    }

    Ok(inventory)
}

/// Queries events within a radius band around the domain center.
///
/// Every returned event is tagged as not downloaded. When `eventCatlog` is
/// set, the catalog is written to `<dataDir>/evcatalog.xml` before any
/// waveform is requested.
///
/// # Errors
///
/// Returns an error if the query fails or the catalog cannot be written.
pub async fn get_event_radius(
    archive: &dyn Archive,
    min_radius: Option<f64>,
    max_radius: Option<f64>,
    min_magnitude: Option<f64>,
    settings: &Settings,
) -> Result<Catalog, RunError> {
    let (latitude, longitude) = settings.domain.center();
    let query = EventQuery {
        span: settings.station.time_range,
        latitude,
        longitude,
        min_radius,
        max_radius,
        min_magnitude,
    };
    let mut catalog = archive.get_events(&query).await?;
    catalog.tag_all(false);

    tracing::info!(events = catalog.len(), latitude, longitude, "resolved event catalog");

    if settings.save.event_catalog {
        let path = settings.event_catalog_path();
        persist(&QuakeMlFormatter::new(), &catalog, &path)?;
        tracing::info!(path = %path.display(), "saved event catalog");
    }

    Ok(catalog)
}
