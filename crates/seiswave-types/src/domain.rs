//! Geographic query domain.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A rectangular latitude/longitude bounding box.
///
/// A box whose western boundary lies east of its eastern boundary crosses
/// the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangularDomain {
    /// Southern boundary in degrees.
    pub min_latitude: f64,
    /// Northern boundary in degrees.
    pub max_latitude: f64,
    /// Western boundary in degrees.
    pub min_longitude: f64,
    /// Eastern boundary in degrees.
    pub max_longitude: f64,
}

impl RectangularDomain {
    /// Creates a new domain, validating coordinate ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate is not finite or out of range, or if
    /// the minimum latitude exceeds the maximum.
    pub fn new(
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> Result<Self, DomainError> {
        let coords = [min_latitude, max_latitude, min_longitude, max_longitude];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(DomainError::NotFinite);
        }
        for lat in [min_latitude, max_latitude] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(DomainError::LatitudeOutOfRange(lat));
            }
        }
        for lon in [min_longitude, max_longitude] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(DomainError::LongitudeOutOfRange(lon));
            }
        }
        if min_latitude > max_latitude {
            return Err(DomainError::Inverted {
                axis: "latitude",
                min: min_latitude,
                max: max_latitude,
            });
        }

        Ok(Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        })
    }

    /// Returns true if the box crosses the antimeridian.
    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_longitude > self.max_longitude
    }

    /// Returns the box centroid as `(latitude, longitude)`.
    ///
    /// The longitude is normalized to `[-180, 180]`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        let latitude = (self.max_latitude + self.min_latitude) / 2.0;
        if !self.crosses_antimeridian() {
            return (latitude, (self.max_longitude + self.min_longitude) / 2.0);
        }

        let longitude = (self.min_longitude + self.max_longitude + 360.0) / 2.0;
        (latitude, if longitude > 180.0 { longitude - 360.0 } else { longitude })
    }

    /// Returns true if the point lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let in_longitude = if self.crosses_antimeridian() {
            longitude >= self.min_longitude || longitude <= self.max_longitude
        } else {
            (self.min_longitude..=self.max_longitude).contains(&longitude)
        };
        (self.min_latitude..=self.max_latitude).contains(&latitude) && in_longitude
    }
}

impl std::fmt::Display for RectangularDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lat [{}, {}] lon [{}, {}]",
            self.min_latitude, self.max_latitude, self.min_longitude, self.max_longitude
        )
    }
}

/// Haversine distance between two points in meters.
#[must_use]
pub fn great_circle_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}
