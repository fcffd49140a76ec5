//! Great-circle geometry on a spherical Earth.
//!
//! Every distance the engine reasons about (progress, arrival, ETA) comes
//! from [`haversine_km`]. Coordinate-space arithmetic is only ever used to
//! pick a stepping direction, never to measure.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in [-90, 90]
    pub lat: f64,

    /// Longitude in [-180, 180]
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting values outside the valid ranges.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        let coord = Self { lat, lng };
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lng })
        }
    }

    /// Returns true if both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_km(*self, *other)
    }
}

/// Haversine great-circle distance between two coordinates, in kilometres.
///
/// Symmetric and exactly zero for coincident points.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push near-antipodal points just past 1.0
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
