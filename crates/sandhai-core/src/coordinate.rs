//! Latitude/longitude value type.

use serde::{Deserialize, Serialize};

/// A point on the Earth's surface in decimal degrees.
///
/// Fields are public so rows read from partially-dirty data can still be
/// represented; callers that need a trustworthy point check [`Coordinate::is_valid`]
/// or construct through [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, returning `None` when either component is non-finite
    /// or outside `[-90, 90]` / `[-180, 180]`.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.is_valid().then_some(coordinate)
    }

    /// Pair two optional components; both must be present and in range.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}
