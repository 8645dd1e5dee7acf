//! The buyer's resolved location and where it came from.

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// How a [`UserLocation`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationSource {
    /// Loaded from durable storage at the start of the session.
    Cached,
    /// Read from the device sensor during the current resolution attempt.
    Detected,
    /// Typed in by the user; never carries a coordinate.
    Manual,
    /// Nothing else worked; fixed city/area, no coordinate.
    Default,
}

impl LocationSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LocationSource::Cached => "CACHED",
            LocationSource::Detected => "DETECTED",
            LocationSource::Manual => "MANUAL",
            LocationSource::Default => "DEFAULT",
        }
    }
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reference point a feed is ranked against.
///
/// Only constructible through the per-source constructors, so `Detected`
/// always has a coordinate and `Manual`/`Default` never do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLocation {
    coordinate: Option<Coordinate>,
    city: String,
    area: String,
    source: LocationSource,
}

impl UserLocation {
    #[must_use]
    pub fn detected(
        coordinate: Coordinate,
        city: impl Into<String>,
        area: impl Into<String>,
    ) -> Self {
        Self {
            coordinate: Some(coordinate),
            city: city.into(),
            area: area.into(),
            source: LocationSource::Detected,
        }
    }

    /// A previously persisted location. An out-of-range stored coordinate is dropped.
    #[must_use]
    pub fn cached(
        coordinate: Option<Coordinate>,
        city: impl Into<String>,
        area: impl Into<String>,
    ) -> Self {
        Self {
            coordinate: coordinate.filter(Coordinate::is_valid),
            city: city.into(),
            area: area.into(),
            source: LocationSource::Cached,
        }
    }

    #[must_use]
    pub fn manual(city: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            coordinate: None,
            city: city.into(),
            area: area.into(),
            source: LocationSource::Manual,
        }
    }

    #[must_use]
    pub fn fallback(city: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            coordinate: None,
            city: city.into(),
            area: area.into(),
            source: LocationSource::Default,
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    #[must_use]
    pub fn area(&self) -> &str {
        &self.area
    }

    #[must_use]
    pub fn source(&self) -> LocationSource {
        self.source
    }

    /// Distance ranking is only possible with a trustworthy coordinate.
    #[must_use]
    pub fn can_rank(&self) -> bool {
        self.coordinate.is_some_and(|c| c.is_valid())
    }

    /// `"Area, City"` as shown in the location badge.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}, {}", self.area, self.city)
    }
}
