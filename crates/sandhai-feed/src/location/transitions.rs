//! Pure state transitions for the location priority chain.
//!
//! Nothing here touches the sensor, the network or storage; the store feeds
//! outcomes in and applies whatever comes back.

use sandhai_core::{Coordinate, UserLocation};

use super::geocode::ResolvedPlace;
use super::storage::StoredLocation;

/// City and area used whenever a better name is unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDefaults {
    pub city: String,
    pub area: String,
}

impl PlaceDefaults {
    #[must_use]
    pub fn new(city: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            area: area.into(),
        }
    }
}

/// A fresh sensor fix. Missing place names fall back field by field; the
/// coordinate is kept either way.
pub(crate) fn detected(
    coordinate: Coordinate,
    place: Option<ResolvedPlace>,
    defaults: &PlaceDefaults,
) -> UserLocation {
    let place = place.unwrap_or_default();
    UserLocation::detected(
        coordinate,
        place.city.unwrap_or_else(|| defaults.city.clone()),
        place.area.unwrap_or_else(|| defaults.area.clone()),
    )
}

pub(crate) fn manual(city: &str, area: &str, defaults: &PlaceDefaults) -> UserLocation {
    UserLocation::manual(
        non_blank(city).unwrap_or(defaults.city.as_str()),
        non_blank(area).unwrap_or(defaults.area.as_str()),
    )
}

pub(crate) fn fallback(defaults: &PlaceDefaults) -> UserLocation {
    UserLocation::fallback(defaults.city.clone(), defaults.area.clone())
}

pub(crate) fn rehydrate(record: StoredLocation) -> UserLocation {
    record.into_cached()
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
