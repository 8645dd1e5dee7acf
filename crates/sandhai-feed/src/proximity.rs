//! Radius filter and distance ranking over a listing snapshot.

use std::cmp::Ordering;

use sandhai_core::{Coordinate, Listing, UserLocation};
use serde::Serialize;

use crate::geo::distance_km;

/// A listing paired with its distance from the buyer, when both ends are known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedListing {
    pub listing: Listing,
    pub distance_km: Option<f64>,
}

/// Turn a repository snapshot into a distance-bounded, distance-sorted feed.
///
/// Without a usable reference coordinate the snapshot is returned as-is, in
/// repository order, with no distances. Otherwise listings farther than
/// `radius_km` are dropped; listings whose own coordinate is missing or out of
/// range are kept with an unknown distance and sorted after every known one.
/// The sort is stable, so ties keep repository order.
#[must_use]
pub fn build_feed(
    listings: &[Listing],
    reference: &UserLocation,
    radius_km: f64,
) -> Vec<RankedListing> {
    let Some(origin) = reference.coordinate().filter(Coordinate::is_valid) else {
        return listings
            .iter()
            .map(|listing| RankedListing {
                listing: listing.clone(),
                distance_km: None,
            })
            .collect();
    };

    let mut ranked: Vec<RankedListing> = listings
        .iter()
        .filter_map(|listing| {
            let distance = listing
                .coordinate
                .filter(Coordinate::is_valid)
                .map(|point| distance_km(origin, point));
            match distance {
                Some(d) if d > radius_km => None,
                _ => Some(RankedListing {
                    listing: listing.clone(),
                    distance_km: distance,
                }),
            }
        })
        .collect();

    ranked.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km));
    ranked
}

/// Known distances ascending, unknown last.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
