//! Proximity-ranked listing feed: where the buyer is, what is near them, and
//! where the ads go.

pub mod controller;
pub mod error;
pub mod geo;
pub mod location;
pub mod proximity;
pub mod slots;

pub use controller::{watch_location, Feed, FeedController, FeedEvent, FeedTuning, ResolveLocation};
pub use error::{
    ClientBuildError, FeedError, GeocodeError, LocationError, SensorError, StorageError,
};
pub use geo::distance_km;
pub use location::{LocationEvent, LocationStore, StoreSettings};
pub use proximity::{build_feed, RankedListing};
pub use slots::{inject, FeedSlot};
