//! Location → listings → ranking → ad slots, as one build.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sandhai_core::{FeedSettings, ListingQuery, ListingRepository, UserLocation};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::FeedError;
use crate::location::{
    LocationEvent, LocationPersistence, LocationSensor, LocationStore, ReverseGeocoder,
};
use crate::proximity::build_feed;
use crate::slots::{inject, FeedSlot};

const EVENT_CAPACITY: usize = 8;

/// Anything that can hand the controller a reference location.
pub trait ResolveLocation: Send + Sync {
    fn resolve(&self) -> impl Future<Output = UserLocation> + Send;
}

impl<S, G, P> ResolveLocation for LocationStore<S, G, P>
where
    S: LocationSensor,
    G: ReverseGeocoder,
    P: LocationPersistence,
{
    async fn resolve(&self) -> UserLocation {
        LocationStore::resolve(self).await
    }
}

/// A location known up front, e.g. coordinates sent with an HTTP request.
impl ResolveLocation for UserLocation {
    async fn resolve(&self) -> UserLocation {
        self.clone()
    }
}

/// Ranking knobs for a single build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedTuning {
    pub radius_km: f64,
    /// Listings between ad placements; `0` turns ads off.
    pub ad_cadence: usize,
    pub fetch_limit: i64,
}

impl FeedTuning {
    #[must_use]
    pub fn from_settings(settings: &FeedSettings) -> Self {
        Self {
            radius_km: settings.radius_km,
            ad_cadence: settings.ad_cadence,
            fetch_limit: settings.fetch_limit,
        }
    }
}

impl Default for FeedTuning {
    fn default() -> Self {
        Self::from_settings(&FeedSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    pub location: UserLocation,
    pub slots: Vec<FeedSlot>,
}

impl Feed {
    #[must_use]
    pub fn listing_count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_ad()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Ready(Feed),
    Unavailable(String),
}

pub struct FeedController<R, L> {
    repository: Arc<R>,
    location: Arc<L>,
    tuning: FeedTuning,
    generation: AtomicU64,
    events: broadcast::Sender<FeedEvent>,
}

impl<R, L> FeedController<R, L>
where
    R: ListingRepository + 'static,
    L: ResolveLocation + 'static,
{
    pub fn new(repository: Arc<R>, location: Arc<L>, tuning: FeedTuning) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            repository,
            location,
            tuning,
            generation: AtomicU64::new(0),
            events,
        }
    }

    #[must_use]
    pub fn tuning(&self) -> FeedTuning {
        self.tuning
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    /// Build with the controller's configured tuning.
    ///
    /// # Errors
    ///
    /// See [`FeedController::build_with`].
    pub async fn build(&self, query: &ListingQuery) -> Result<Feed, FeedError> {
        self.build_with(query, self.tuning).await
    }

    /// Resolve the location, fetch listings, rank them and place ads.
    ///
    /// A query without a limit is capped at `tuning.fetch_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Repository`] if listings cannot be fetched and
    /// [`FeedError::Superseded`] if a newer build started while this one was
    /// waiting. Nothing partial is returned in either case.
    pub async fn build_with(
        &self,
        query: &ListingQuery,
        tuning: FeedTuning,
    ) -> Result<Feed, FeedError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let location = self.location.resolve().await;

        let mut query = query.clone();
        if query.limit.is_none() {
            query.limit = Some(tuning.fetch_limit);
        }

        let fetched = self.repository.fetch_all(&query).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding superseded feed build");
            return Err(FeedError::Superseded);
        }

        let listings = match fetched {
            Ok(listings) => listings,
            Err(e) => {
                tracing::error!(error = %e, "feed unavailable");
                let _ = self.events.send(FeedEvent::Unavailable(e.to_string()));
                return Err(e.into());
            }
        };

        let ranked = build_feed(&listings, &location, tuning.radius_km);
        let feed = Feed {
            slots: inject(ranked, tuning.ad_cadence),
            location,
        };
        tracing::info!(
            fetched = listings.len(),
            shown = feed.listing_count(),
            slots = feed.slots.len(),
            source = %feed.location.source(),
            "feed built"
        );
        let _ = self.events.send(FeedEvent::Ready(feed.clone()));
        Ok(feed)
    }
}

/// Rebuild the feed every time the location changes, until the location
/// channel closes. Results arrive on the controller's event channel.
pub fn watch_location<R, L>(
    controller: Arc<FeedController<R, L>>,
    mut location_events: broadcast::Receiver<LocationEvent>,
    query: ListingQuery,
) -> JoinHandle<()>
where
    R: ListingRepository + 'static,
    L: ResolveLocation + 'static,
{
    tokio::spawn(async move {
        loop {
            match location_events.recv().await {
                Ok(LocationEvent::Changed(_)) => {
                    if let Err(e) = controller.build(&query).await {
                        tracing::debug!(error = %e, "location-triggered rebuild did not complete");
                    }
                }
                Ok(LocationEvent::ManualInputRequested) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "location watcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
