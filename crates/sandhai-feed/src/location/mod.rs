//! Resolution and persistence of the buyer's location.
//!
//! [`LocationStore`] walks the priority chain (stored record, sensor plus
//! reverse geocode, manual entry, fixed default) and broadcasts every change.
//! Sensor and geocoder calls run outside the state lock; each transition is
//! stamped with the epoch it started from and dropped if another transition
//! committed first.

pub mod geocode;
mod http;
pub mod sensor;
pub mod storage;
pub mod transitions;

use std::time::Duration;

use sandhai_core::{Coordinate, FeedSettings, UserLocation};
use tokio::sync::{broadcast, Mutex};

use crate::error::{LocationError, SensorError, StorageError};

pub use geocode::{NominatimGeocoder, ResolvedPlace, ReverseGeocoder};
pub use sensor::{IpLocator, LocationSensor, Sensor};
pub use storage::{
    JsonFilePersistence, LocationPersistence, MemoryPersistence, StoredLocation, SESSION_KEY,
};
pub use transitions::PlaceDefaults;

const EVENT_CAPACITY: usize = 16;

/// Notifications for whoever renders the location badge.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Changed(UserLocation),
    /// Detection failed during `resolve`; the user should be asked for a city.
    ManualInputRequested,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub sensor_timeout: Duration,
    pub defaults: PlaceDefaults,
}

impl StoreSettings {
    #[must_use]
    pub fn from_feed_settings(settings: &FeedSettings) -> Self {
        Self {
            sensor_timeout: Duration::from_secs(settings.sensor_timeout_secs),
            defaults: PlaceDefaults::new(
                settings.default_city.clone(),
                settings.default_area.clone(),
            ),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_feed_settings(&FeedSettings::default())
    }
}

#[derive(Debug, Default)]
struct State {
    location: Option<UserLocation>,
    epoch: u64,
}

/// Whether a committed transition should be written to durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
    Save,
    Skip,
}

pub struct LocationStore<S, G, P> {
    sensor: S,
    geocoder: G,
    persistence: P,
    settings: StoreSettings,
    state: Mutex<State>,
    events: broadcast::Sender<LocationEvent>,
}

impl<S, G, P> LocationStore<S, G, P>
where
    S: LocationSensor,
    G: ReverseGeocoder,
    P: LocationPersistence,
{
    pub fn new(sensor: S, geocoder: G, persistence: P, settings: StoreSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sensor,
            geocoder,
            persistence,
            settings,
            state: Mutex::new(State::default()),
            events,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.events.subscribe()
    }

    pub async fn current(&self) -> Option<UserLocation> {
        self.state.lock().await.location.clone()
    }

    /// Return the current location, running the priority chain on first use.
    ///
    /// Never fails: when the sensor cannot produce a coordinate the store
    /// settles on the default place and emits
    /// [`LocationEvent::ManualInputRequested`].
    pub async fn resolve(&self) -> UserLocation {
        let epoch = {
            let mut state = self.state.lock().await;
            if let Some(location) = &state.location {
                return location.clone();
            }
            if let Some(cached) = self.load_stored().await {
                tracing::debug!(label = %cached.label(), "using stored location");
                return self.apply(&mut state, cached);
            }
            state.epoch
        };

        let outcome = match self.detect().await {
            Ok(coordinate) => {
                let location = self.locate(coordinate).await;
                self.commit(epoch, location, Persist::Save).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "location detection failed, using default place");
                let fallback = transitions::fallback(&self.settings.defaults);
                let committed = self.commit(epoch, fallback, Persist::Skip).await;
                if committed.is_ok() {
                    let _ = self.events.send(LocationEvent::ManualInputRequested);
                }
                committed
            }
        };

        match outcome {
            Ok(location) => location,
            Err(_) => {
                tracing::debug!("detection superseded during resolve");
                self.current()
                    .await
                    .unwrap_or_else(|| transitions::fallback(&self.settings.defaults))
            }
        }
    }

    /// Force a fresh sensor reading, replacing whatever is stored.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Sensor`] if the sensor fails or times out, in
    /// which case the previous location is kept. Returns
    /// [`LocationError::Superseded`] if another transition committed while the
    /// reading was in flight.
    pub async fn redetect(&self) -> Result<UserLocation, LocationError> {
        let epoch = self.state.lock().await.epoch;
        let coordinate = self.detect().await?;
        if self.state.lock().await.epoch != epoch {
            return Err(LocationError::Superseded);
        }
        let location = self.locate(coordinate).await;
        self.commit(epoch, location, Persist::Save).await
    }

    /// Record a typed-in place. Blank fields fall back to the defaults.
    pub async fn set_manual(&self, city: &str, area: &str) -> UserLocation {
        let location = transitions::manual(city, area, &self.settings.defaults);
        let mut state = self.state.lock().await;
        self.persist(&location).await;
        self.apply(&mut state, location)
    }

    /// Forget the stored location; the next `resolve` starts the chain over.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the stored record could not be removed. The
    /// in-memory state is cleared regardless.
    pub async fn reset(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.location = None;
        state.epoch += 1;
        self.persistence.clear().await
    }

    async fn load_stored(&self) -> Option<UserLocation> {
        match self.persistence.load().await {
            Ok(Some(record)) => Some(transitions::rehydrate(record)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable stored location");
                None
            }
        }
    }

    async fn detect(&self) -> Result<Coordinate, SensorError> {
        let deadline = self.settings.sensor_timeout;
        match tokio::time::timeout(deadline, self.sensor.read()).await {
            Ok(Ok(coordinate)) if coordinate.is_valid() => Ok(coordinate),
            Ok(Ok(coordinate)) => Err(SensorError::Unavailable(format!(
                "sensor reported out-of-range coordinate {coordinate}"
            ))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SensorError::Timeout {
                secs: deadline.as_secs(),
            }),
        }
    }

    async fn locate(&self, coordinate: Coordinate) -> UserLocation {
        let place = match self.geocoder.reverse(coordinate).await {
            Ok(place) => Some(place),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    %coordinate,
                    "reverse geocode failed, using default place names"
                );
                None
            }
        };
        transitions::detected(coordinate, place, &self.settings.defaults)
    }

    async fn commit(
        &self,
        epoch: u64,
        location: UserLocation,
        persist: Persist,
    ) -> Result<UserLocation, LocationError> {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return Err(LocationError::Superseded);
        }
        if persist == Persist::Save {
            self.persist(&location).await;
        }
        Ok(self.apply(&mut state, location))
    }

    async fn persist(&self, location: &UserLocation) {
        if let Err(e) = self.persistence.save(&StoredLocation::from(location)).await {
            tracing::warn!(error = %e, "failed to persist location");
        }
    }

    fn apply(&self, state: &mut State, location: UserLocation) -> UserLocation {
        state.epoch += 1;
        state.location = Some(location.clone());
        tracing::info!(
            source = %location.source(),
            label = %location.label(),
            ranked = location.can_rank(),
            "location updated"
        );
        let _ = self.events.send(LocationEvent::Changed(location.clone()));
        location
    }
}
