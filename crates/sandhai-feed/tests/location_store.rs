//! Behaviour of `LocationStore` across the priority chain, with fake sensor,
//! geocoder and in-memory persistence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sandhai_core::{Coordinate, LocationSource};
use sandhai_feed::location::{
    LocationSensor, MemoryPersistence, PlaceDefaults, ResolvedPlace, ReverseGeocoder,
};
use sandhai_feed::{
    GeocodeError, LocationError, LocationEvent, LocationStore, SensorError, StoreSettings,
};
use tokio::sync::Notify;

enum Script {
    Fix(Coordinate),
    Fail,
    Hang,
}

struct FakeSensor {
    script: Script,
    reads: AtomicUsize,
}

impl FakeSensor {
    fn new(script: Script) -> Self {
        Self {
            script,
            reads: AtomicUsize::new(0),
        }
    }
}

impl LocationSensor for FakeSensor {
    async fn read(&self) -> Result<Coordinate, SensorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Fix(coordinate) => Ok(*coordinate),
            Script::Fail => Err(SensorError::Unavailable("permission denied".to_string())),
            Script::Hang => std::future::pending().await,
        }
    }
}

struct FakeGeocoder {
    place: Option<ResolvedPlace>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    fn answering(city: &str, area: &str) -> Arc<Self> {
        Arc::new(Self {
            place: Some(ResolvedPlace {
                city: Some(city.to_string()),
                area: Some(area.to_string()),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            place: None,
            calls: AtomicUsize::new(0),
        })
    }
}

impl ReverseGeocoder for FakeGeocoder {
    async fn reverse(&self, at: Coordinate) -> Result<ResolvedPlace, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.place.clone().ok_or_else(|| GeocodeError::MissingAddress {
            context: at.to_string(),
        })
    }
}

fn chennai() -> Coordinate {
    Coordinate::new(13.0827, 80.2707).expect("valid coordinate")
}

fn settings() -> StoreSettings {
    StoreSettings {
        sensor_timeout: Duration::from_secs(5),
        defaults: PlaceDefaults::new("Chennai", "City Center"),
    }
}

type TestStore<S> = LocationStore<S, Arc<FakeGeocoder>, Arc<MemoryPersistence>>;

fn store<S: LocationSensor>(
    sensor: S,
    geocoder: &Arc<FakeGeocoder>,
    storage: &Arc<MemoryPersistence>,
) -> TestStore<S> {
    LocationStore::new(sensor, Arc::clone(geocoder), Arc::clone(storage), settings())
}

#[tokio::test(start_paused = true)]
async fn sensor_timeout_falls_back_to_default_without_geocoding() {
    let sensor = Arc::new(FakeSensor::new(Script::Hang));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = store(Arc::clone(&sensor), &geocoder, &storage);
    let mut events = store.subscribe();

    let location = store.resolve().await;

    assert_eq!(location.source(), LocationSource::Default);
    assert_eq!(location.city(), "Chennai");
    assert_eq!(location.area(), "City Center");
    assert!(location.coordinate().is_none());
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);

    assert_eq!(
        events.try_recv().unwrap(),
        LocationEvent::Changed(location.clone())
    );
    assert_eq!(events.try_recv().unwrap(), LocationEvent::ManualInputRequested);

    // The default place is not written, so the next session tries the sensor again.
    assert!(storage.raw().await.is_none());
}

#[tokio::test]
async fn stored_record_is_returned_as_cached_without_reading_sensor() {
    let sensor = Arc::new(FakeSensor::new(Script::Fix(chennai())));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::with_raw(
        r#"{"latitude":11.0168,"longitude":76.9558,"city":"Coimbatore","area":"RS Puram","source":"DETECTED"}"#,
    ));
    let store = store(Arc::clone(&sensor), &geocoder, &storage);
    let mut events = store.subscribe();

    let location = store.resolve().await;

    assert_eq!(location.source(), LocationSource::Cached);
    assert_eq!(location.city(), "Coimbatore");
    assert_eq!(location.coordinate(), Coordinate::new(11.0168, 76.9558));
    assert_eq!(sensor.reads.load(Ordering::SeqCst), 0);
    assert_eq!(events.try_recv().unwrap(), LocationEvent::Changed(location));
}

#[tokio::test]
async fn corrupt_record_is_ignored_and_detection_runs() {
    let sensor = Arc::new(FakeSensor::new(Script::Fix(chennai())));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::with_raw("{\"latitude\": oops"));
    let store = store(Arc::clone(&sensor), &geocoder, &storage);

    let location = store.resolve().await;

    assert_eq!(location.source(), LocationSource::Detected);
    assert_eq!(location.label(), "Egmore, Chennai");
    assert!(storage.raw().await.unwrap().contains("\"DETECTED\""));
}

#[tokio::test]
async fn geocode_failure_keeps_coordinate_with_default_names() {
    let sensor = Arc::new(FakeSensor::new(Script::Fix(chennai())));
    let geocoder = FakeGeocoder::failing();
    let storage = Arc::new(MemoryPersistence::new());
    let store = store(Arc::clone(&sensor), &geocoder, &storage);

    let location = store.resolve().await;

    assert_eq!(location.source(), LocationSource::Detected);
    assert_eq!(location.coordinate(), Some(chennai()));
    assert_eq!(location.label(), "City Center, Chennai");
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resolve_runs_the_chain_once() {
    let sensor = Arc::new(FakeSensor::new(Script::Fix(chennai())));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = store(Arc::clone(&sensor), &geocoder, &storage);

    let first = store.resolve().await;
    let second = store.resolve().await;

    assert_eq!(first, second);
    assert_eq!(sensor.reads.load(Ordering::SeqCst), 1);
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn manual_entry_clears_coordinate_and_persists() {
    let sensor = Arc::new(FakeSensor::new(Script::Fix(chennai())));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = store(Arc::clone(&sensor), &geocoder, &storage);
    store.resolve().await;

    let location = store.set_manual("Madurai", " ").await;

    assert_eq!(location.source(), LocationSource::Manual);
    assert_eq!(location.label(), "City Center, Madurai");
    assert!(location.coordinate().is_none());
    assert_eq!(store.current().await, Some(location));

    let raw = storage.raw().await.unwrap();
    assert!(raw.contains("\"MANUAL\""));
    assert!(raw.contains("\"latitude\":null"));
}

#[tokio::test]
async fn failed_redetect_keeps_previous_location() {
    let sensor = Arc::new(FakeSensor::new(Script::Fail));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = store(Arc::clone(&sensor), &geocoder, &storage);
    let manual = store.set_manual("Salem", "Fairlands").await;

    let err = store.redetect().await.unwrap_err();

    assert!(matches!(
        err,
        LocationError::Sensor(SensorError::Unavailable(_))
    ));
    assert_eq!(store.current().await, Some(manual));
    assert!(storage.raw().await.unwrap().contains("Fairlands"));
}

#[tokio::test]
async fn successful_redetect_overwrites_manual_entry() {
    let sensor = Arc::new(FakeSensor::new(Script::Fix(chennai())));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = store(Arc::clone(&sensor), &geocoder, &storage);
    store.set_manual("Salem", "Fairlands").await;

    let location = store.redetect().await.expect("redetect");

    assert_eq!(location.source(), LocationSource::Detected);
    assert!(location.can_rank());
    assert!(storage.raw().await.unwrap().contains("Egmore"));
}

#[tokio::test]
async fn reset_forgets_everything() {
    let sensor = Arc::new(FakeSensor::new(Script::Fix(chennai())));
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = store(Arc::clone(&sensor), &geocoder, &storage);
    store.set_manual("Salem", "Fairlands").await;

    store.reset().await.expect("reset");

    assert!(store.current().await.is_none());
    assert!(storage.raw().await.is_none());
    assert_eq!(store.resolve().await.source(), LocationSource::Detected);
    assert_eq!(sensor.reads.load(Ordering::SeqCst), 1);
}

/// Holds the sensor read open until the test lets it finish.
struct GatedSensor {
    entered: Notify,
    release: Notify,
}

impl LocationSensor for GatedSensor {
    async fn read(&self) -> Result<Coordinate, SensorError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(chennai())
    }
}

#[tokio::test]
async fn manual_entry_wins_over_in_flight_detection() {
    let sensor = Arc::new(GatedSensor {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = Arc::new(store(Arc::clone(&sensor), &geocoder, &storage));

    let resolving = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.resolve().await }
    });
    sensor.entered.notified().await;

    let manual = store.set_manual("Trichy", "Srirangam").await;
    sensor.release.notify_one();
    let resolved = resolving.await.expect("resolve task");

    assert_eq!(resolved, manual);
    assert_eq!(store.current().await, Some(manual));
    assert!(storage.raw().await.unwrap().contains("\"MANUAL\""));
}

#[tokio::test]
async fn redetect_overtaken_by_manual_entry_is_superseded() {
    let sensor = Arc::new(GatedSensor {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let geocoder = FakeGeocoder::answering("Chennai", "Egmore");
    let storage = Arc::new(MemoryPersistence::new());
    let store = Arc::new(store(Arc::clone(&sensor), &geocoder, &storage));

    let redetecting = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.redetect().await }
    });
    sensor.entered.notified().await;

    store.set_manual("Trichy", "Srirangam").await;
    sensor.release.notify_one();
    let outcome = redetecting.await.expect("redetect task");

    assert!(matches!(outcome, Err(LocationError::Superseded)));
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        store.current().await.map(|l| l.source()),
        Some(LocationSource::Manual)
    );
}
