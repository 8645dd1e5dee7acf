//! End-to-end feed builds against in-memory repositories.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sandhai_core::{
    CategoryAttributes, Coordinate, Listing, ListingDraft, ListingQuery, ListingRepository, Place,
    RepositoryError, Seller, UserLocation,
};
use sandhai_feed::location::{MemoryPersistence, PlaceDefaults, ResolvedPlace, Sensor};
use sandhai_feed::{
    watch_location, FeedController, FeedError, FeedEvent, FeedSlot, FeedTuning, GeocodeError,
    LocationStore, StoreSettings,
};
use tokio::sync::Notify;
use uuid::Uuid;

const CHENNAI: (f64, f64) = (13.08, 80.27);
const KM_PER_LAT_DEGREE: f64 = 111.194_926_644_558_7;

fn listing(title: &str, category: &str, km_north: Option<f64>) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: String::new(),
        category: category.to_string(),
        price: Decimal::new(2_500, 0),
        images: vec![],
        coordinate: km_north
            .and_then(|km| Coordinate::new(CHENNAI.0 + km / KM_PER_LAT_DEGREE, CHENNAI.1)),
        place: Place::default(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        seller: Seller {
            name: "Priya".to_string(),
            phone: "+91 98400 12345".to_string(),
            alt_phone: None,
            email: None,
        },
        attributes: CategoryAttributes::default(),
    }
}

fn chennai_user() -> UserLocation {
    UserLocation::detected(
        Coordinate::new(CHENNAI.0, CHENNAI.1).unwrap(),
        "Chennai",
        "Park Town",
    )
}

#[derive(Default)]
struct InMemoryRepo {
    listings: Vec<Listing>,
    queries: Mutex<Vec<ListingQuery>>,
}

impl InMemoryRepo {
    fn with(listings: Vec<Listing>) -> Arc<Self> {
        Arc::new(Self {
            listings,
            queries: Mutex::default(),
        })
    }
}

impl ListingRepository for InMemoryRepo {
    async fn fetch_all(&self, query: &ListingQuery) -> Result<Vec<Listing>, RepositoryError> {
        self.queries.lock().unwrap().push(query.clone());
        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(0);
        let limit = usize::try_from(query.limit.unwrap_or(i64::MAX)).unwrap_or(usize::MAX);
        Ok(self
            .listings
            .iter()
            .filter(|l| query.category.as_ref().is_none_or(|c| &l.category == c))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Listing, RepositoryError> {
        self.listings
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn insert(&self, draft: ListingDraft) -> Result<Listing, RepositoryError> {
        draft.validate()?;
        Err(RepositoryError::Unavailable("read-only".to_string()))
    }
}

struct DownRepo;

impl ListingRepository for DownRepo {
    async fn fetch_all(&self, _query: &ListingQuery) -> Result<Vec<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn fetch_by_id(&self, _id: Uuid) -> Result<Listing, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn insert(&self, _draft: ListingDraft) -> Result<Listing, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

fn titles(slots: &[FeedSlot]) -> Vec<String> {
    slots
        .iter()
        .map(|slot| match slot {
            FeedSlot::Listing(ranked) => ranked.listing.title.clone(),
            FeedSlot::AdPlacement { slot_index } => format!("ad#{slot_index}"),
        })
        .collect()
}

#[tokio::test]
async fn detected_location_ranks_filters_and_places_ads() {
    let repo = InMemoryRepo::with(vec![
        listing("none", "books", None),
        listing("51km", "books", Some(51.0)),
        listing("49km", "books", Some(49.0)),
        listing("0km", "books", Some(0.0)),
        listing("10km", "books", Some(10.0)),
    ]);
    let tuning = FeedTuning {
        radius_km: 50.0,
        ad_cadence: 2,
        fetch_limit: 200,
    };
    let controller = FeedController::new(repo, Arc::new(chennai_user()), tuning);

    let feed = controller.build(&ListingQuery::default()).await.expect("feed");

    assert_eq!(
        titles(&feed.slots),
        vec!["0km", "10km", "ad#1", "49km", "none"]
    );
    assert_eq!(feed.listing_count(), 4);
}

#[tokio::test]
async fn manual_location_keeps_repository_order() {
    let repo = InMemoryRepo::with(vec![
        listing("far", "books", Some(300.0)),
        listing("near", "books", Some(1.0)),
    ]);
    let manual = Arc::new(UserLocation::manual("Madurai", "Anna Nagar"));
    let controller = FeedController::new(repo, manual, FeedTuning::default());

    let feed = controller.build(&ListingQuery::default()).await.expect("feed");

    assert_eq!(titles(&feed.slots), vec!["far", "near"]);
    assert!(feed
        .slots
        .iter()
        .filter_map(FeedSlot::as_listing)
        .all(|r| r.distance_km.is_none()));
}

#[tokio::test]
async fn unlimited_query_is_capped_by_fetch_limit() {
    let repo = InMemoryRepo::with(vec![listing("a", "books", Some(1.0))]);
    let tuning = FeedTuning {
        fetch_limit: 25,
        ..FeedTuning::default()
    };
    let controller = FeedController::new(Arc::clone(&repo), Arc::new(chennai_user()), tuning);

    controller
        .build(&ListingQuery::default().category("books"))
        .await
        .expect("feed");
    controller
        .build(&ListingQuery::default().limit(3))
        .await
        .expect("feed");

    let queries = repo.queries.lock().unwrap().clone();
    assert_eq!(queries[0].limit, Some(25));
    assert_eq!(queries[0].category.as_deref(), Some("books"));
    assert_eq!(queries[1].limit, Some(3));
}

#[tokio::test]
async fn repository_failure_surfaces_and_notifies() {
    let controller = FeedController::new(
        Arc::new(DownRepo),
        Arc::new(chennai_user()),
        FeedTuning::default(),
    );
    let mut events = controller.subscribe();

    let err = controller.build(&ListingQuery::default()).await.unwrap_err();

    assert!(matches!(
        err,
        FeedError::Repository(RepositoryError::Unavailable(_))
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        FeedEvent::Unavailable(reason) if reason.contains("connection refused")
    ));
}

/// First fetch blocks until released; later fetches answer immediately.
struct GatedRepo {
    inner: Arc<InMemoryRepo>,
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
}

impl ListingRepository for GatedRepo {
    async fn fetch_all(&self, query: &ListingQuery) -> Result<Vec<Listing>, RepositoryError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch_all(query).await
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Listing, RepositoryError> {
        self.inner.fetch_by_id(id).await
    }

    async fn insert(&self, draft: ListingDraft) -> Result<Listing, RepositoryError> {
        self.inner.insert(draft).await
    }
}

#[tokio::test]
async fn slower_older_build_is_superseded() {
    let repo = Arc::new(GatedRepo {
        inner: InMemoryRepo::with(vec![listing("a", "books", Some(1.0))]),
        calls: AtomicUsize::new(0),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let controller = Arc::new(FeedController::new(
        Arc::clone(&repo),
        Arc::new(chennai_user()),
        FeedTuning::default(),
    ));

    let older = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.build(&ListingQuery::default()).await }
    });
    repo.entered.notified().await;

    let newer = controller.build(&ListingQuery::default()).await;
    repo.release.notify_one();
    let older = older.await.expect("build task");

    assert!(newer.is_ok());
    assert!(matches!(older, Err(FeedError::Superseded)));
}

struct NoGeocoder;

impl sandhai_feed::location::ReverseGeocoder for NoGeocoder {
    async fn reverse(&self, at: Coordinate) -> Result<ResolvedPlace, GeocodeError> {
        Err(GeocodeError::MissingAddress {
            context: at.to_string(),
        })
    }
}

#[tokio::test]
async fn location_change_triggers_rebuild() {
    let store = Arc::new(LocationStore::new(
        Sensor::Fixed(Coordinate::new(CHENNAI.0, CHENNAI.1).unwrap()),
        NoGeocoder,
        MemoryPersistence::new(),
        StoreSettings {
            sensor_timeout: Duration::from_secs(5),
            defaults: PlaceDefaults::new("Chennai", "City Center"),
        },
    ));
    let repo = InMemoryRepo::with(vec![
        listing("far", "books", Some(300.0)),
        listing("near", "books", Some(1.0)),
    ]);
    let controller = Arc::new(FeedController::new(
        repo,
        Arc::clone(&store),
        FeedTuning::default(),
    ));
    let mut feed_events = controller.subscribe();
    let watcher = watch_location(
        Arc::clone(&controller),
        store.subscribe(),
        ListingQuery::default(),
    );

    store.set_manual("Chennai", "Adyar").await;

    let event = tokio::time::timeout(Duration::from_secs(5), feed_events.recv())
        .await
        .expect("rebuild within deadline")
        .expect("event");
    let FeedEvent::Ready(feed) = event else {
        panic!("expected a ready feed, got {event:?}");
    };
    assert_eq!(feed.location.label(), "Adyar, Chennai");
    assert_eq!(titles(&feed.slots), vec!["far", "near"]);

    watcher.abort();
}
