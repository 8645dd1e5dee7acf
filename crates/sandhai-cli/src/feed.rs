use std::sync::Arc;

use sandhai_core::{FeedSettings, ListingQuery};
use sandhai_db::PgListingRepository;
use sandhai_feed::{Feed, FeedController, FeedSlot, FeedTuning};
use sqlx::PgPool;

use crate::location::{build_store, describe};
use crate::SensorArgs;

#[derive(Debug, Default)]
pub(crate) struct FeedOverrides {
    pub category: Option<String>,
    pub radius_km: Option<f64>,
    pub cadence: Option<usize>,
}

pub(crate) fn tuning_with(
    settings: &FeedSettings,
    overrides: &FeedOverrides,
) -> anyhow::Result<FeedTuning> {
    let mut tuning = FeedTuning::from_settings(settings);
    if let Some(radius_km) = overrides.radius_km {
        anyhow::ensure!(
            radius_km.is_finite() && radius_km > 0.0,
            "--radius-km must be a positive number, got {radius_km}"
        );
        tuning.radius_km = radius_km;
    }
    if let Some(cadence) = overrides.cadence {
        tuning.ad_cadence = cadence;
    }
    Ok(tuning)
}

pub(crate) async fn run_feed(
    pool: PgPool,
    settings: &FeedSettings,
    sensor: &SensorArgs,
    overrides: FeedOverrides,
) -> anyhow::Result<()> {
    let tuning = tuning_with(settings, &overrides)?;
    let store = Arc::new(build_store(settings, sensor)?);
    let repository = Arc::new(PgListingRepository::new(pool));
    let controller = FeedController::new(repository, store, tuning);

    let mut query = ListingQuery::default();
    if let Some(category) = overrides.category {
        query = query.category(category);
    }

    let feed = controller.build(&query).await?;
    tracing::debug!(
        listings = feed.listing_count(),
        slots = feed.slots.len(),
        "feed built"
    );
    for line in render(&feed, tuning.radius_km) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn render(feed: &Feed, radius_km: f64) -> Vec<String> {
    let mut lines = vec![format!("feed for {}", describe(&feed.location))];
    if feed.location.can_rank() {
        lines.push(format!("within {radius_km} km, nearest first"));
    } else {
        lines.push("newest first (no coordinate to rank by)".to_string());
    }
    if feed.slots.is_empty() {
        lines.push("no listings".to_string());
        return lines;
    }

    let mut position = 0usize;
    for slot in &feed.slots {
        match slot {
            FeedSlot::Listing(ranked) => {
                position += 1;
                let listing = &ranked.listing;
                let distance = ranked
                    .distance_km
                    .map_or_else(|| "?".to_string(), |d| format!("{d:.1} km"));
                lines.push(format!(
                    "{position:>3}. {:<40} Rs {:>10} {:>9}  {}",
                    listing.title, listing.price, distance, listing.category
                ));
            }
            FeedSlot::AdPlacement { slot_index } => {
                lines.push(format!("     --- ad slot {slot_index} ---"));
            }
        }
    }
    lines
}
