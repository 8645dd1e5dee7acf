//! Ad placement over an already-ranked feed.

use serde::Serialize;

use crate::proximity::RankedListing;

/// One rendered position in the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedSlot {
    Listing(RankedListing),
    /// Placeholder for an ad unit; `slot_index` counts ads only, from 1.
    AdPlacement { slot_index: usize },
}

impl FeedSlot {
    #[must_use]
    pub fn as_listing(&self) -> Option<&RankedListing> {
        match self {
            FeedSlot::Listing(ranked) => Some(ranked),
            FeedSlot::AdPlacement { .. } => None,
        }
    }

    #[must_use]
    pub fn is_ad(&self) -> bool {
        matches!(self, FeedSlot::AdPlacement { .. })
    }
}

/// Emit every listing in order, with an ad after each `cadence`-th one.
///
/// No ad follows the final listing, so `n` listings yield `(n - 1) / cadence`
/// ads. A cadence of 0 disables ads.
#[must_use]
pub fn inject(ranked: Vec<RankedListing>, cadence: usize) -> Vec<FeedSlot> {
    let total = ranked.len();
    let ads = if cadence == 0 || total == 0 {
        0
    } else {
        (total - 1) / cadence
    };

    let mut slots = Vec::with_capacity(total + ads);
    let mut slot_index = 0;
    for (position, item) in ranked.into_iter().enumerate() {
        slots.push(FeedSlot::Listing(item));
        let shown = position + 1;
        if cadence > 0 && shown % cadence == 0 && shown < total {
            slot_index += 1;
            slots.push(FeedSlot::AdPlacement { slot_index });
        }
    }
    slots
}
