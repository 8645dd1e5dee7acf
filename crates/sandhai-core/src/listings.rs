//! Listing records and the insert payload sellers submit.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Coordinate;

const MAX_TITLE_CHARS: usize = 200;
/// Prices are stored as `NUMERIC(12, 2)`: two decimals, ten integer digits.
const PRICE_SCALE: u32 = 2;
const PRICE_LIMIT: i64 = 10_000_000_000;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,19}$").expect("valid phone regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub name: String,
    pub phone: String,
    pub alt_phone: Option<String>,
    pub email: Option<String>,
}

/// Free-text place labels the seller attached to the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub city: Option<String>,
    pub area: Option<String>,
}

/// Category-specific details (electronics carry brand/condition, furniture size/material).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAttributes {
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
}

impl CategoryAttributes {
    /// Present attributes keyed by name, for display.
    #[must_use]
    pub fn present(&self) -> BTreeMap<&'static str, &str> {
        [
            ("condition", self.condition.as_deref()),
            ("brand", self.brand.as_deref()),
            ("size", self.size.as_deref()),
            ("material", self.material.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.filter(|s| !s.trim().is_empty()).map(|s| (k, s)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub coordinate: Option<Coordinate>,
    pub place: Place,
    pub created_at: DateTime<Utc>,
    pub seller: Seller,
    pub attributes: CategoryAttributes,
}

/// A listing as submitted by a seller, before the store assigns `id`/`created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub place: Place,
    pub seller: Seller,
    #[serde(default)]
    pub attributes: CategoryAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl ListingDraft {
    /// Check the draft before it is handed to the store.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found: empty or over-long title,
    /// empty category, non-positive price or one with more than two decimals
    /// or ten integer digits, blank image URL, out-of-range
    /// coordinate, missing seller name/phone, or malformed phone/email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return Err(ValidationError::new(
                "title",
                format!("must be between 1 and {MAX_TITLE_CHARS} characters"),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::new("category", "must be non-empty"));
        }
        if self.price <= Decimal::ZERO {
            return Err(ValidationError::new(
                "price",
                format!("must be positive, got {}", self.price),
            ));
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            return Err(ValidationError::new(
                "price",
                format!("at most {PRICE_SCALE} decimal places, got {}", self.price),
            ));
        }
        if self.price >= Decimal::from(PRICE_LIMIT) {
            return Err(ValidationError::new(
                "price",
                format!("must be below {PRICE_LIMIT}, got {}", self.price),
            ));
        }
        if self.images.iter().any(|url| url.trim().is_empty()) {
            return Err(ValidationError::new("images", "image URLs must be non-empty"));
        }
        if let Some(coordinate) = self.coordinate {
            if !coordinate.is_valid() {
                return Err(ValidationError::new(
                    "coordinate",
                    format!("out of range: {coordinate}"),
                ));
            }
        }
        self.validate_seller()
    }

    fn validate_seller(&self) -> Result<(), ValidationError> {
        let seller = &self.seller;
        if seller.name.trim().is_empty() {
            return Err(ValidationError::new("seller.name", "must be non-empty"));
        }
        if seller.phone.trim().is_empty() {
            return Err(ValidationError::new("seller.phone", "must be non-empty"));
        }
        if !PHONE_RE.is_match(seller.phone.trim()) {
            return Err(ValidationError::new(
                "seller.phone",
                format!("'{}' is not a phone number", seller.phone),
            ));
        }
        if let Some(alt) = seller.alt_phone.as_deref().filter(|s| !s.trim().is_empty()) {
            if !PHONE_RE.is_match(alt.trim()) {
                return Err(ValidationError::new(
                    "seller.alt_phone",
                    format!("'{alt}' is not a phone number"),
                ));
            }
        }
        if let Some(email) = seller.email.as_deref().filter(|s| !s.trim().is_empty()) {
            if !EMAIL_RE.is_match(email.trim()) {
                return Err(ValidationError::new(
                    "seller.email",
                    format!("'{email}' is not an email address"),
                ));
            }
        }
        Ok(())
    }
}

/// Filter passed to [`crate::ListingRepository::fetch_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListingQuery {
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}
