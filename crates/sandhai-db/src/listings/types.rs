//! Row types for the `listings` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sandhai_core::{CategoryAttributes, Coordinate, Listing, Place, Seller};
use uuid::Uuid;

/// A row from the `listings` table.
///
/// `latitude`/`longitude` are read as stored; a pair that does not form a
/// valid coordinate becomes `None` on conversion.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_city: Option<String>,
    pub location_area: Option<String>,
    pub seller_name: String,
    pub seller_phone: String,
    pub seller_alt_phone: Option<String>,
    pub seller_email: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: row.public_id,
            title: row.title,
            description: row.description,
            category: row.category,
            price: row.price,
            images: row.images,
            coordinate: Coordinate::from_parts(row.latitude, row.longitude),
            place: Place {
                city: row.location_city,
                area: row.location_area,
            },
            created_at: row.created_at,
            seller: Seller {
                name: row.seller_name,
                phone: row.seller_phone,
                alt_phone: row.seller_alt_phone,
                email: row.seller_email,
            },
            attributes: CategoryAttributes {
                condition: row.condition,
                brand: row.brand,
                size: row.size,
                material: row.material,
            },
        }
    }
}
