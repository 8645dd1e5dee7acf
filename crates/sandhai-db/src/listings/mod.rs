//! Database operations for the `listings` table.

mod read;
mod types;
mod write;

pub use read::{get_listing_by_public_id, list_listings};
pub use types::ListingRow;
pub use write::insert_listing;

/// Column list shared by every `SELECT` and `RETURNING` on `listings`.
pub(crate) const LISTING_COLUMNS: &str = "id, public_id, title, description, category, \
     price, images, latitude, longitude, location_city, location_area, \
     seller_name, seller_phone, seller_alt_phone, seller_email, \
     condition, brand, size, material, created_at";
