//! Write operations for the `listings` table.

use sandhai_core::ListingDraft;
use sqlx::PgExecutor;

use super::types::ListingRow;
use super::LISTING_COLUMNS;

/// Insert a listing and return the stored row.
///
/// The draft is expected to have passed [`ListingDraft::validate`]; table
/// constraints reject anything that slips through.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the insert fails.
pub async fn insert_listing<'e, E>(
    executor: E,
    draft: &ListingDraft,
) -> Result<ListingRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let coordinate = draft.coordinate;
    sqlx::query_as::<_, ListingRow>(&format!(
        "INSERT INTO listings \
             (title, description, category, price, images, latitude, longitude, \
              location_city, location_area, seller_name, seller_phone, seller_alt_phone, \
              seller_email, condition, brand, size, material) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
         RETURNING {LISTING_COLUMNS}"
    ))
    .bind(draft.title.trim())
    .bind(&draft.description)
    .bind(draft.category.trim())
    .bind(draft.price)
    .bind(&draft.images)
    .bind(coordinate.map(|c| c.latitude))
    .bind(coordinate.map(|c| c.longitude))
    .bind(&draft.place.city)
    .bind(&draft.place.area)
    .bind(draft.seller.name.trim())
    .bind(draft.seller.phone.trim())
    .bind(blank_to_none(draft.seller.alt_phone.as_deref()))
    .bind(blank_to_none(draft.seller.email.as_deref()))
    .bind(&draft.attributes.condition)
    .bind(&draft.attributes.brand)
    .bind(&draft.attributes.size)
    .bind(&draft.attributes.material)
    .fetch_one(executor)
    .await
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
