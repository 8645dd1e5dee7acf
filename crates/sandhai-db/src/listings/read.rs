//! Read operations for the `listings` table.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::ListingRow;
use super::LISTING_COLUMNS;

/// List listings newest first, optionally restricted to one category.
///
/// Distance filtering is not done here; rows come back in `created_at DESC`
/// order (ties broken by `id DESC`) and ranking happens in the feed.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_listings(
    pool: &PgPool,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ListingRow>, sqlx::Error> {
    if let Some(category) = category {
        sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE category = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}

/// Fetch a single listing by its public UUID.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_listing_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await
}
