//! [`ListingRepository`] backed by Postgres.

use sandhai_core::{Listing, ListingDraft, ListingQuery, ListingRepository, RepositoryError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::listings::{get_listing_by_public_id, insert_listing, list_listings};
use crate::DbError;

/// Rows per page when a query names no limit.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Clone)]
pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Clamp a requested page to `1..=MAX_PAGE_SIZE` and a non-negative offset.
#[must_use]
pub fn page_bounds(query: &ListingQuery) -> (i64, i64) {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    (limit, offset)
}

impl ListingRepository for PgListingRepository {
    async fn fetch_all(&self, query: &ListingQuery) -> Result<Vec<Listing>, RepositoryError> {
        let (limit, offset) = page_bounds(query);
        let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
        let rows = list_listings(&self.pool, category, limit, offset)
            .await
            .map_err(|e| RepositoryError::from(DbError::from(e)))?;
        Ok(rows.into_iter().map(Listing::from).collect())
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Listing, RepositoryError> {
        get_listing_by_public_id(&self.pool, id)
            .await
            .map_err(|e| RepositoryError::from(DbError::from(e)))?
            .map(Listing::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn insert(&self, draft: ListingDraft) -> Result<Listing, RepositoryError> {
        draft.validate()?;
        let row = insert_listing(&self.pool, &draft)
            .await
            .map_err(|e| RepositoryError::from(DbError::from(e)))?;
        tracing::info!(listing_id = %row.public_id, category = %row.category, "listing created");
        Ok(row.into())
    }
}
