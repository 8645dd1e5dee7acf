//! Contract for the store that owns listing records.

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::{Listing, ListingDraft, ListingQuery, ValidationError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("listing not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backing store could not be reached or rejected the query.
    #[error("listing store unavailable: {0}")]
    Unavailable(String),
}

/// Select/filter/insert access to listings.
///
/// `fetch_all` returns listings newest first (`created_at` descending); the
/// proximity ranking relies on that order for ties.
pub trait ListingRepository: Send + Sync {
    fn fetch_all(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Vec<Listing>, RepositoryError>> + Send;

    fn fetch_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Listing, RepositoryError>> + Send;

    fn insert(
        &self,
        draft: ListingDraft,
    ) -> impl Future<Output = Result<Listing, RepositoryError>> + Send;
}
