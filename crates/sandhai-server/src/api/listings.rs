use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sandhai_core::{Listing, ListingDraft, ListingQuery, ListingRepository};
use sandhai_feed::{build_feed, RankedListing};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_repository_error, normalize_limit, radius_or_default, request_location, ApiError,
    ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ListingsParams {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct NearbyParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

fn listing_query(
    category: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ListingQuery {
    ListingQuery {
        category: category.filter(|c| !c.trim().is_empty()),
        limit: Some(normalize_limit(limit)),
        offset: Some(offset.unwrap_or(0).max(0)),
    }
}

pub(super) async fn list_listings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ListingsParams>,
) -> Result<Json<ApiResponse<Vec<Listing>>>, ApiError> {
    let query = listing_query(params.category, params.limit, params.offset);
    let data = state
        .repository()
        .fetch_all(&query)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Listing>>, ApiError> {
    let data = state
        .repository()
        .fetch_by_id(id)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(draft): Json<ListingDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Listing>>), ApiError> {
    let data = state
        .repository()
        .insert(draft)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// Listings ranked by distance from `lat`/`lng`, without ad slots.
///
/// Missing or invalid coordinates return the newest listings unranked.
pub(super) async fn list_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<ApiResponse<Vec<RankedListing>>>, ApiError> {
    let radius_km = radius_or_default(&req_id.0, params.radius_km, &state.feed)?;
    let reference = request_location(params.lat, params.lng, &state.feed);
    let query = listing_query(
        params.category,
        Some(params.limit.unwrap_or(state.feed.fetch_limit)),
        None,
    );

    let listings = state
        .repository()
        .fetch_all(&query)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: build_feed(&listings, &reference, radius_km),
        meta: ResponseMeta::new(req_id.0),
    }))
}
