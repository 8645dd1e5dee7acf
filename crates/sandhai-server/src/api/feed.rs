use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use sandhai_core::ListingQuery;
use sandhai_feed::{Feed, FeedController, FeedError, FeedTuning};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    map_repository_error, radius_or_default, request_location, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct FeedParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub category: Option<String>,
    /// Listings between ads; `0` disables ads.
    pub cadence: Option<usize>,
}

/// The home feed: listings ranked around `lat`/`lng` with ad slots mixed in.
pub(super) async fn get_feed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<FeedParams>,
) -> Result<Json<ApiResponse<Feed>>, ApiError> {
    let mut tuning = FeedTuning::from_settings(&state.feed);
    tuning.radius_km = radius_or_default(&req_id.0, params.radius_km, &state.feed)?;
    if let Some(cadence) = params.cadence {
        tuning.ad_cadence = cadence;
    }

    let location = request_location(params.lat, params.lng, &state.feed);
    let controller = FeedController::new(Arc::new(state.repository()), Arc::new(location), tuning);

    let mut query = ListingQuery::default();
    if let Some(category) = params.category.filter(|c| !c.trim().is_empty()) {
        query = query.category(category);
    }

    let data = controller.build(&query).await.map_err(|e| match e {
        FeedError::Repository(e) => map_repository_error(req_id.0.clone(), &e),
        FeedError::Superseded => {
            ApiError::new(req_id.0.clone(), "internal_error", "feed build superseded")
        }
    })?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
