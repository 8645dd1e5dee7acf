mod feed;
mod listings;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use sandhai_core::{Coordinate, FeedSettings, RepositoryError, UserLocation};
use sandhai_db::PgListingRepository;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub feed: Arc<FeedSettings>,
}

impl AppState {
    pub(super) fn repository(&self) -> PgListingRepository {
        PgListingRepository::new(self.pool.clone())
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_repository_error(request_id: String, error: &RepositoryError) -> ApiError {
    match error {
        RepositoryError::NotFound => ApiError::new(request_id, "not_found", "listing not found"),
        RepositoryError::Validation(e) => ApiError::new(
            request_id,
            "validation_error",
            format!("{}: {}", e.field, e.reason),
        ),
        RepositoryError::Unavailable(reason) => {
            tracing::error!(error = %reason, "listing store unavailable");
            ApiError::new(request_id, "service_unavailable", "listings are unavailable")
        }
    }
}

/// `radius_km` from a query string, or the configured default. Must be a
/// positive finite number.
pub(super) fn radius_or_default(
    request_id: &str,
    radius_km: Option<f64>,
    settings: &FeedSettings,
) -> Result<f64, ApiError> {
    match radius_km {
        None => Ok(settings.radius_km),
        Some(r) if r.is_finite() && r > 0.0 => Ok(r),
        Some(r) => Err(ApiError::new(
            request_id,
            "validation_error",
            format!("radius_km must be a positive number, got {r}"),
        )),
    }
}

/// The reference point for a request: `lat`/`lng` when both are present and
/// in range, otherwise the default place with no coordinate (no ranking).
pub(super) fn request_location(
    lat: Option<f64>,
    lng: Option<f64>,
    settings: &FeedSettings,
) -> UserLocation {
    match Coordinate::from_parts(lat, lng) {
        Some(coordinate) => UserLocation::detected(
            coordinate,
            settings.default_city.clone(),
            settings.default_area.clone(),
        ),
        None => UserLocation::fallback(
            settings.default_city.clone(),
            settings.default_area.clone(),
        ),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn api_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route("/api/v1/listings/nearby", get(listings::list_nearby))
        .route("/api/v1/listings/{id}", get(listings::get_listing))
        .route("/api/v1/feed", get(feed::get_feed))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match sandhai_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
