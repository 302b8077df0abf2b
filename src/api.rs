use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::content::types::PageQuery;
use crate::content::{BlogPage, ContentAggregator};
use crate::geo::Coordinates;
use crate::proximity::types::{
    with_placeholder_products, FallbackLocation, LocationQuery, RankedManufacturers,
};
use crate::proximity::{NearbyRequest, ProximityMatcher};

#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<ProximityMatcher>,
    pub content: Arc<ContentAggregator>,
    pub default_page_size: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/manufacturers/nearby", post(nearby))
        .route("/blog/posts", get(blog_posts))
        .route("/admin/content-source/refresh", post(refresh_content_source))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Unexpected failures only; degraded results are normal 200 responses.
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "something went wrong, please try again" })),
        )
            .into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct NearbyReq {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

async fn nearby(
    State(state): State<AppState>,
    Json(body): Json<NearbyReq>,
) -> Result<Json<RankedManufacturers>, ApiError> {
    // Out-of-range coordinates are treated as absent so the locality hints survive.
    let precise = match (body.latitude, body.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)).filter(Coordinates::is_valid),
        _ => None,
    };
    let query = match precise {
        Some(c) => LocationQuery::Precise(c),
        None => LocationQuery::Fallback(FallbackLocation {
            city: body.city,
            district: body.district,
            state: body.state,
        }),
    };
    let mut ranked = state
        .matcher
        .find_nearby(NearbyRequest::from(query))
        .await?;
    ranked.manufacturers = with_placeholder_products(ranked.manufacturers);
    Ok(Json(ranked))
}

#[derive(Debug, Deserialize)]
struct PostsParams {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
    #[serde(default)]
    label: Option<String>,
}

async fn blog_posts(
    State(state): State<AppState>,
    Query(q): Query<PostsParams>,
) -> Result<Json<BlogPage>, ApiError> {
    let query = PageQuery::new(
        q.page.unwrap_or(1),
        q.per_page.unwrap_or(state.default_page_size).min(500),
        q.label,
    );
    let page = state.content.fetch_posts(query).await?;
    Ok(Json(page))
}

#[derive(Serialize)]
struct RefreshResp {
    loaded: bool,
    blog_id: String,
}

async fn refresh_content_source(State(state): State<AppState>) -> Json<RefreshResp> {
    let loaded = state.content.refresh().await;
    Json(RefreshResp {
        loaded,
        blog_id: state.content.source().blog_id,
    })
}
