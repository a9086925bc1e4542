use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// CORS is the outermost layer so preflight requests and every response,
/// error or not, carry `Access-Control-Allow-Origin: *`.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/strava", get(handlers::strava_status))
        .route("/api/athlete", get(handlers::get_athlete))
        .route("/api/activities", get(handlers::get_activities))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/summary/weekly", get(handlers::weekly_summary))
        .route("/api/summary/monthly", get(handlers::monthly_summary))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(request_timeout, deadline))
        .layer(cors)
        .with_state(state)
}

/// Abort handlers running past `limit` with the usual JSON error body.
async fn deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::Timeout(limit).into_response(),
    }
}
