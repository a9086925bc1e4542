//! HTTP handlers. Each one performs at most a token refresh plus the upstream
//! reads it needs, then shapes the result into JSON.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use strava_client::{Activity, ActivityQuery, Athlete};
use tracing::{info, warn};

use crate::domains::stats::AthleteStatsResponse;
use crate::domains::{Period, RunSummary, Window, summarize};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const DEFAULT_PER_PAGE: u32 = 30;
/// Largest page size Strava accepts.
pub const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesParams {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub after: Option<i64>,
    pub before: Option<i64>,
    pub runs_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    /// Periods to step back from the anchor date.
    pub offset: Option<u32>,
    /// Anchor date, `YYYY-MM-DD`; defaults to today in the configured zone.
    pub date: Option<String>,
}

pub async fn strava_status() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Strava endpoint working" }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "metrics recorder not installed" })),
        )
            .into_response(),
    }
}

pub async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no route for {}", uri.path()) })),
    )
        .into_response()
}

pub async fn get_athlete(State(state): State<AppState>) -> ApiResult<Json<Athlete>> {
    let athlete = state.client.get_athlete().await?;
    Ok(Json(athlete))
}

pub async fn get_activities(
    State(state): State<AppState>,
    params: Result<Query<ActivitiesParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Activity>>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ApiError::BadRequest(format!(
            "per_page must be between 1 and {MAX_PER_PAGE}"
        )));
    }
    if params.page == Some(0) {
        return Err(ApiError::BadRequest("page starts at 1".into()));
    }

    let query = ActivityQuery {
        before: params.before,
        after: params.after,
        page: params.page,
        per_page: Some(per_page),
    };
    let mut activities = state.client.get_activities(&query).await?;
    if params.runs_only.unwrap_or(false) {
        activities.retain(Activity::is_run);
    }
    info!(count = activities.len(), "fetched activities");
    Ok(Json(activities))
}

pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<AthleteStatsResponse>> {
    let athlete_id = match state.summary.athlete_id {
        Some(id) => id,
        None => state.client.get_athlete().await?.id,
    };
    let stats = state.client.get_athlete_stats(athlete_id).await?;
    Ok(Json(AthleteStatsResponse::new(athlete_id, stats)))
}

pub async fn weekly_summary(
    State(state): State<AppState>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> ApiResult<Json<RunSummary>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    run_summary(&state, Period::Week, params).await.map(Json)
}

pub async fn monthly_summary(
    State(state): State<AppState>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> ApiResult<Json<RunSummary>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    run_summary(&state, Period::Month, params).await.map(Json)
}

async fn run_summary(
    state: &AppState,
    period: Period,
    params: SummaryParams,
) -> ApiResult<RunSummary> {
    let tz = state.summary.timezone;
    let anchor = match params.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiError::BadRequest(format!("invalid date {raw:?}, expected YYYY-MM-DD"))
        })?,
        None => Utc::now().with_timezone(&tz).date_naive(),
    };
    let window = Window::for_period(period, anchor, params.offset.unwrap_or(0))
        .ok_or_else(|| ApiError::BadRequest("date or offset is out of range".into()))?;

    let activities = fetch_window(state, &window).await?;
    let summary = summarize(&activities, &window, state.summary.athlete_weight_kg);
    info!(
        ?period,
        start = %window.start,
        end = %window.end,
        fetched = activities.len(),
        runs = summary.run_count,
        "built run summary"
    );
    Ok(summary)
}

/// Page through the upstream activities covering `window`.
async fn fetch_window(state: &AppState, window: &Window) -> ApiResult<Vec<Activity>> {
    let (after, before) = window.upstream_bounds(&state.summary.timezone);
    let mut activities = Vec::new();
    for page in 1..=state.summary.max_pages {
        let batch = state
            .client
            .get_activities(&ActivityQuery {
                before: Some(before),
                after: Some(after),
                page: Some(page),
                per_page: Some(MAX_PER_PAGE),
            })
            .await?;
        let full_page = batch.len() >= MAX_PER_PAGE as usize;
        activities.extend(batch);
        if !full_page {
            return Ok(activities);
        }
    }
    // every allowed page was full; the next one may still be empty
    warn!(
        max_pages = state.summary.max_pages,
        "activity page cap reached with a full last page; summary may be incomplete"
    );
    Ok(activities)
}
