//! Typed models and a minimal `StravaClient` trait for the Strava v3 API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod utils;

/// Sport types counted as runs when building summaries.
pub const RUN_SPORT_TYPES: &[&str] = &["Run", "TrailRun", "VirtualRun"];

#[derive(Debug, Error)]
pub enum StravaError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("Strava API returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Athlete {
    pub id: i64,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub sex: Option<String>,
    pub premium: Option<bool>,
    pub profile: Option<String>,
    pub weight: Option<f64>,
    pub created_at: Option<String>,
}

/// A Strava "summary activity" as returned by `/athlete/activities`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Activity {
    pub id: i64,
    pub name: Option<String>,
    /// Metres.
    #[serde(default)]
    pub distance: f64,
    /// Seconds.
    #[serde(default)]
    pub moving_time: u64,
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub total_elevation_gain: f64,
    pub sport_type: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub start_date: Option<String>,
    pub start_date_local: Option<String>,
    pub timezone: Option<String>,
    /// Metres per second.
    pub average_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub kilojoules: Option<f64>,
}

impl Activity {
    pub fn is_run(&self) -> bool {
        self.sport_type
            .as_deref()
            .or(self.activity_type.as_deref())
            .is_some_and(|s| RUN_SPORT_TYPES.contains(&s))
    }

    /// Wall-clock start time in the athlete's own time zone.
    pub fn start_local(&self) -> Option<chrono::NaiveDateTime> {
        self.start_date_local
            .as_deref()
            .and_then(utils::parse_local_timestamp)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ActivityTotal {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: u64,
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub elevation_gain: f64,
    pub achievement_count: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ActivityStats {
    pub biggest_ride_distance: Option<f64>,
    pub biggest_climb_elevation_gain: Option<f64>,
    pub recent_ride_totals: ActivityTotal,
    pub recent_run_totals: ActivityTotal,
    pub recent_swim_totals: ActivityTotal,
    pub ytd_ride_totals: ActivityTotal,
    pub ytd_run_totals: ActivityTotal,
    pub ytd_swim_totals: ActivityTotal,
    pub all_ride_totals: ActivityTotal,
    pub all_run_totals: ActivityTotal,
    pub all_swim_totals: ActivityTotal,
}

/// Matches Strava's OAuth token response.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
    pub expires_at: i64,
    pub expires_in: i64,
    pub refresh_token: String,
}

/// Query parameters accepted by `/athlete/activities`.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ActivityQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

#[async_trait]
pub trait StravaClient: Send + Sync + 'static {
    /// Exchange the refresh token for a fresh access token, bypassing any cache.
    async fn refresh_access_token(&self) -> Result<TokenResponse, StravaError>;
    async fn get_athlete(&self) -> Result<Athlete, StravaError>;
    async fn get_activities(&self, query: &ActivityQuery) -> Result<Vec<Activity>, StravaError>;
    async fn get_athlete_stats(&self, athlete_id: i64) -> Result<ActivityStats, StravaError>;
}
