use serde::Serialize;
use strava_client::{ActivityStats, ActivityTotal};

use super::summary::{format_duration, format_pace, round2, seconds_per_km};

/// Run totals converted to kilometres with a derived pace.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunTotalsView {
    pub count: u32,
    pub distance_km: f64,
    pub moving_time_seconds: u64,
    pub moving_time: String,
    pub elevation_gain_m: f64,
    pub average_pace: String,
}

impl From<&ActivityTotal> for RunTotalsView {
    fn from(total: &ActivityTotal) -> Self {
        Self {
            count: total.count,
            distance_km: round2(total.distance / 1000.0),
            moving_time_seconds: total.moving_time,
            moving_time: format_duration(total.moving_time),
            elevation_gain_m: round2(total.elevation_gain),
            average_pace: format_pace(seconds_per_km(total.moving_time, total.distance)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteStatsResponse {
    pub athlete_id: i64,
    pub recent_runs: RunTotalsView,
    pub ytd_runs: RunTotalsView,
    pub all_runs: RunTotalsView,
    pub stats: ActivityStats,
}

impl AthleteStatsResponse {
    pub fn new(athlete_id: i64, stats: ActivityStats) -> Self {
        Self {
            athlete_id,
            recent_runs: RunTotalsView::from(&stats.recent_run_totals),
            ytd_runs: RunTotalsView::from(&stats.ytd_run_totals),
            all_runs: RunTotalsView::from(&stats.all_run_totals),
            stats,
        }
    }
}
