use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use strava_client::Activity;

use super::period::{Period, Window};

/// Placeholder for metrics that cannot be computed, e.g. pace over zero distance.
pub const NOT_AVAILABLE: &str = "N/A";

/// Running energy cost per kilogram of body mass per kilometre.
const KCAL_PER_KG_KM: f64 = 1.036;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyDistance {
    pub date: String,
    pub distance_km: f64,
    pub runs: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub period: Period,
    pub start_date: String,
    pub end_date: String,
    pub run_count: usize,
    pub total_distance_km: f64,
    pub total_moving_time_seconds: u64,
    pub total_moving_time: String,
    pub total_elevation_gain_m: f64,
    pub average_pace: String,
    pub average_pace_seconds_per_km: Option<f64>,
    pub longest_run_km: f64,
    pub longest_run_name: Option<String>,
    pub estimated_calories: u64,
    pub daily_distance_km: Vec<DailyDistance>,
}

/// Aggregate the runs among `activities` that started inside `window`.
///
/// Non-run activities and activities without a parsable local start time are
/// ignored. An empty selection produces zeroed totals and `"N/A"` pace.
pub fn summarize(activities: &[Activity], window: &Window, weight_kg: f64) -> RunSummary {
    let runs: Vec<(NaiveDate, &Activity)> = activities
        .iter()
        .filter(|a| a.is_run())
        .filter_map(|a| a.start_local().map(|start| (start.date(), a)))
        .filter(|(day, _)| window.contains(*day))
        .collect();

    let total_distance_m: f64 = runs.iter().map(|(_, a)| a.distance).sum();
    let total_moving_time: u64 = runs.iter().map(|(_, a)| a.moving_time).sum();
    let total_elevation_gain: f64 = runs.iter().map(|(_, a)| a.total_elevation_gain).sum();
    let calories: f64 = runs
        .iter()
        .map(|(_, a)| estimate_calories(a, weight_kg))
        .sum();
    let longest = runs
        .iter()
        .map(|(_, a)| *a)
        .max_by(|a, b| a.distance.total_cmp(&b.distance));
    let pace = seconds_per_km(total_moving_time, total_distance_m);

    let mut per_day: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for (day, a) in &runs {
        let entry = per_day.entry(*day).or_default();
        entry.0 += a.distance;
        entry.1 += 1;
    }
    let daily_distance_km = window
        .days()
        .map(|day| {
            let (metres, count) = per_day.get(&day).copied().unwrap_or_default();
            DailyDistance {
                date: day.to_string(),
                distance_km: round2(metres / 1000.0),
                runs: count,
            }
        })
        .collect();

    RunSummary {
        period: window.period,
        start_date: window.start.to_string(),
        end_date: window.end.to_string(),
        run_count: runs.len(),
        total_distance_km: round2(total_distance_m / 1000.0),
        total_moving_time_seconds: total_moving_time,
        total_moving_time: format_duration(total_moving_time),
        total_elevation_gain_m: round2(total_elevation_gain),
        average_pace: format_pace(pace),
        average_pace_seconds_per_km: pace.map(round2),
        longest_run_km: longest.map_or(0.0, |a| round2(a.distance / 1000.0)),
        longest_run_name: longest.and_then(|a| a.name.clone()),
        estimated_calories: calories.round() as u64,
        daily_distance_km,
    }
}

/// Strava reports mechanical work in kilojoules, which it treats as roughly
/// equal to kilocalories burned. Runs rarely carry it, so fall back to a
/// distance and body-mass estimate.
pub fn estimate_calories(activity: &Activity, weight_kg: f64) -> f64 {
    match activity.kilojoules {
        Some(kj) if kj > 0.0 => kj,
        _ => activity.distance / 1000.0 * weight_kg * KCAL_PER_KG_KM,
    }
}

pub fn seconds_per_km(moving_time_secs: u64, distance_m: f64) -> Option<f64> {
    if moving_time_secs == 0 || distance_m <= 0.0 {
        return None;
    }
    Some(moving_time_secs as f64 / (distance_m / 1000.0))
}

/// `m:ss /km`, or `"N/A"`.
pub fn format_pace(seconds_per_km: Option<f64>) -> String {
    let Some(spk) = seconds_per_km.filter(|s| s.is_finite() && *s > 0.0) else {
        return NOT_AVAILABLE.to_string();
    };
    let total = spk.round() as u64;
    format!("{}:{:02} /km", total / 60, total % 60)
}

/// `h:mm:ss`
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
