use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid {name}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub reason: String,
}

/// Settings used when building run summaries and stats.
#[derive(Clone, Debug)]
pub struct SummarySettings {
    /// Zone used to decide "today" and local-midnight boundaries.
    pub timezone: Tz,
    pub athlete_weight_kg: f64,
    /// Skips the `/athlete` lookup before fetching stats when set.
    pub athlete_id: Option<i64>,
    /// Upper bound on activity pages fetched for one summary.
    pub max_pages: u32,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            athlete_weight_kg: 70.0,
            athlete_id: None,
            max_pages: 5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub request_timeout: Duration,
    pub summary: SummarySettings,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = SummarySettings::default();

        let address = parse_opt("ADDRESS", get("ADDRESS"))?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
        let timeout_secs: u64 =
            parse_opt("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"))?.unwrap_or(15);
        let timezone: Tz =
            parse_opt("SUMMARY_TIMEZONE", get("SUMMARY_TIMEZONE"))?.unwrap_or(defaults.timezone);
        let athlete_weight_kg: f64 = parse_opt("ATHLETE_WEIGHT_KG", get("ATHLETE_WEIGHT_KG"))?
            .unwrap_or(defaults.athlete_weight_kg);
        let athlete_id: Option<i64> = parse_opt("STRAVA_ATHLETE_ID", get("STRAVA_ATHLETE_ID"))?;
        let max_pages: u32 =
            parse_opt("SUMMARY_MAX_PAGES", get("SUMMARY_MAX_PAGES"))?.unwrap_or(defaults.max_pages);

        if !(athlete_weight_kg.is_finite() && athlete_weight_kg > 0.0) {
            return Err(ConfigError {
                name: "ATHLETE_WEIGHT_KG",
                reason: format!("must be a positive number, got {athlete_weight_kg}"),
            });
        }
        if max_pages == 0 {
            return Err(ConfigError {
                name: "SUMMARY_MAX_PAGES",
                reason: "must be at least 1".into(),
            });
        }
        if timeout_secs == 0 {
            return Err(ConfigError {
                name: "REQUEST_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            address,
            request_timeout: Duration::from_secs(timeout_secs),
            summary: SummarySettings {
                timezone,
                athlete_weight_kg,
                athlete_id,
                max_pages,
            },
        })
    }
}

/// Parse an optional variable; blank values count as unset.
fn parse_opt<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| ConfigError {
                name,
                reason: format!("{v:?}: {e}"),
            })
        })
        .transpose()
}
