//! Timestamp parsing helpers for Strava payloads.

/// Parse a Strava timestamp into its wall-clock value.
///
/// `start_date_local` is serialized with a trailing `Z` even though it is not
/// UTC, so the offset is discarded rather than applied.
///
/// Accepts:
/// - RFC3339 datetime -> naive datetime with the offset dropped
/// - Naive datetime YYYY-MM-DDTHH:MM:SS
/// - YYYY-MM-DD -> midnight
pub fn parse_local_timestamp(s: &str) -> Option<chrono::NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt);
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Truncate an upstream body for inclusion in an error message.
pub fn body_snippet(body: &str) -> String {
    body.chars().take(256).collect()
}
