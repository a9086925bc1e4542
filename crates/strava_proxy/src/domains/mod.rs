//! Domain modules holding the aggregation logic behind the HTTP handlers.
//!
//! # Modules
//!
//! - [`period`]: Monday–Sunday week and calendar month windows
//! - [`summary`]: Run summaries (distance, pace, longest run, calories)
//! - [`stats`]: Views over Strava's aggregate athlete stats

pub mod period;
pub mod stats;
pub mod summary;

pub use period::{Period, Window};
pub use summary::{NOT_AVAILABLE, RunSummary, summarize};
