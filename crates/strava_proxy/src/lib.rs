//! HTTP proxy over the Strava API that also serves weekly and monthly
//! running summaries.

pub mod app;
pub mod config;
pub mod domains;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::router;
pub use config::{ConfigError, ServerConfig, SummarySettings};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
