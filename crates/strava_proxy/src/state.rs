use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use strava_client::StravaClient;

use crate::config::SummarySettings;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn StravaClient>,
    pub summary: SummarySettings,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(client: Arc<dyn StravaClient>, summary: SummarySettings) -> Self {
        Self {
            client,
            summary,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
