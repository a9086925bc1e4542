//! HTTP client implementation for the Strava v3 API.
//!
//! This module provides a reqwest-based implementation of the [`StravaClient`](crate::StravaClient) trait.
//! Access tokens are obtained through the OAuth refresh-token grant and cached
//! until they are close to expiry.

use crate::config::Config;
use crate::utils::body_snippet;
use crate::{
    Activity, ActivityQuery, ActivityStats, Athlete, StravaClient, StravaError, TokenResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tokens closer than this to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Debug)]
struct CachedToken {
    access_token: SecretString,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - now >= REFRESH_MARGIN_SECS
    }
}

#[derive(Debug)]
struct TokenState {
    access: Option<CachedToken>,
    /// Strava may rotate the refresh token on every exchange.
    refresh_token: SecretString,
}

impl TokenState {
    fn store(&mut self, token: &TokenResponse) {
        self.access = Some(CachedToken {
            access_token: SecretString::new(token.access_token.clone().into()),
            expires_at: token.expires_at,
        });
        if !token.refresh_token.is_empty() {
            self.refresh_token = SecretString::new(token.refresh_token.clone().into());
        }
    }
}

/// Client for the Strava API using reqwest.
///
/// Clones share the same token cache.
#[derive(Clone, Debug)]
pub struct ReqwestStravaClient {
    config: Config,
    client: reqwest::Client,
    tokens: Arc<Mutex<TokenState>>,
}

impl ReqwestStravaClient {
    pub fn new(config: Config) -> Result<Self, StravaError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("strava_client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let tokens = TokenState {
            access: None,
            refresh_token: config.refresh_token.clone(),
        };
        Ok(Self {
            config,
            client,
            tokens: Arc::new(Mutex::new(tokens)),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Return a usable access token, refreshing it when missing or about to expire.
    ///
    /// The lock is held across the refresh so concurrent callers wait for a
    /// single exchange instead of racing their own.
    async fn access_token(&self) -> Result<SecretString, StravaError> {
        self.config.require_credentials()?;
        let mut state = self.tokens.lock().await;
        let now = Utc::now().timestamp();
        if let Some(cached) = state.access.as_ref().filter(|t| t.is_fresh(now)) {
            debug!("using cached Strava access token");
            return Ok(cached.access_token.clone());
        }

        let token = self.exchange_refresh_token(&state.refresh_token).await?;
        state.store(&token);
        Ok(SecretString::new(token.access_token.into()))
    }

    async fn invalidate_access_token(&self) {
        self.tokens.lock().await.access = None;
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &SecretString,
    ) -> Result<TokenResponse, StravaError> {
        let request = self.client.post(&self.config.oauth_token_url).form(&[
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
        ]);
        let resp = self.send("oauth_token", request).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Strava token refresh failed");
            return Err(StravaError::Auth(format!(
                "token refresh failed ({}): {}",
                status.as_u16(),
                body_snippet(&body)
            )));
        }

        let token: TokenResponse = resp.json().await?;
        info!(expires_at = token.expires_at, "refreshed Strava access token");
        Ok(token)
    }

    /// Build a bearer-authenticated GET request.
    async fn authorized_get(&self, path: &str) -> Result<reqwest::RequestBuilder, StravaError> {
        let token = self.access_token().await?;
        Ok(self
            .client
            .get(self.api_url(path))
            .bearer_auth(token.expose_secret()))
    }

    /// Send a request, recording its outcome.
    async fn send(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StravaError> {
        let started = Instant::now();
        let result = request.send().await;
        let status = match &result {
            Ok(resp) => resp.status().as_u16().to_string(),
            Err(_) => "error".to_string(),
        };
        debug!(
            endpoint,
            status = %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Strava request finished"
        );
        metrics::counter!(
            "strava_upstream_requests_total",
            "endpoint" => endpoint,
            "status" => status
        )
        .increment(1);
        Ok(result?)
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StravaError> {
        let resp = self.send(endpoint, request).await?;
        if !resp.status().is_success() {
            if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
                self.invalidate_access_token().await;
            }
            return Err(Self::error_from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(resp: reqwest::Response) -> StravaError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let snippet = body_snippet(&body);
        warn!(status, body = %snippet, "Strava API returned an error");

        match status {
            404 => StravaError::NotFound(snippet),
            401 | 403 => StravaError::Auth(snippet),
            _ => StravaError::Upstream {
                status,
                body: snippet,
            },
        }
    }
}

#[async_trait]
impl StravaClient for ReqwestStravaClient {
    async fn refresh_access_token(&self) -> Result<TokenResponse, StravaError> {
        self.config.require_credentials()?;
        let mut state = self.tokens.lock().await;
        let token = self.exchange_refresh_token(&state.refresh_token).await?;
        state.store(&token);
        Ok(token)
    }

    async fn get_athlete(&self) -> Result<Athlete, StravaError> {
        let request = self.authorized_get("athlete").await?;
        self.execute_json("athlete", request).await
    }

    async fn get_activities(&self, query: &ActivityQuery) -> Result<Vec<Activity>, StravaError> {
        let request = self.authorized_get("athlete/activities").await?.query(query);
        self.execute_json("athlete_activities", request).await
    }

    async fn get_athlete_stats(&self, athlete_id: i64) -> Result<ActivityStats, StravaError> {
        let request = self
            .authorized_get(&format!("athletes/{athlete_id}/stats"))
            .await?;
        self.execute_json("athlete_stats", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> Config {
        Config::from_env_with(|k| match k {
            "STRAVA_API_BASE_URL" => Some(base.to_string()),
            _ => None,
        })
        .expect("cfg")
    }

    #[test]
    fn api_url_joins_without_double_slashes() {
        let client = ReqwestStravaClient::new(config("http://localhost/api/v3/")).unwrap();
        assert_eq!(
            client.api_url("/athlete/activities"),
            "http://localhost/api/v3/athlete/activities"
        );
    }

    #[test]
    fn cached_token_freshness_uses_margin() {
        let token = CachedToken {
            access_token: SecretString::new("a".into()),
            expires_at: 1_000,
        };
        assert!(token.is_fresh(1_000 - REFRESH_MARGIN_SECS));
        assert!(!token.is_fresh(1_000 - REFRESH_MARGIN_SECS + 1));
        assert!(!token.is_fresh(2_000));
    }

    #[test]
    fn store_keeps_previous_refresh_token_when_blank() {
        let mut state = TokenState {
            access: None,
            refresh_token: SecretString::new("old".into()),
        };
        state.store(&TokenResponse {
            token_type: "Bearer".into(),
            access_token: "acc".into(),
            expires_at: 10,
            expires_in: 10,
            refresh_token: String::new(),
        });
        assert_eq!(state.refresh_token.expose_secret(), "old");
        assert!(state.access.is_some());
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let client = ReqwestStravaClient::new(config("http://127.0.0.1:9")).unwrap();
        let err = client.get_athlete().await.unwrap_err();
        assert!(matches!(err, StravaError::Config(_)));
    }
}
