use crate::StravaError;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
/// Per-request upstream timeout; kept below the server's own request deadline.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
    pub api_base_url: String,
    pub oauth_token_url: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, StravaError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    ///
    /// Credentials may be absent here; requests then fail with
    /// [`StravaError::Config`] via [`Config::require_credentials`].
    pub fn from_env_with<F>(mut get: F) -> Result<Self, StravaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let client_id = get("STRAVA_CLIENT_ID").unwrap_or_default();
        let client_secret = get("STRAVA_CLIENT_SECRET").unwrap_or_default();
        let refresh_token = get("STRAVA_REFRESH_TOKEN").unwrap_or_default();
        let api_base_url =
            get("STRAVA_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let oauth_token_url =
            get("STRAVA_OAUTH_TOKEN_URL").unwrap_or_else(|| DEFAULT_OAUTH_TOKEN_URL.into());

        let timeout_secs = match get("STRAVA_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    StravaError::Config(format!(
                        "STRAVA_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    ))
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        for (name, url) in [
            ("STRAVA_API_BASE_URL", &api_base_url),
            ("STRAVA_OAUTH_TOKEN_URL", &oauth_token_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(StravaError::Config(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }

        Ok(Self {
            client_id: client_id.trim().to_string(),
            client_secret: SecretString::new(client_secret.trim().into()),
            refresh_token: SecretString::new(refresh_token.trim().into()),
            api_base_url,
            oauth_token_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Names of the credential variables that are unset or blank.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.is_empty() {
            missing.push("STRAVA_CLIENT_ID");
        }
        if self.client_secret.expose_secret().is_empty() {
            missing.push("STRAVA_CLIENT_SECRET");
        }
        if self.refresh_token.expose_secret().is_empty() {
            missing.push("STRAVA_REFRESH_TOKEN");
        }
        missing
    }

    pub fn require_credentials(&self) -> Result<(), StravaError> {
        let missing = self.missing_credentials();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StravaError::Config(format!(
                "missing Strava credentials: {}",
                missing.join(", ")
            )))
        }
    }
}
