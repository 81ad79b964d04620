//! # Configuration
//!
//! Client settings are read from the environment, after loading a `.env`
//! file when present.
//!
//! | Variable | Purpose |
//! |---|---|
//! | `CLIENT_ID`, `CLIENT_SECRET` | Default credential pair |
//! | `CLIENT_ID_AV`, `CLIENT_SECRET_AV` | Age verification credentials |
//! | `CLIENT_ID_KYC`, `CLIENT_SECRET_KYC` | KYC match credentials |
//! | `CLIENT_ID_LOCATION`, `CLIENT_SECRET_LOCATION` | Device location credentials |
//! | `CLIENT_ID_SIM_SWAP`, `CLIENT_SECRET_SIM_SWAP` | SIM swap credentials |
//! | `API_BASE_URL` | Gateway base URL |
//! | `RETRY_MAX` | Retries after the first attempt |
//! | `RETRY_BACKOFF_MS` | Delay before the first retry |
//! | `RETRY_MAX_BACKOFF_MS` | Upper bound on any retry delay |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout |
//! | `BULK_PACING_MS` | Delay between subjects in bulk verification |

use std::time::Duration;

use config::{Config as Cfg, Environment};
use serde::Deserialize;
use tracing::warn;

use crate::capability::Capability;
use crate::credentials::{CredentialSet, Credentials};
use crate::error::Error;
use crate::retry::RetryPolicy;

/// The gateway sandbox environment.
pub const DEFAULT_BASE_URL: &str = "https://sandbox.opengateway.telefonica.com/apigateway";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default delay between subjects in bulk verification.
pub const DEFAULT_BULK_PACING: Duration = Duration::from_millis(1000);

/// Resolved client configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Gateway base URL, without a trailing slash.
    pub base_url: String,

    /// Client credentials per capability.
    pub credentials: CredentialSet,

    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Delay between subjects in bulk verification.
    pub bulk_pacing: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: CredentialSet::default(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            bulk_pacing: DEFAULT_BULK_PACING,
        }
    }
}

// Raw settings as read from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    client_id: Option<String>,
    client_secret: Option<String>,
    client_id_av: Option<String>,
    client_secret_av: Option<String>,
    client_id_kyc: Option<String>,
    client_secret_kyc: Option<String>,
    client_id_location: Option<String>,
    client_secret_location: Option<String>,
    client_id_sim_swap: Option<String>,
    client_secret_sim_swap: Option<String>,
    api_base_url: Option<String>,
    retry_max: Option<u32>,
    retry_backoff_ms: Option<u64>,
    retry_max_backoff_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    bulk_pacing_ms: Option<u64>,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Configuration`] if a variable cannot be parsed.
    pub fn load() -> Result<Self, Error> {
        dotenvy::dotenv().ok();
        Self::from_env(Environment::default().try_parsing(true))
    }

    /// Build configuration from an environment source.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Configuration`] if a variable cannot be parsed.
    pub fn from_env(env: Environment) -> Result<Self, Error> {
        let settings: Settings = Cfg::builder().add_source(env).build()?.try_deserialize()?;
        Ok(Self::from(settings))
    }
}

fn pair(id: Option<String>, secret: Option<String>) -> Option<Credentials> {
    match (id, secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
            Some(Credentials::new(id, secret))
        }
        _ => None,
    }
}

impl From<Settings> for Config {
    fn from(s: Settings) -> Self {
        let defaults = Self::default();

        let mut credentials = CredentialSet::default();
        if let Some(creds) = pair(s.client_id, s.client_secret) {
            credentials = credentials.with_default(creds);
        }
        let specific = [
            (Capability::AgeVerification, pair(s.client_id_av, s.client_secret_av)),
            (Capability::KycMatch, pair(s.client_id_kyc, s.client_secret_kyc)),
            (Capability::DeviceLocation, pair(s.client_id_location, s.client_secret_location)),
            (Capability::SimSwap, pair(s.client_id_sim_swap, s.client_secret_sim_swap)),
        ];
        for (capability, creds) in specific {
            if let Some(creds) = creds {
                credentials = credentials.with_capability(capability, creds);
            }
        }

        if credentials.is_empty() {
            warn!("no client credentials configured");
        }
        for creds in credentials.iter() {
            if !creds.is_well_formed() {
                warn!(client_id = %creds.client_id, "client credentials are not in UUID form");
            }
        }

        let mut retry = defaults.retry;
        if let Some(max) = s.retry_max {
            retry.max_retries = max;
        }
        if let Some(ms) = s.retry_backoff_ms {
            retry.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = s.retry_max_backoff_ms {
            retry.max_backoff = Duration::from_millis(ms);
        }

        Self {
            base_url: s
                .api_base_url
                .filter(|url| !url.is_empty())
                .map_or(defaults.base_url, |url| url.trim_end_matches('/').to_string()),
            credentials,
            retry,
            timeout: s.request_timeout_secs.map_or(defaults.timeout, Duration::from_secs),
            bulk_pacing: s.bulk_pacing_ms.map_or(defaults.bulk_pacing, Duration::from_millis),
        }
    }
}
