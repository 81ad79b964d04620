//! # CIBA Client
//!
//! A client for the gateway's Client Initiated Backchannel Authentication
//! flow. Every capability follows the same three-step sequence:
//!
//! 1. `POST /bc-authorize` with the subject's phone number and the
//!    capability scope, returning an `auth_req_id`.
//! 2. `POST /token` exchanging the `auth_req_id` for an access token.
//! 3. `POST <capability path>` with the access token and the capability
//!    payload.
//!
//! Steps run strictly in sequence. A failed step ends the sequence: later
//! steps are never attempted.

use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION};
use http::StatusCode;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::capability::{Capability, Verification};
use crate::config::{Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::credentials::CredentialSet;
use crate::error::{Error, Step, invalid};
use crate::phone::PhoneNumber;
use crate::retry::{Failure, RetryPolicy, with_retry};
use crate::types::{
    AuthorizationGrant, AuthorizationRequest, AuthorizationResponse, TokenGrant, TokenRequest,
    TokenResponse,
};
use crate::Result;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DISCOVERY_PATH: &str = "/.well-known/openid_configuration";

/// Client for the backchannel verification sequence.
///
/// The client holds read-only configuration and a pooled HTTP connector, so
/// it is cheap to clone and safe to share between concurrent verifications.
#[derive(Clone, Debug)]
pub struct CibaClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialSet,
    retry: RetryPolicy,
    timeout: Duration,
}

impl CibaClient {
    /// Create a new `CibaClientBuilder`.
    #[must_use]
    pub fn builder() -> CibaClientBuilder<NoCredentials> {
        CibaClientBuilder::new()
    }

    /// Create a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Configuration`] if the HTTP client cannot be
    /// created.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder()
            .base_url(&config.base_url)
            .retry(config.retry.clone())
            .timeout(config.timeout)
            .credentials(config.credentials.clone())
            .build()
    }

    /// The gateway base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The retry policy applied to each step.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Start a backchannel authentication for the subject and capability.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Authorization`] if the gateway rejects the request
    /// or returns no `auth_req_id`, an [`Error::Transient`] if the gateway
    /// keeps failing, or an [`Error::Configuration`] if no credentials are
    /// set for the capability.
    #[instrument(level = "debug", skip(self, phone))]
    pub async fn initiate_authorization(
        &self, phone: &PhoneNumber, capability: Capability,
    ) -> Result<AuthorizationGrant> {
        let basic = self.credentials.get(capability)?.basic_auth();
        let request = AuthorizationRequest::new(phone, capability);
        let url = format!("{}/bc-authorize", self.base_url);

        let (status, response) = self
            .call::<AuthorizationResponse>(Step::Authorize, || {
                self.http.post(&url).header(AUTHORIZATION, &basic).form(&request)
            })
            .await?;

        let Some(auth_req_id) = response.auth_req_id.filter(|id| !id.is_empty()) else {
            return Err(Error::Authorization {
                status,
                body: "response did not include an auth_req_id".to_string(),
            });
        };
        debug!(expires_in = ?response.expires_in, "backchannel authentication started");

        Ok(AuthorizationGrant {
            auth_req_id,
            expires_in: response.expires_in,
            interval: response.interval,
            capability,
        })
    }

    /// Exchange an authorization grant for an access token. The grant is
    /// consumed.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Token`] if the gateway rejects the exchange or
    /// returns no `access_token`, or an [`Error::Transient`] if the gateway
    /// keeps failing.
    #[instrument(level = "debug", skip(self, grant), fields(capability = %grant.capability))]
    pub async fn exchange_token(&self, grant: AuthorizationGrant) -> Result<TokenGrant> {
        let basic = self.credentials.get(grant.capability)?.basic_auth();
        let request = TokenRequest::new(grant.auth_req_id);
        let url = format!("{}/token", self.base_url);

        let (status, response) = self
            .call::<TokenResponse>(Step::Token, || {
                self.http.post(&url).header(AUTHORIZATION, &basic).form(&request)
            })
            .await?;

        let Some(access_token) = response.access_token.filter(|token| !token.is_empty()) else {
            return Err(Error::Token {
                status,
                body: "response did not include an access_token".to_string(),
            });
        };
        debug!(expires_in = ?response.expires_in, "access token issued");

        Ok(TokenGrant {
            access_token,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in: response.expires_in.unwrap_or_default(),
            capability: grant.capability,
        })
    }

    /// Call the capability resource with the access token. The token is
    /// consumed.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Verification`] if the gateway rejects the call or
    /// the response cannot be read as the capability's result, an
    /// [`Error::Transient`] if the gateway keeps failing, or an
    /// [`Error::Validation`] if the token was issued for another capability.
    #[instrument(level = "debug", skip(self, token, payload), fields(capability = %R::CAPABILITY))]
    pub async fn perform_verification<R: Verification>(
        &self, token: TokenGrant, payload: &R,
    ) -> Result<R::Response> {
        if token.capability != R::CAPABILITY {
            return Err(invalid!(
                "access token was issued for {}, not {}",
                token.capability,
                R::CAPABILITY
            ));
        }
        let url = format!("{}{}", self.base_url, R::CAPABILITY.path());

        let (_, response) = self
            .call::<R::Response>(Step::Verify, || {
                self.http.post(&url).bearer_auth(&token.access_token).json(payload)
            })
            .await?;

        Ok(response)
    }

    /// Run the full sequence for the subject: validate the phone number,
    /// start a backchannel authentication, exchange it for a token, and call
    /// the capability resource.
    ///
    /// No network call is made if the phone number is invalid.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Validation`] for an invalid phone number, or the
    /// error of the first step to fail.
    #[instrument(level = "debug", skip(self, phone, payload), fields(capability = %R::CAPABILITY))]
    pub async fn perform_full_verification<R: Verification>(
        &self, phone: &str, payload: &R,
    ) -> Result<R::Response> {
        let phone = PhoneNumber::parse(phone)?;
        let grant = self.initiate_authorization(&phone, R::CAPABILITY).await?;
        let token = self.exchange_token(grant).await?;
        self.perform_verification(token, payload).await
    }

    /// Check the gateway is reachable by fetching its `OpenID` discovery
    /// document. Never fails: any error is reported as `false`.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}{DISCOVERY_PATH}", self.base_url);
        let result =
            self.http.get(&url).header(ACCEPT, "application/json").timeout(self.timeout).send().await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "gateway unreachable");
                false
            }
        }
    }

    // Send the request built by `build`, retrying transient failures, and
    // decode a successful response body. Returns the HTTP status with the
    // decoded body.
    async fn call<T: DeserializeOwned>(
        &self, step: Step, build: impl Fn() -> RequestBuilder,
    ) -> Result<(u16, T)> {
        with_retry(&self.retry, step, || {
            let request = build().header(ACCEPT, "application/json").timeout(self.timeout);
            async move { execute(step, request).await }
        })
        .await
    }
}

async fn execute<T: DeserializeOwned>(
    step: Step, request: RequestBuilder,
) -> Result<(u16, T), Failure> {
    let response = request.send().await.map_err(|e| Failure::Transient {
        status: None,
        message: e.to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| Failure::Transient {
        status: Some(status.as_u16()),
        message: e.to_string(),
    })?;

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return Err(Failure::Transient {
            status: Some(status.as_u16()),
            message: body,
        });
    }
    if !status.is_success() {
        return Err(Error::from_step(step, status.as_u16(), body).into());
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok((status.as_u16(), value)),
        Err(e) => {
            debug!(%step, error = %e, "unexpected response body");
            Err(Error::from_step(step, status.as_u16(), body).into())
        }
    }
}

/// Build a [`CibaClient`].
///
/// Credentials must be set before the client can be built.
#[derive(Debug)]
pub struct CibaClientBuilder<C> {
    base_url: Option<String>,
    credentials: C,
    retry: RetryPolicy,
    timeout: Duration,
    http: Option<reqwest::Client>,
}

/// No credentials have been set.
#[doc(hidden)]
pub struct NoCredentials;
/// Credentials have been set.
#[doc(hidden)]
pub struct WithCredentials(CredentialSet);

impl Default for CibaClientBuilder<NoCredentials> {
    fn default() -> Self {
        Self {
            base_url: None,
            credentials: NoCredentials,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            http: None,
        }
    }
}

impl CibaClientBuilder<NoCredentials> {
    /// Create a new `CibaClientBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client credentials.
    #[must_use]
    pub fn credentials(self, credentials: CredentialSet) -> CibaClientBuilder<WithCredentials> {
        CibaClientBuilder {
            base_url: self.base_url,
            credentials: WithCredentials(credentials),
            retry: self.retry,
            timeout: self.timeout,
            http: self.http,
        }
    }
}

impl<C> CibaClientBuilder<C> {
    /// Set the gateway base URL. Defaults to the sandbox environment.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }
}

impl CibaClientBuilder<WithCredentials> {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Configuration`] if the HTTP client cannot be
    /// created.
    pub fn build(self) -> Result<CibaClient> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .map_err(|e| Error::Configuration(format!("issue building HTTP client: {e}")))?,
        };
        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(CibaClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: self.credentials.0,
            retry: self.retry,
            timeout: self.timeout,
        })
    }
}
