//! # Mock Gateway
//!
//! A mock operator API gateway for exercising the CIBA client without
//! network access. Each endpoint can be mounted with a canned response and
//! calls to each endpoint counted afterwards.

use std::sync::Once;
use std::time::Duration;

use credibil_ciba::{Capability, CibaClient, CredentialSet, Credentials, RetryPolicy};
use serde_json::{Value, json};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client id used by [`MockGateway::client`].
pub const CLIENT_ID: &str = "5e7d9f2b-1c3a-4b6e-8f0d-2a4c6e8b0d1f";
/// Client secret used by [`MockGateway::client`].
pub const CLIENT_SECRET: &str = "9b1d3f5a-7c2e-4a6b-8d0f-1e3c5a7b9d2e";

/// Backchannel authentication endpoint path.
pub const BC_AUTHORIZE: &str = "/bc-authorize";
/// Token endpoint path.
pub const TOKEN: &str = "/token";

static INIT: Once = Once::new();

/// Install a `tracing` subscriber for tests. Set `RUST_LOG` to control
/// output.
pub fn init_tracing() {
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        subscriber.try_init().ok();
    });
}

/// A retry policy with the default shape scaled down for tests: two
/// retries, 100ms then 200ms.
#[must_use]
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(500),
        ..RetryPolicy::default()
    }
}

/// A mock gateway.
pub struct MockGateway {
    server: MockServer,
}

impl MockGateway {
    /// Start a mock gateway on a random local port.
    pub async fn start() -> Self {
        init_tracing();
        Self {
            server: MockServer::start().await,
        }
    }

    /// The gateway base URL.
    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// A client for the gateway using the test credentials and
    /// [`fast_retry`].
    #[must_use]
    pub fn client(&self) -> CibaClient {
        self.client_with(fast_retry())
    }

    /// A client for the gateway using the test credentials and `retry`.
    #[must_use]
    pub fn client_with(&self, retry: RetryPolicy) -> CibaClient {
        self.client_for(CredentialSet::new(Credentials::new(CLIENT_ID, CLIENT_SECRET)), retry)
    }

    /// A client for the gateway using `credentials` and `retry`.
    #[must_use]
    pub fn client_for(&self, credentials: CredentialSet, retry: RetryPolicy) -> CibaClient {
        CibaClient::builder()
            .base_url(self.uri())
            .retry(retry)
            .timeout(Duration::from_secs(5))
            .credentials(credentials)
            .build()
            .expect("should build client")
    }

    /// Mount a custom mock.
    pub async fn mount(&self, mock: Mock) {
        mock.mount(&self.server).await;
    }

    /// Respond to `bc-authorize` with `response`.
    pub async fn authorize(&self, response: ResponseTemplate) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(BC_AUTHORIZE))
                .and(header_exists("authorization"))
                .respond_with(response),
        )
        .await;
    }

    /// Accept every `bc-authorize` call, returning a fresh `auth_req_id`.
    /// Returns the `auth_req_id`.
    pub async fn authorize_ok(&self) -> String {
        let auth_req_id = uuid::Uuid::new_v4().to_string();
        self.authorize(ResponseTemplate::new(200).set_body_json(json!({
            "auth_req_id": auth_req_id,
            "expires_in": 120,
            "interval": 2
        })))
        .await;
        auth_req_id
    }

    /// Respond to `/token` with `response`.
    pub async fn token(&self, response: ResponseTemplate) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(TOKEN))
                .and(header_exists("authorization"))
                .respond_with(response),
        )
        .await;
    }

    /// Issue `access_token` for every token exchange.
    pub async fn token_ok(&self, access_token: &str) {
        self.token(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .await;
    }

    /// Respond to the capability resource with `response`.
    pub async fn verify(&self, capability: Capability, response: ResponseTemplate) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(capability.path()))
                .and(header_exists("authorization"))
                .respond_with(response),
        )
        .await;
    }

    /// Respond to the capability resource with `body` when called with
    /// `access_token`.
    pub async fn verify_ok(&self, capability: Capability, access_token: &str, body: Value) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(capability.path()))
                .and(header("authorization", format!("Bearer {access_token}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(body)),
        )
        .await;
    }

    /// Mount the whole sequence for `capability`, answering the resource
    /// call with `body`.
    pub async fn sequence(&self, capability: Capability, body: Value) {
        let access_token = uuid::Uuid::new_v4().to_string();
        self.authorize_ok().await;
        self.token_ok(&access_token).await;
        self.verify_ok(capability, &access_token, body).await;
    }

    /// Number of calls received by `bc-authorize`.
    pub async fn authorize_calls(&self) -> usize {
        self.calls(BC_AUTHORIZE).await
    }

    /// Number of calls received by `/token`.
    pub async fn token_calls(&self) -> usize {
        self.calls(TOKEN).await
    }

    /// Number of calls received by the capability resource.
    pub async fn verify_calls(&self, capability: Capability) -> usize {
        self.calls(capability.path()).await
    }

    /// Number of calls received on any endpoint.
    pub async fn total_calls(&self) -> usize {
        self.server.received_requests().await.map_or(0, |r| r.len())
    }

    /// Bodies of the requests received on `path`, in order.
    pub async fn bodies(&self, path: &str) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .map(|r| String::from_utf8_lossy(&r.body).into_owned())
            .collect()
    }

    async fn calls(&self, path: &str) -> usize {
        self.bodies(path).await.len()
    }
}
