//! Tests for retrying transient gateway failures

use std::time::{Duration, Instant};

use credibil_ciba::{AgeVerificationRequest, Capability, Error, RetryPolicy, Step};
use serde_json::json;
use test_utils::{BC_AUTHORIZE, MockGateway, TOKEN};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const PHONE: &str = "+34629255833";

// A single 500 from bc-authorize is retried and the sequence completes.
#[tokio::test]
async fn recovers() {
    let gateway = MockGateway::start().await;
    gateway
        .mount(
            Mock::given(method("POST"))
                .and(path(BC_AUTHORIZE))
                .respond_with(ResponseTemplate::new(500))
                .up_to_n_times(1),
        )
        .await;
    gateway.sequence(Capability::AgeVerification, json!({"ageCheck": "true"})).await;

    let result = gateway
        .client()
        .perform_full_verification(PHONE, &AgeVerificationRequest::default())
        .await
        .expect("should verify");

    assert!(result.age_check.is_match());
    assert_eq!(gateway.authorize_calls().await, 2);
    assert_eq!(gateway.token_calls().await, 1);
}

// Only the failing step is retried: earlier steps are not repeated.
#[tokio::test]
async fn retries_step_only() {
    let gateway = MockGateway::start().await;
    gateway.authorize_ok().await;
    gateway
        .mount(
            Mock::given(method("POST"))
                .and(path(TOKEN))
                .respond_with(ResponseTemplate::new(500))
                .up_to_n_times(2),
        )
        .await;
    gateway.token_ok("token").await;
    gateway.verify_ok(Capability::AgeVerification, "token", json!({"ageCheck": "false"})).await;

    let result = gateway
        .client()
        .perform_full_verification(PHONE, &AgeVerificationRequest::default())
        .await
        .expect("should verify");

    assert!(!result.age_check.is_match());
    assert_eq!(gateway.authorize_calls().await, 1);
    assert_eq!(gateway.token_calls().await, 3);
}

// A gateway that keeps failing is attempted once plus the retry count, with
// the backoff between attempts, before a transient error is returned.
#[tokio::test]
async fn exhausted() {
    let gateway = MockGateway::start().await;
    gateway.authorize(ResponseTemplate::new(500).set_body_string("upstream down")).await;

    let started = Instant::now();
    let err = gateway
        .client()
        .perform_full_verification(PHONE, &AgeVerificationRequest::default())
        .await
        .expect_err("should fail");

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(err, Error::Transient {
        step: Step::Authorize,
        status: Some(500),
        message: "upstream down".to_string(),
    });
    assert_eq!(gateway.authorize_calls().await, 3);
    assert_eq!(gateway.token_calls().await, 0);
}

// Client errors are final.
#[tokio::test]
async fn client_error_not_retried() {
    for status in [400, 401, 403, 404, 422] {
        let gateway = MockGateway::start().await;
        gateway.authorize(ResponseTemplate::new(status)).await;

        let err = gateway
            .client()
            .perform_full_verification(PHONE, &AgeVerificationRequest::default())
            .await
            .expect_err("should fail");

        assert_eq!(err.status(), Some(status));
        assert!(!err.is_transient());
        assert_eq!(gateway.authorize_calls().await, 1, "status {status}");
        assert_eq!(gateway.token_calls().await, 0);
    }
}

// Only HTTP 500 is treated as transient.
#[tokio::test]
async fn other_server_error_not_retried() {
    let gateway = MockGateway::start().await;
    gateway.authorize_ok().await;
    gateway.token(ResponseTemplate::new(503)).await;

    let err = gateway
        .client()
        .perform_full_verification(PHONE, &AgeVerificationRequest::default())
        .await
        .expect_err("should fail");

    assert!(matches!(err, Error::Token { status: 503, .. }));
    assert_eq!(gateway.token_calls().await, 1);
}

#[tokio::test]
async fn no_retry_policy() {
    let gateway = MockGateway::start().await;
    gateway.authorize(ResponseTemplate::new(500)).await;

    let err = gateway
        .client_with(RetryPolicy::none())
        .perform_full_verification(PHONE, &AgeVerificationRequest::default())
        .await
        .expect_err("should fail");

    assert!(err.is_transient());
    assert_eq!(gateway.authorize_calls().await, 1);
}

// An unreachable gateway is a transient failure with no status.
#[tokio::test]
async fn unreachable() {
    test_utils::init_tracing();
    let client = credibil_ciba::CibaClient::builder()
        .base_url("http://127.0.0.1:1")
        .retry(RetryPolicy {
            initial_backoff: Duration::from_millis(10),
            max_retries: 1,
            ..RetryPolicy::default()
        })
        .credentials(credibil_ciba::CredentialSet::new(credibil_ciba::Credentials::new(
            test_utils::CLIENT_ID,
            test_utils::CLIENT_SECRET,
        )))
        .build()
        .expect("should build");

    let err = client
        .perform_full_verification(PHONE, &AgeVerificationRequest::default())
        .await
        .expect_err("should fail");

    assert!(matches!(err, Error::Transient { step: Step::Authorize, status: None, .. }));
}
