//! Tests for the demo verification flows against a mock gateway

use std::time::{Duration, Instant};

use credibil_ciba::flows::casino::{self, WithdrawRequest};
use credibil_ciba::flows::disco::{self, Guest, GuestStatus};
use credibil_ciba::flows::kyc;
use credibil_ciba::flows::location::{self, Area};
use credibil_ciba::flows::poker::{self, PokerRegistration};
use credibil_ciba::flows::sim_swap;
use credibil_ciba::{
    Capability, CredentialSet, Credentials, Error, KycField, KycMatchRequest, LocationResult,
    RetryPolicy,
};
use serde_json::json;
use test_utils::{BC_AUTHORIZE, MockGateway};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

// ----------------------------------------------------------------------------
// Casino withdrawal
// ----------------------------------------------------------------------------

#[tokio::test]
async fn withdraw_allowed() {
    let gateway = MockGateway::start().await;
    gateway.sequence(Capability::AgeVerification, json!({"ageCheck": "true"})).await;

    let request = WithdrawRequest {
        phone_number: "+34123456789".to_string(),
        amount: 250.0,
    };
    let result = casino::withdraw(&gateway.client(), &request).await.expect("should withdraw");

    assert!(result.can_withdraw);
    assert!(result.age.age_check.is_match());
    assert!((result.withdraw_amount - 250.0).abs() < f64::EPSILON);

    let ser = serde_json::to_value(&result).expect("should serialize");
    assert_eq!(ser["ageCheck"], "true");
    assert_eq!(ser["canWithdraw"], true);
}

// An age check that cannot be determined refuses the withdrawal.
#[tokio::test]
async fn withdraw_refused() {
    let gateway = MockGateway::start().await;
    gateway.sequence(Capability::AgeVerification, json!({"ageCheck": "not_available"})).await;

    let request = WithdrawRequest {
        phone_number: "+34123456789".to_string(),
        amount: 100.0,
    };
    let result = casino::withdraw(&gateway.client(), &request).await.expect("should complete");

    assert!(!result.can_withdraw);
    assert!(result.age.age_check.is_unavailable());
    assert!(result.withdraw_amount.abs() < f64::EPSILON);
}

#[tokio::test]
async fn withdraw_invalid() {
    let gateway = MockGateway::start().await;
    let client = gateway.client();

    for (phone, amount) in [("+340000000", 100.0), ("+34123456789", 0.0), ("+34123456789", -5.0)] {
        let request = WithdrawRequest {
            phone_number: phone.to_string(),
            amount,
        };
        let err = casino::withdraw(&client, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::Validation(_)));
    }
    assert_eq!(gateway.total_calls().await, 0);
}

// ----------------------------------------------------------------------------
// Club admission
// ----------------------------------------------------------------------------

fn guest(name: &str, phone: &str) -> Guest {
    Guest {
        name: name.to_string(),
        phone_number: phone.to_string(),
    }
}

// Failures are recorded per guest and do not stop the list. Incomplete
// guests and malformed phone numbers never reach the gateway.
#[tokio::test]
async fn admit_guests() {
    let gateway = MockGateway::start().await;
    gateway.sequence(Capability::AgeVerification, json!({"ageCheck": "true"})).await;

    let guests = [
        guest("Ana", "+34629255833"),
        guest("", "+34629255834"),
        guest("Luis", "+340000000"),
        guest("Marta", "+34629255835"),
    ];
    let pacing = Duration::from_millis(50);

    let started = Instant::now();
    let bulk = disco::admit_guests(&gateway.client(), &guests, pacing)
        .await
        .expect("should verify guests");

    // pauses after Ana only
    assert!(started.elapsed() >= pacing);

    assert_eq!(bulk.summary.total, 4);
    assert_eq!(bulk.summary.can_enter, 2);
    assert_eq!(bulk.summary.cannot_enter, 2);
    assert_eq!(bulk.summary.errors, 2);

    let statuses: Vec<GuestStatus> = bulk.results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![
        GuestStatus::Verified,
        GuestStatus::Error,
        GuestStatus::Error,
        GuestStatus::Verified
    ]);
    assert!(bulk.results[2].error.as_deref().is_some_and(|e| e.contains("+340000000")));

    assert_eq!(gateway.authorize_calls().await, 2);
}

// Guests rejected before any gateway call do not wait out the pacing.
#[tokio::test(start_paused = true)]
async fn admit_guests_no_pause_without_call() {
    // any request would fail and back off
    let client = credibil_ciba::CibaClient::builder()
        .base_url("http://127.0.0.1:1")
        .credentials(CredentialSet::new(Credentials::new(
            test_utils::CLIENT_ID,
            test_utils::CLIENT_SECRET,
        )))
        .build()
        .expect("should build");

    let guests = [
        guest("Luis", "+340000000"),
        guest("Marta", " +34629255835"),
        guest("", "+34629255836"),
        guest("Pablo", "34629255837"),
    ];

    let started = tokio::time::Instant::now();
    let bulk = disco::admit_guests(&client, &guests, Duration::from_secs(60))
        .await
        .expect("should complete");

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(bulk.summary.errors, 4);
    assert!(bulk.results.iter().all(|r| r.status == GuestStatus::Error));
    assert!(bulk.results[1].error.as_deref().is_some_and(|e| e.contains("must start with '+'")));
}

#[tokio::test]
async fn admit_guests_gateway_error() {
    let gateway = MockGateway::start().await;
    gateway.authorize_ok().await;
    gateway.token(ResponseTemplate::new(403)).await;

    let bulk = disco::admit_guests(
        &gateway.client_with(RetryPolicy::none()),
        &[guest("Ana", "+34629255833")],
        Duration::ZERO,
    )
    .await
    .expect("should complete");

    assert_eq!(bulk.summary.errors, 1);
    assert_eq!(bulk.results[0].error.as_deref(), Some("not authorized for this phone/scope"));
    assert!(!bulk.results[0].can_enter);
}

#[tokio::test]
async fn admit_no_guests() {
    let gateway = MockGateway::start().await;
    let err = disco::admit_guests(&gateway.client(), &[], Duration::ZERO)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::Validation(_)));
}

// ----------------------------------------------------------------------------
// Customer onboarding
// ----------------------------------------------------------------------------

#[tokio::test]
async fn verify_customer() {
    let gateway = MockGateway::start().await;
    gateway
        .sequence(
            Capability::KycMatch,
            json!({
                "idDocumentMatch": "true",
                "givenNameMatch": "false",
                "givenNameMatchScore": 85,
                "emailMatch": "not_available"
            }),
        )
        .await;

    let request = KycMatchRequest {
        id_document: Some("66666666q".to_string()),
        given_name: Some("Federica".to_string()),
        email: Some("federica@example.com".to_string()),
        ..KycMatchRequest::default()
    };
    let verification = kyc::verify_customer(&gateway.client(), "+34629255833", &request)
        .await
        .expect("should verify");

    assert!(!verification.is_verified);
    assert_eq!(verification.overall_score, 93);
    assert_eq!(verification.verified_fields, vec![KycField::IdDocument]);
    assert_eq!(verification.failed_fields, vec![KycField::GivenName]);
    assert_eq!(verification.unavailable_fields, vec![KycField::Email]);

    // only the provided fields are sent
    let sent = &gateway.bodies(Capability::KycMatch.path()).await[0];
    let body: serde_json::Value = serde_json::from_str(sent).expect("should be json");
    assert_eq!(body, json!({
        "idDocument": "66666666q",
        "givenName": "Federica",
        "email": "federica@example.com"
    }));
}

#[tokio::test]
async fn verify_customer_no_fields() {
    let gateway = MockGateway::start().await;
    let request = KycMatchRequest {
        given_name: Some("  ".to_string()),
        ..KycMatchRequest::default()
    };

    let err = kyc::verify_customer(&gateway.client(), "+34629255833", &request)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(gateway.total_calls().await, 0);
}

// ----------------------------------------------------------------------------
// Player registration
// ----------------------------------------------------------------------------

// Identity and age are each authorized with the credentials provisioned for
// that capability.
#[tokio::test]
async fn register_player() {
    let kyc_creds = Credentials::new(
        "0b8e2f4a-6c1d-4e3f-9a5b-7d2c8e1f0a3b",
        "4f6a8c0e-2b4d-4f6a-8c0e-2b4d6f8a0c1e",
    );
    let age_creds = Credentials::new(
        "7c9e1a3b-5d7f-4b9d-8e0a-3c5e7a9b1d2f",
        "1a3c5e7b-9d1f-4a3c-b5e7-9d1f3a5c7e9b",
    );

    let gateway = MockGateway::start().await;
    for (creds, scope, auth_req_id) in [
        (&kyc_creds, "kyc-match", "kyc-request"),
        (&age_creds, "kyc-age-verification", "age-request"),
    ] {
        gateway
            .mount(
                Mock::given(method("POST"))
                    .and(path(BC_AUTHORIZE))
                    .and(header("authorization", creds.basic_auth()))
                    .and(body_string_contains(scope))
                    .respond_with(
                        ResponseTemplate::new(200)
                            .set_body_json(json!({"auth_req_id": auth_req_id})),
                    ),
            )
            .await;
    }
    gateway.token_ok("token").await;
    gateway
        .verify_ok(
            Capability::KycMatch,
            "token",
            json!({
                "givenNameMatch": "true",
                "familyNameMatch": "true",
                "birthdateMatch": "true"
            }),
        )
        .await;
    gateway.verify_ok(Capability::AgeVerification, "token", json!({"ageCheck": "true"})).await;

    let credentials = CredentialSet::new(Credentials::new("unused", "unused"))
        .with_capability(Capability::KycMatch, kyc_creds)
        .with_capability(Capability::AgeVerification, age_creds);
    let client = gateway.client_for(credentials, RetryPolicy::none());

    let registration: PokerRegistration = serde_json::from_value(json!({
        "phoneNumber": "+34629255833",
        "givenName": "Federica",
        "familyName": "Sanchez Arjona",
        "birthdate": "1978-08-22"
    }))
    .expect("should deserialize");

    let verification =
        poker::register_player(&client, &registration).await.expect("should register");

    assert!(verification.kyc_verified);
    assert!(verification.age_verified);
    assert!(verification.can_play);
    assert_eq!(verification.verified_fields, vec!["First Name", "Last Name", "Birth Date"]);
    assert_eq!(gateway.authorize_calls().await, 2);
}

// A failed identity match ends registration before the age check.
#[tokio::test]
async fn register_player_kyc_failure() {
    let gateway = MockGateway::start().await;
    gateway.authorize_ok().await;
    gateway.token_ok("token").await;
    gateway
        .verify(
            Capability::KycMatch,
            ResponseTemplate::new(400).set_body_json(json!({
                "status": 400,
                "code": "INVALID_PARAM_COMBINATION",
                "message": "idDocument and name cannot both be empty"
            })),
        )
        .await;

    let registration = PokerRegistration {
        phone_number: "+34629255833".to_string(),
        details: KycMatchRequest {
            given_name: Some("Federica".to_string()),
            family_name: Some("Sanchez".to_string()),
            birthdate: Some("1978-08-22".to_string()),
            ..KycMatchRequest::default()
        },
        age_threshold: Some(21),
    };

    let err = poker::register_player(&gateway.client(), &registration)
        .await
        .expect_err("should fail");

    assert_eq!(err.classify(), credibil_ciba::Classification::InvalidParamCombination);
    assert_eq!(gateway.verify_calls(Capability::AgeVerification).await, 0);
}

// ----------------------------------------------------------------------------
// Device location
// ----------------------------------------------------------------------------

#[tokio::test]
async fn verify_location() {
    let gateway = MockGateway::start().await;
    gateway
        .sequence(
            Capability::DeviceLocation,
            json!({"verificationResult": "PARTIAL", "matchRate": 74}),
        )
        .await;

    let result = location::verify_location(&gateway.client(), "+34629255833", &Area::BARCELONA)
        .await
        .expect("should verify");

    assert_eq!(result.verification_result, LocationResult::Partial);
    assert_eq!(result.match_rate, Some(74));

    let sent = &gateway.bodies(Capability::DeviceLocation.path()).await[0];
    let body: serde_json::Value = serde_json::from_str(sent).expect("should be json");
    assert_eq!(body, json!({
        "ueId": {"msisdn": "+34629255833"},
        "latitude": 41.3851,
        "longitude": 2.1734,
        "accuracy": 8
    }));
}

#[tokio::test]
async fn verify_location_invalid_area() {
    let gateway = MockGateway::start().await;
    let err = location::verify_location(
        &gateway.client(),
        "+34629255833",
        &Area::new(40.0, -3.0, 500),
    )
    .await
    .expect_err("should fail");

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(gateway.total_calls().await, 0);
}

// ----------------------------------------------------------------------------
// SIM swap
// ----------------------------------------------------------------------------

#[tokio::test]
async fn sim_swap_check() {
    let gateway = MockGateway::start().await;
    gateway
        .sequence(
            Capability::SimSwap,
            json!({"swapped": true, "latestSimChange": "2026-10-01T08:30:00Z"}),
        )
        .await;

    let result = sim_swap::check(&gateway.client(), "+34629255833", 240)
        .await
        .expect("should check");

    assert!(result.swapped);
    assert!(result.latest_sim_change.is_some());

    let sent = &gateway.bodies(Capability::SimSwap.path()).await[0];
    let body: serde_json::Value = serde_json::from_str(sent).expect("should be json");
    assert_eq!(body, json!({"phoneNumber": "+34629255833", "maxAge": 240}));
}

#[tokio::test]
async fn sim_swap_window() {
    let gateway = MockGateway::start().await;
    let client = gateway.client();

    for max_age in [0, 2401] {
        let err = sim_swap::check(&client, "+34629255833", max_age)
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::Validation(_)));
    }
    assert_eq!(gateway.total_calls().await, 0);
}
