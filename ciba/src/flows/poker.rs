//! # Player Registration
//!
//! Registering a poker player requires both an identity match and an age
//! check. Each runs as its own verification sequence with the credentials
//! provisioned for that capability.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::CibaClient;
use crate::error::invalid;
use crate::flows::kyc::mean;
use crate::phone::PhoneNumber;
use crate::types::{
    AgeVerificationRequest, AgeVerificationResponse, DEFAULT_AGE_THRESHOLD, KycField,
    KycMatchRequest, KycMatchResponse, MatchResult,
};
use crate::Result;

const REQUIRED: [KycField; 3] = [KycField::GivenName, KycField::FamilyName, KycField::Birthdate];
const SCORED: [KycField; 5] =
    [KycField::Name, KycField::GivenName, KycField::FamilyName, KycField::Address, KycField::Email];

/// A player registration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PokerRegistration {
    /// The player's phone number.
    pub phone_number: String,

    /// The player's details. Given name, family name and birthdate are
    /// required.
    #[serde(flatten)]
    pub details: KycMatchRequest,

    /// Minimum age. Defaults to 18.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_threshold: Option<u8>,
}

/// The outcome of a player registration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PokerVerification {
    /// An identity document, name or birthdate matched.
    pub kyc_verified: bool,

    /// Mean similarity score of the name, address and email fields.
    pub kyc_score: u8,

    /// The player met the age threshold.
    pub age_verified: bool,

    /// Both checks passed.
    pub can_play: bool,

    /// End-user message.
    pub overall_message: String,

    /// Labels of the fields that matched.
    pub verified_fields: Vec<String>,

    /// Labels of the fields that did not match.
    pub failed_fields: Vec<String>,

    /// Labels of the fields the operator could not check.
    pub unavailable_fields: Vec<String>,

    /// Suggested next steps when registration is refused.
    pub recommendations: Vec<String>,

    /// The raw KYC match result.
    pub kyc_result: KycMatchResponse,

    /// The raw age verification result.
    pub age_result: AgeVerificationResponse,
}

/// Register a player: match their identity, then check their age.
///
/// # Errors
///
/// Returns an [`Error::Validation`](crate::Error::Validation) for an invalid phone number or missing
/// required details, or the error of the first verification step to fail.
#[instrument(level = "debug", skip(client, registration))]
pub async fn register_player(
    client: &CibaClient, registration: &PokerRegistration,
) -> Result<PokerVerification> {
    let phone = PhoneNumber::parse(&registration.phone_number)?;
    let missing: Vec<&str> = REQUIRED
        .into_iter()
        .filter(|f| registration.details.value(*f).is_none())
        .map(KycField::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(invalid!("missing required fields: {}", missing.join(", ")));
    }

    let kyc_result =
        client.perform_full_verification(phone.as_str(), &registration.details).await?;

    let threshold = registration.age_threshold.unwrap_or(DEFAULT_AGE_THRESHOLD);
    let age_result = client
        .perform_full_verification(phone.as_str(), &AgeVerificationRequest::new(threshold))
        .await?;

    Ok(evaluate(kyc_result, age_result, threshold))
}

/// Combine the identity and age results.
#[must_use]
pub fn evaluate(
    kyc_result: KycMatchResponse, age_result: AgeVerificationResponse, threshold: u8,
) -> PokerVerification {
    let name =
        kyc_result.result(KycField::Name).or_else(|| kyc_result.result(KycField::GivenName));
    let kyc_verified = [kyc_result.result(KycField::IdDocument), name, kyc_result.birthdate_match]
        .into_iter()
        .any(|r| r == Some(MatchResult::True));

    let scores: Vec<u32> =
        SCORED.into_iter().filter_map(|f| kyc_result.score(f)).map(u32::from).collect();
    let kyc_score = mean(scores.iter().sum(), u32::try_from(scores.len()).unwrap_or(u32::MAX));

    let age_verified = age_result.age_check.is_match();
    let can_play = kyc_verified && age_verified;

    let mut verified_fields = vec![];
    let mut failed_fields = vec![];
    let mut unavailable_fields = vec![];
    for field in KycField::ALL {
        let label = field.label().to_string();
        match kyc_result.result(field) {
            Some(MatchResult::True) => verified_fields.push(label),
            Some(MatchResult::False) => failed_fields.push(label),
            Some(MatchResult::NotAvailable) => unavailable_fields.push(label),
            None => {}
        }
    }

    let mut messages = vec![];
    let mut recommendations = vec![];
    if can_play {
        messages.push("verification complete: you can play".to_string());
    }
    if !age_verified {
        messages.push("legal age could not be verified".to_string());
        recommendations.push(format!("check you are at least {threshold} years old"));
    }
    if !kyc_verified {
        messages.push("identity verification was not successful".to_string());
        recommendations.push("check the details provided are correct".to_string());
        if !failed_fields.is_empty() {
            recommendations.push(format!("fields that failed: {}", failed_fields.join(", ")));
        }
    }

    PokerVerification {
        kyc_verified,
        kyc_score,
        age_verified,
        can_play,
        overall_message: messages.join("; "),
        verified_fields,
        failed_fields,
        unavailable_fields,
        recommendations,
        kyc_result,
        age_result,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn age(check: MatchResult) -> AgeVerificationResponse {
        AgeVerificationResponse {
            age_check: check,
            verified_status: None,
            identity_match_score: None,
            content_lock: None,
            parental_control: None,
        }
    }

    #[test]
    fn can_play() {
        let kyc = KycMatchResponse {
            given_name_match: Some(MatchResult::True),
            family_name_match: Some(MatchResult::False),
            family_name_match_score: Some(70),
            email_match: Some(MatchResult::False),
            email_match_score: Some(91),
            ..KycMatchResponse::default()
        };

        let verification = evaluate(kyc, age(MatchResult::True), 18);
        assert!(verification.kyc_verified);
        assert!(verification.can_play);
        assert_eq!(verification.kyc_score, 81);
        assert_eq!(verification.verified_fields, vec!["First Name"]);
        assert_eq!(verification.failed_fields, vec!["Last Name", "Email"]);
        assert!(verification.recommendations.is_empty());
    }

    // A name mismatch takes precedence over a given name match.
    #[test]
    fn name_precedence() {
        let kyc = KycMatchResponse {
            name_match: Some(MatchResult::False),
            given_name_match: Some(MatchResult::True),
            ..KycMatchResponse::default()
        };

        let verification = evaluate(kyc, age(MatchResult::NotAvailable), 18);
        assert!(!verification.kyc_verified);
        assert!(!verification.age_verified);
        assert!(!verification.can_play);
        assert_eq!(verification.recommendations.len(), 3);
    }

    #[test]
    fn required_details() {
        let registration: PokerRegistration = serde_json::from_value(serde_json::json!({
            "phoneNumber": "+34629255833",
            "givenName": "Federica",
            "birthdate": "1978-08-22"
        }))
        .expect("should deserialize");
        assert_eq!(registration.details.value(KycField::FamilyName), None);
        assert_eq!(registration.details.fields(), vec![KycField::GivenName, KycField::Birthdate]);
    }
}
