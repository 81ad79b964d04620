//! # Customer Onboarding
//!
//! Match the customer data supplied at onboarding against the operator's
//! records for the customer's phone number.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::CibaClient;
use crate::error::invalid;
use crate::phone::PhoneNumber;
use crate::types::{KycField, KycMatchRequest, KycMatchResponse, MatchResult};
use crate::Result;

/// The interpreted outcome of a KYC match.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KycVerification {
    /// The raw match result.
    #[serde(flatten)]
    pub result: KycMatchResponse,

    /// At least one field matched and none failed.
    pub is_verified: bool,

    /// Mean score (0-100) of the checked fields: 100 for a match, the
    /// reported similarity score for a mismatch. Unavailable fields are not
    /// scored.
    pub overall_score: u8,

    /// End-user message.
    pub message: String,

    /// Requested fields that matched.
    pub verified_fields: Vec<KycField>,

    /// Requested fields that did not match.
    pub failed_fields: Vec<KycField>,

    /// Requested fields the operator could not check.
    pub unavailable_fields: Vec<KycField>,
}

/// Match the customer's data against the operator's records.
///
/// # Errors
///
/// Returns an [`Error::Validation`](crate::Error::Validation) for an invalid phone number or when no
/// field is provided, or the error of the verification step that failed.
#[instrument(level = "debug", skip(client, phone, request))]
pub async fn verify_customer(
    client: &CibaClient, phone: &str, request: &KycMatchRequest,
) -> Result<KycVerification> {
    let phone = PhoneNumber::parse(phone)?;
    let requested = request.fields();
    if requested.is_empty() {
        return Err(invalid!("at least one field besides the phone number must be provided"));
    }

    let result = client.perform_full_verification(phone.as_str(), request).await?;
    Ok(evaluate(result, &requested))
}

/// Interpret a match result for the requested fields.
#[must_use]
pub fn evaluate(result: KycMatchResponse, requested: &[KycField]) -> KycVerification {
    let mut verified_fields = vec![];
    let mut failed_fields = vec![];
    let mut unavailable_fields = vec![];
    let mut total_score = 0_u32;
    let mut scored = 0_u32;

    for &field in requested {
        match result.result(field) {
            Some(MatchResult::True) => {
                verified_fields.push(field);
                total_score += 100;
                scored += 1;
            }
            Some(MatchResult::False) => {
                failed_fields.push(field);
                if let Some(score) = result.score(field) {
                    total_score += u32::from(score);
                    scored += 1;
                }
            }
            Some(MatchResult::NotAvailable) => unavailable_fields.push(field),
            None => {}
        }
    }

    let overall_score = mean(total_score, scored);
    let is_verified = !verified_fields.is_empty() && failed_fields.is_empty();
    let checked = verified_fields.len() + failed_fields.len() + unavailable_fields.len();

    let mut message = if is_verified {
        format!("verification succeeded: {} of {checked} fields matched", verified_fields.len())
    } else if verified_fields.is_empty() {
        "verification failed: no field could be matched".to_string()
    } else {
        format!(
            "partial verification: {} fields matched, {} failed",
            verified_fields.len(),
            failed_fields.len()
        )
    };
    if !unavailable_fields.is_empty() {
        message.push_str(&format!(", {} fields unavailable", unavailable_fields.len()));
    }

    KycVerification {
        result,
        is_verified,
        overall_score,
        message,
        verified_fields,
        failed_fields,
        unavailable_fields,
    }
}

// Rounded mean, half away from zero.
pub(crate) fn mean(total: u32, count: u32) -> u8 {
    if count == 0 {
        return 0;
    }
    u8::try_from((2 * total + count) / (2 * count)).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scoring() {
        let result = KycMatchResponse {
            id_document_match: Some(MatchResult::True),
            given_name_match: Some(MatchResult::False),
            given_name_match_score: Some(85),
            email_match: Some(MatchResult::NotAvailable),
            ..KycMatchResponse::default()
        };
        let requested = [KycField::IdDocument, KycField::GivenName, KycField::Email];

        let verification = evaluate(result, &requested);
        assert!(!verification.is_verified);
        assert_eq!(verification.overall_score, 93);
        assert_eq!(verification.verified_fields, vec![KycField::IdDocument]);
        assert_eq!(verification.failed_fields, vec![KycField::GivenName]);
        assert_eq!(verification.unavailable_fields, vec![KycField::Email]);
    }

    // An unavailable field must not count against the customer.
    #[test]
    fn unavailable_is_not_failure() {
        let result = KycMatchResponse {
            birthdate_match: Some(MatchResult::True),
            address_match: Some(MatchResult::NotAvailable),
            ..KycMatchResponse::default()
        };

        let verification = evaluate(result, &[KycField::Birthdate, KycField::Address]);
        assert!(verification.is_verified);
        assert_eq!(verification.overall_score, 100);
        assert!(verification.failed_fields.is_empty());
    }

    #[test]
    fn rounded_mean() {
        assert_eq!(mean(0, 0), 0);
        assert_eq!(mean(185, 2), 93);
        assert_eq!(mean(184, 2), 92);
    }
}
