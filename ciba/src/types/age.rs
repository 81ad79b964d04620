use serde::{Deserialize, Serialize};

use crate::capability::{Capability, Verification};
use crate::types::MatchResult;

/// Default minimum age checked by the demo flows.
pub const DEFAULT_AGE_THRESHOLD: u8 = 18;

/// Request to verify the subject is at least `age_threshold` years old.
///
/// The phone number is not part of the body: the subject is identified by
/// the access token.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgeVerificationRequest {
    /// Minimum age in years.
    pub age_threshold: u8,

    /// Also report whether a content lock is active on the line.
    #[serde(default)]
    pub include_content_lock: bool,

    /// Also report whether parental control is active on the line.
    #[serde(default)]
    pub include_parental_control: bool,
}

impl AgeVerificationRequest {
    /// Create a request for the threshold with no optional checks.
    #[must_use]
    pub const fn new(age_threshold: u8) -> Self {
        Self {
            age_threshold,
            include_content_lock: false,
            include_parental_control: false,
        }
    }
}

impl Default for AgeVerificationRequest {
    fn default() -> Self {
        Self::new(DEFAULT_AGE_THRESHOLD)
    }
}

impl Verification for AgeVerificationRequest {
    type Response = AgeVerificationResponse;

    const CAPABILITY: Capability = Capability::AgeVerification;
}

/// Age verification result.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgeVerificationResponse {
    /// Whether the subject meets the age threshold.
    pub age_check: MatchResult,

    /// Whether the line holder's identity has been verified by the operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_status: Option<bool>,

    /// Confidence (0-100) that the line holder is the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_match_score: Option<u8>,

    /// Content lock status, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_lock: Option<MatchResult>,

    /// Parental control status, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parental_control: Option<MatchResult>,
}
