//! # Club Admission
//!
//! Bulk age verification of a guest list. Guests are verified one at a time
//! with a pause between gateway calls. A failure for one guest is recorded in
//! their result and does not stop the others.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::client::CibaClient;
use crate::error::{ErrorResponse, invalid};
use crate::phone::PhoneNumber;
use crate::types::{AgeVerificationRequest, AgeVerificationResponse, DEFAULT_AGE_THRESHOLD};
use crate::Result;

/// A guest to verify.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Guest {
    /// The guest's name.
    pub name: String,

    /// The guest's phone number.
    pub phone_number: String,
}

/// Whether a guest was verified.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GuestStatus {
    /// The verification sequence completed.
    Verified,

    /// The guest's details were incomplete or verification failed.
    Error,
}

/// The outcome for a single guest.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuestResult {
    /// The guest's name.
    pub name: String,

    /// The guest's phone number.
    pub phone_number: String,

    /// Verification status.
    pub status: GuestStatus,

    /// Whether the guest may enter.
    pub can_enter: bool,

    /// The age verification result, when verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_result: Option<AgeVerificationResponse>,

    /// Why the guest could not be verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counts across the guest list.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of guests.
    pub total: usize,

    /// Guests who may enter.
    pub can_enter: usize,

    /// Guests who may not enter, including those in error.
    pub cannot_enter: usize,

    /// Guests who could not be verified.
    pub errors: usize,
}

/// The outcome for a guest list.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BulkVerification {
    /// Counts across the guest list.
    pub summary: Summary,

    /// Per-guest results, in list order.
    pub results: Vec<GuestResult>,
}

/// Verify each guest is of legal age.
///
/// Guests are verified sequentially, waiting `pacing` after each gateway
/// verification except the last. Guests without a name or with a missing or
/// malformed phone number are recorded as errors without calling the gateway
/// or pausing.
///
/// # Errors
///
/// Returns an [`Error::Validation`](crate::Error::Validation) if the guest list is empty.
#[instrument(level = "debug", skip(client, guests), fields(guests = guests.len()))]
pub async fn admit_guests(
    client: &CibaClient, guests: &[Guest], pacing: Duration,
) -> Result<BulkVerification> {
    if guests.is_empty() {
        return Err(invalid!("a list of guests is required"));
    }

    let payload = AgeVerificationRequest::new(DEFAULT_AGE_THRESHOLD);
    let mut results = Vec::with_capacity(guests.len());

    for (i, guest) in guests.iter().enumerate() {
        if guest.name.trim().is_empty() || guest.phone_number.trim().is_empty() {
            results.push(GuestResult::error(
                guest,
                "incomplete details: name and phone number are required",
            ));
            continue;
        }
        let phone = match PhoneNumber::parse(&guest.phone_number) {
            Ok(phone) => phone,
            Err(e) => {
                warn!(guest = %guest.name, error = %e, "guest phone number rejected");
                results.push(GuestResult::error(guest, ErrorResponse::from(e).error));
                continue;
            }
        };

        match client.perform_full_verification(phone.as_str(), &payload).await {
            Ok(age) => {
                let can_enter = age.age_check.is_match();
                info!(guest = %guest.name, can_enter, "guest verified");
                results.push(GuestResult {
                    name: guest.name.clone(),
                    phone_number: guest.phone_number.clone(),
                    status: GuestStatus::Verified,
                    can_enter,
                    verification_result: Some(age),
                    error: None,
                });
            }
            Err(e) => {
                warn!(guest = %guest.name, error = %e, "guest verification failed");
                results.push(GuestResult::error(guest, ErrorResponse::from(e).error));
            }
        }

        if i < guests.len() - 1 {
            sleep(pacing).await;
        }
    }

    let can_enter = results.iter().filter(|r| r.can_enter).count();
    let summary = Summary {
        total: guests.len(),
        can_enter,
        cannot_enter: results.len() - can_enter,
        errors: results.iter().filter(|r| r.status == GuestStatus::Error).count(),
    };

    Ok(BulkVerification { summary, results })
}

impl GuestResult {
    fn error(guest: &Guest, message: impl Into<String>) -> Self {
        Self {
            name: guest.name.clone(),
            phone_number: guest.phone_number.clone(),
            status: GuestStatus::Error,
            can_enter: false,
            verification_result: None,
            error: Some(message.into()),
        }
    }
}
