//! # SIM Swap
//!
//! Check whether a customer's SIM was changed recently, a common signal of
//! account takeover.

use tracing::instrument;

use crate::client::CibaClient;
use crate::error::invalid;
use crate::phone::PhoneNumber;
use crate::types::{MAX_AGE_LIMIT, SimSwapRequest, SimSwapResponse};
use crate::Result;

/// Check whether the customer's SIM changed within the last `max_age` hours.
///
/// # Errors
///
/// Returns an [`Error::Validation`](crate::Error::Validation) for an invalid phone number or a window
/// outside 1-2400 hours, or the error of the verification step that failed.
#[instrument(level = "debug", skip(client, phone))]
pub async fn check(client: &CibaClient, phone: &str, max_age: u16) -> Result<SimSwapResponse> {
    let phone = PhoneNumber::parse(phone)?;
    if !(1..=MAX_AGE_LIMIT).contains(&max_age) {
        return Err(invalid!("max age must be between 1 and {MAX_AGE_LIMIT} hours"));
    }

    let payload = SimSwapRequest::new(&phone, max_age);
    client.perform_full_verification(phone.as_str(), &payload).await
}
