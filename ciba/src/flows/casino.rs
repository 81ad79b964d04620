//! # Casino Withdrawal
//!
//! Winnings may only be withdrawn by a customer confirmed to be of legal
//! age.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::CibaClient;
use crate::error::invalid;
use crate::phone::PhoneNumber;
use crate::types::{AgeVerificationRequest, AgeVerificationResponse, DEFAULT_AGE_THRESHOLD};
use crate::Result;

/// A request to withdraw winnings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    /// The customer's phone number.
    pub phone_number: String,

    /// Amount to withdraw, in euros.
    pub amount: f64,
}

/// The outcome of a withdrawal request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResult {
    /// The age verification result.
    #[serde(flatten)]
    pub age: AgeVerificationResponse,

    /// Whether the withdrawal may proceed.
    pub can_withdraw: bool,

    /// End-user message.
    pub message: String,

    /// Amount released: the requested amount, or zero if refused.
    pub withdraw_amount: f64,
}

/// Verify the customer is of legal age before releasing a withdrawal.
///
/// Only a confirmed age check allows the withdrawal: an age check that could
/// not be determined refuses it.
///
/// # Errors
///
/// Returns an [`Error::Validation`](crate::Error::Validation) for an invalid phone number or a
/// non-positive amount, or the error of the verification step that failed.
#[instrument(level = "debug", skip(client, request))]
pub async fn withdraw(client: &CibaClient, request: &WithdrawRequest) -> Result<WithdrawResult> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(invalid!("amount must be greater than zero"));
    }
    let phone = PhoneNumber::parse(&request.phone_number)?;

    let payload = AgeVerificationRequest::new(DEFAULT_AGE_THRESHOLD);
    let age = client.perform_full_verification(phone.as_str(), &payload).await?;

    let can_withdraw = age.age_check.is_match();
    let (message, withdraw_amount) = if can_withdraw {
        (format!("verification succeeded: you can withdraw €{}", request.amount), request.amount)
    } else {
        ("withdrawal refused: age verification failed".to_string(), 0.0)
    };

    Ok(WithdrawResult {
        age,
        can_withdraw,
        message,
        withdraw_amount,
    })
}
