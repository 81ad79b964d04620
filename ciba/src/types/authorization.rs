use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::phone::PhoneNumber;

/// Backchannel Authentication Request sent to the gateway's `bc-authorize`
/// endpoint to start a CIBA flow for the subject identified by
/// `login_hint`.
///
/// Sent as `application/x-www-form-urlencoded`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// The subject's phone number as a `tel:` URI.
    pub login_hint: String,

    /// Space-delimited scope naming the capability (and data-sharing
    /// purpose) being requested.
    pub scope: String,
}

impl AuthorizationRequest {
    /// Create a request for the subject and capability.
    #[must_use]
    pub fn new(phone: &PhoneNumber, capability: Capability) -> Self {
        Self {
            login_hint: phone.login_hint(),
            scope: capability.scope().to_string(),
        }
    }
}

/// Backchannel Authentication Response as returned by the gateway.
///
/// `auth_req_id` is optional here so a response lacking it can be reported
/// as an authorization failure rather than a decoding error.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationResponse {
    /// Opaque identifier of the authentication request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_req_id: Option<String>,

    /// Lifetime of `auth_req_id` in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Minimum seconds the client should wait between token requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
}

/// A started backchannel authentication, ready to be exchanged for a token.
///
/// The grant is single-use: [`crate::CibaClient::exchange_token`] consumes it.
/// Expiry is enforced by the gateway, not tracked here.
#[derive(Debug, PartialEq, Eq)]
pub struct AuthorizationGrant {
    /// Opaque identifier of the authentication request.
    pub auth_req_id: String,

    /// Lifetime of `auth_req_id` in seconds, when reported.
    pub expires_in: Option<i64>,

    /// Polling interval in seconds, when reported.
    pub interval: Option<i64>,

    /// The capability the grant was requested for.
    pub capability: Capability,
}
