use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Token Request exchanging a backchannel `auth_req_id` for an access token.
///
/// Sent as `application/x-www-form-urlencoded`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenRequest {
    /// Authorization grant type.
    pub grant_type: GrantType,

    /// The `auth_req_id` returned by the `bc-authorize` endpoint, unchanged.
    pub auth_req_id: String,
}

impl TokenRequest {
    /// Create a CIBA token request for the authentication request.
    #[must_use]
    pub fn new(auth_req_id: impl Into<String>) -> Self {
        Self {
            grant_type: GrantType::Ciba,
            auth_req_id: auth_req_id.into(),
        }
    }
}

/// Token grant types supported by the client.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum GrantType {
    /// OpenID Connect CIBA grant.
    #[default]
    #[serde(rename = "urn:openid:params:grant-type:ciba")]
    Ciba,
}

/// Token Response as returned by the gateway.
///
/// `access_token` is optional here so a response lacking it can be reported
/// as a token failure rather than a decoding error.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// The access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// The type of the token issued, typically "`Bearer`".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// The lifetime in seconds of the access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// An access token authorizing exactly one capability resource call.
///
/// [`crate::CibaClient::perform_verification`] consumes the grant. Tokens are
/// neither refreshed nor cached: each verification starts a new flow.
#[derive(PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer token for the resource call.
    pub access_token: String,

    /// The type of the token issued.
    pub token_type: String,

    /// The lifetime in seconds of the access token.
    pub expires_in: i64,

    /// The capability the token was issued for.
    pub capability: Capability,
}

impl Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("capability", &self.capability)
            .finish()
    }
}
