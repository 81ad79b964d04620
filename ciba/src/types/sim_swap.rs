use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, Verification};
use crate::phone::PhoneNumber;

/// Default SIM swap look-back window, in hours.
pub const DEFAULT_MAX_AGE: u16 = 240;

/// Maximum SIM swap look-back window, in hours.
pub const MAX_AGE_LIMIT: u16 = 2400;

/// Request to check whether the subject's SIM changed within the last
/// `max_age` hours.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimSwapRequest {
    /// E.164 phone number, including the leading `+`.
    pub phone_number: String,

    /// Look-back window in hours.
    pub max_age: u16,
}

impl SimSwapRequest {
    /// Create a request for the subject and window.
    #[must_use]
    pub fn new(phone: &PhoneNumber, max_age: u16) -> Self {
        Self {
            phone_number: phone.to_string(),
            max_age,
        }
    }
}

impl Verification for SimSwapRequest {
    type Response = SimSwapResponse;

    const CAPABILITY: Capability = Capability::SimSwap;
}

/// SIM swap check result.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimSwapResponse {
    /// Whether the SIM changed within the window.
    pub swapped: bool,

    /// Time of the most recent SIM change, when known and within the
    /// operator's retention period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_sim_change: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn round_trip() {
        let phone = PhoneNumber::parse("tel:+34629255833").expect("should parse");
        let request = SimSwapRequest::new(&phone, DEFAULT_MAX_AGE);
        let ser = serde_json::to_value(&request).expect("should serialize");
        assert_eq!(ser, json!({"phoneNumber": "+34629255833", "maxAge": 240}));

        let response: SimSwapResponse = serde_json::from_value(
            json!({"swapped": true, "latestSimChange": "2024-09-18T07:37:53.471Z"}),
        )
        .expect("should deserialize");
        assert!(response.swapped);
        assert!(response.latest_sim_change.is_some());

        let response: SimSwapResponse =
            serde_json::from_value(json!({"swapped": false, "latestSimChange": null}))
                .expect("should deserialize");
        assert_eq!(response.latest_sim_change, None);
    }
}
