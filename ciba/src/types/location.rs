use std::fmt::{self, Display};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, Verification};
use crate::phone::PhoneNumber;

/// Request to verify the subject's device is within `accuracy` km of a
/// point.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationVerificationRequest {
    /// The device to locate.
    pub ue_id: UeId,

    /// Latitude of the area centre, in degrees.
    pub latitude: f64,

    /// Longitude of the area centre, in degrees.
    pub longitude: f64,

    /// Radius of the area, in km.
    pub accuracy: u32,
}

impl LocationVerificationRequest {
    /// Create a request for the device identified by `phone`.
    #[must_use]
    pub fn new(phone: &PhoneNumber, latitude: f64, longitude: f64, accuracy: u32) -> Self {
        Self {
            ue_id: UeId {
                msisdn: phone.to_string(),
            },
            latitude,
            longitude,
            accuracy,
        }
    }
}

impl Verification for LocationVerificationRequest {
    type Response = LocationVerificationResponse;

    const CAPABILITY: Capability = Capability::DeviceLocation;
}

/// User equipment identifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UeId {
    /// E.164 phone number, including the leading `+`.
    pub msisdn: String,
}

/// Device location verification result.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocationVerificationResponse {
    /// Whether the device is in the area.
    pub verification_result: LocationResult,

    /// Estimated overlap (percent) when the result is `PARTIAL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_rate: Option<u8>,

    /// Time of the location information used, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_location_time: Option<String>,
}

/// Outcome of a device location check.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocationResult {
    /// The device is within the area.
    True,

    /// The device is outside the area.
    False,

    /// The device location only partially overlaps the area.
    Partial,

    /// The location could not be determined.
    Unknown,
}

impl LocationResult {
    /// The wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Partial => "PARTIAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for LocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for LocationResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(true) => Ok(Self::True),
            Raw::Bool(false) => Ok(Self::False),
            Raw::Str(s) => match s.to_ascii_uppercase().as_str() {
                "TRUE" => Ok(Self::True),
                "FALSE" => Ok(Self::False),
                "PARTIAL" => Ok(Self::Partial),
                "UNKNOWN" => Ok(Self::Unknown),
                _ => Err(de::Error::unknown_variant(&s, &["TRUE", "FALSE", "PARTIAL", "UNKNOWN"])),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_body() {
        let phone = PhoneNumber::parse("+34629255833").expect("should parse");
        let request = LocationVerificationRequest::new(&phone, 40.4168, -3.7038, 10);

        let ser = serde_json::to_value(&request).expect("should serialize");
        assert_eq!(
            ser,
            json!({
                "ueId": {"msisdn": "+34629255833"},
                "latitude": 40.4168,
                "longitude": -3.7038,
                "accuracy": 10
            })
        );
    }

    #[test]
    fn boolean_result() {
        let response: LocationVerificationResponse =
            serde_json::from_value(json!({"verificationResult": true}))
                .expect("should deserialize");
        assert_eq!(response.verification_result, LocationResult::True);

        let response: LocationVerificationResponse = serde_json::from_value(
            json!({"verificationResult": "PARTIAL", "matchRate": 74}),
        )
        .expect("should deserialize");
        assert_eq!(response.verification_result, LocationResult::Partial);
        assert_eq!(response.match_rate, Some(74));
    }
}
