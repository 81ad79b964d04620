use std::fmt::{self, Display};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Three-valued outcome of checking a single attribute.
///
/// `NotAvailable` (the gateway could not determine the attribute) is kept
/// distinct from `False` (checked and did not match): an unknown must never
/// be reported as a failed check.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
pub enum MatchResult {
    /// The attribute matched or was confirmed.
    #[serde(rename = "true")]
    True,

    /// The attribute was checked and did not match.
    #[serde(rename = "false")]
    False,

    /// The attribute could not be determined.
    #[serde(rename = "not_available")]
    NotAvailable,
}

impl MatchResult {
    /// Returns `true` if the attribute was confirmed.
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns `true` if the attribute was checked and did not match.
    #[must_use]
    pub const fn is_mismatch(self) -> bool {
        matches!(self, Self::False)
    }

    /// Returns `true` if the attribute could not be determined.
    #[must_use]
    pub const fn is_unavailable(self) -> bool {
        matches!(self, Self::NotAvailable)
    }

    /// The wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::NotAvailable => "not_available",
        }
    }
}

impl Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Some sandbox endpoints return JSON booleans rather than the string form.
impl<'de> Deserialize<'de> for MatchResult {
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
            Raw::Str(s) => match s.as_str() {
                "true" => Ok(Self::True),
                "false" => Ok(Self::False),
                "not_available" => Ok(Self::NotAvailable),
                other => Err(de::Error::unknown_variant(other, &[
                    "true",
                    "false",
                    "not_available",
                ])),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn three_valued() {
        let unavailable: MatchResult =
            serde_json::from_value(json!("not_available")).expect("should deserialize");
        let mismatch: MatchResult =
            serde_json::from_value(json!("false")).expect("should deserialize");

        assert_ne!(unavailable, mismatch);
        assert!(unavailable.is_unavailable());
        assert!(!unavailable.is_mismatch());
        assert!(mismatch.is_mismatch());
    }

    #[test]
    fn booleans() {
        let result: MatchResult = serde_json::from_value(json!(true)).expect("should deserialize");
        assert_eq!(result, MatchResult::True);
        assert_eq!(serde_json::to_value(result).expect("should serialize"), json!("true"));
    }

    #[test]
    fn unknown_value() {
        let result = serde_json::from_value::<MatchResult>(json!("maybe"));
        assert!(result.is_err());
    }
}
