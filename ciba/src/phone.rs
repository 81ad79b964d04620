//! # Phone Numbers
//!
//! The subject of every verification is identified by an E.164 phone number.
//! Numbers are validated before any network call is made.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, invalid};

const TEL_SCHEME: &str = "tel:";
const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 15;

/// A validated phone number: `+` followed by 10 to 15 digits.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and validate a phone number. A leading `tel:` scheme is
    /// accepted and stripped.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Validation`] if the number is not `+` followed by
    /// 10 to 15 digits.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let number = value.strip_prefix(TEL_SCHEME).unwrap_or(value);

        let Some(digits) = number.strip_prefix('+') else {
            return Err(invalid!("phone number must start with '+': {number}"));
        };
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len())
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid!(
                "phone number must be '+' followed by {MIN_DIGITS}-{MAX_DIGITS} digits: {number}"
            ));
        }

        Ok(Self(number.to_string()))
    }

    /// The number as a `tel:` URI, as used for `login_hint`.
    #[must_use]
    pub fn login_hint(&self) -> String {
        format!("{TEL_SCHEME}{}", self.0)
    }

    /// The number, including the leading `+`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhoneNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}
