//! # Capabilities
//!
//! Each verification capability offered by the gateway is described by the
//! scope requested at `bc-authorize` and the resource path called with the
//! resulting access token. A single parameterised client serves them all.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, invalid};

/// A verification capability.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Minimum age check (KYC Age Verification).
    AgeVerification,

    /// Customer data match (KYC Match).
    KycMatch,

    /// Device location verification.
    DeviceLocation,

    /// Recent SIM change check.
    SimSwap,
}

impl Capability {
    /// Every supported capability.
    pub const ALL: [Self; 4] =
        [Self::AgeVerification, Self::KycMatch, Self::DeviceLocation, Self::SimSwap];

    /// The scope to request at `bc-authorize`.
    #[must_use]
    pub const fn scope(self) -> &'static str {
        match self {
            Self::AgeVerification => {
                "dpv:FraudPreventionAndDetection kyc-age-verification:verify"
            }
            Self::KycMatch => "dpv:FraudPreventionAndDetection#kyc-match:match",
            Self::DeviceLocation => "dpv:FraudPreventionAndDetection#device-location-read",
            Self::SimSwap => "dpv:FraudPreventionAndDetection#sim-swap",
        }
    }

    /// The resource path, relative to the gateway base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::AgeVerification => "/kyc-age-verification/v0.1/verify",
            Self::KycMatch => "/kyc-match/v0.2/match",
            Self::DeviceLocation => "/location/v0/verify",
            Self::SimSwap => "/sim-swap/v0/check",
        }
    }

    /// Short name, as used in configuration and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgeVerification => "age-verification",
            Self::KycMatch => "kyc-match",
            Self::DeviceLocation => "device-location",
            Self::SimSwap => "sim-swap",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| invalid!("unsupported capability: {s}"))
    }
}

/// A capability request payload.
///
/// Implemented by each capability's request type so that the resource call
/// is typed by its payload: the path comes from `CAPABILITY` and the
/// response is decoded as `Response`.
pub trait Verification: Serialize + Send + Sync {
    /// The result returned by the capability endpoint.
    type Response: DeserializeOwned + Send;

    /// The capability the payload is sent to.
    const CAPABILITY: Capability;
}
