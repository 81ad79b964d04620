//! # Device Location
//!
//! Check a customer's device is within an area, for example to confirm a
//! card payment is made where the customer is.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::CibaClient;
use crate::error::invalid;
use crate::phone::PhoneNumber;
use crate::types::{LocationVerificationRequest, LocationVerificationResponse};
use crate::Result;

/// Smallest supported area radius, in km.
pub const MIN_ACCURACY_KM: u32 = 2;

/// Largest supported area radius, in km.
pub const MAX_ACCURACY_KM: u32 = 200;

/// A circular area.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Latitude of the centre, in degrees.
    pub latitude: f64,

    /// Longitude of the centre, in degrees.
    pub longitude: f64,

    /// Radius, in km.
    pub accuracy_km: u32,
}

impl Area {
    /// Puerta del Sol, Madrid.
    pub const MADRID: Self = Self::new(40.4168, -3.7038, 20);
    /// Port Olímpic, Barcelona.
    pub const BARCELONA: Self = Self::new(41.3851, 2.1734, 8);
    /// City of Arts and Sciences, Valencia.
    pub const VALENCIA: Self = Self::new(39.4699, -0.3763, 12);
    /// Seville Cathedral.
    pub const SEVILLA: Self = Self::new(37.3891, -5.9845, 15);

    /// Create an area.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, accuracy_km: u32) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_km,
        }
    }

    /// A named preset area.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "madrid" => Some(Self::MADRID),
            "barcelona" => Some(Self::BARCELONA),
            "valencia" => Some(Self::VALENCIA),
            "sevilla" | "seville" => Some(Self::SEVILLA),
            _ => None,
        }
    }

    /// Check the area is well formed.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Validation`](crate::Error::Validation) if a coordinate is out of range or the
    /// radius is outside 2-200 km.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid!("latitude must be between -90 and 90"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid!("longitude must be between -180 and 180"));
        }
        if !(MIN_ACCURACY_KM..=MAX_ACCURACY_KM).contains(&self.accuracy_km) {
            return Err(invalid!(
                "accuracy must be between {MIN_ACCURACY_KM} and {MAX_ACCURACY_KM} km"
            ));
        }
        Ok(())
    }
}

/// Check the customer's device is within `area`.
///
/// # Errors
///
/// Returns an [`Error::Validation`](crate::Error::Validation) for an invalid phone number or area, or
/// the error of the verification step that failed.
#[instrument(level = "debug", skip(client, phone))]
pub async fn verify_location(
    client: &CibaClient, phone: &str, area: &Area,
) -> Result<LocationVerificationResponse> {
    let phone = PhoneNumber::parse(phone)?;
    area.validate()?;

    let payload =
        LocationVerificationRequest::new(&phone, area.latitude, area.longitude, area.accuracy_km);
    client.perform_full_verification(phone.as_str(), &payload).await
}
