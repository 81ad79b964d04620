//! A client for network-based identity verification using `OpenID` Connect
//! [Client Initiated Backchannel Authentication](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html)
//! (CIBA) against an operator API gateway.
//!
//! A verification identifies its subject by phone number and runs three
//! calls in sequence: a backchannel authentication request, a token
//! exchange, and a call to the capability resource with the issued access
//! token. Supported capabilities are age verification, KYC match, device
//! location and SIM swap.
//!
//! # Example
//!
//! ```rust,no_run
//! use credibil_ciba::{AgeVerificationRequest, CibaClient, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let client = CibaClient::from_config(&config)?;
//!
//! let result = client
//!     .perform_full_verification("+34629255833", &AgeVerificationRequest::new(18))
//!     .await?;
//! println!("age check: {}", result.age_check);
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod config;
pub mod flows;
pub mod types;

mod client;
mod credentials;
mod error;
mod phone;
mod retry;

pub use self::capability::{Capability, Verification};
pub use self::client::{CibaClient, CibaClientBuilder, NoCredentials, WithCredentials};
pub use self::config::Config;
pub use self::credentials::{CredentialSet, Credentials};
pub use self::error::{Classification, Error, ErrorResponse, Step};
pub use self::phone::PhoneNumber;
pub use self::retry::RetryPolicy;
pub use self::types::*;

/// Result type for CIBA verification.
pub type Result<T, E = Error> = anyhow::Result<T, E>;
