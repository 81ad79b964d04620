//! # Verification Flows
//!
//! Business flows built on [`crate::CibaClient`]. Each flow validates its
//! input before any network call, runs one or more full verification
//! sequences, and interprets the capability results for its use case.

pub mod casino;
pub mod disco;
pub mod kyc;
pub mod location;
pub mod poker;
pub mod sim_swap;
