//! # CIBA Types
//!
//! Request and response types for the backchannel authentication and token
//! endpoints, and for each capability resource.

mod age;
mod authorization;
mod kyc;
mod location;
mod match_result;
mod sim_swap;
mod token;

pub use self::age::*;
pub use self::authorization::*;
pub use self::kyc::*;
pub use self::location::*;
pub use self::match_result::*;
pub use self::sim_swap::*;
pub use self::token::*;
