//! # Client Credentials
//!
//! Applications authenticate to `bc-authorize` and `/token` with HTTP Basic
//! authentication. Some gateway applications are provisioned per capability,
//! so credentials can be set per capability with a default fallback.

use std::collections::HashMap;
use std::fmt::{self, Debug};

use base64ct::{Base64, Encoding};

use crate::capability::Capability;
use crate::error::Error;

/// A client id and secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The application's client id.
    pub client_id: String,

    /// The application's client secret.
    pub client_secret: String,
}

impl Credentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// The `Authorization` header value for HTTP Basic authentication.
    #[must_use]
    pub fn basic_auth(&self) -> String {
        let encoded =
            Base64::encode_string(format!("{}:{}", self.client_id, self.client_secret).as_bytes());
        format!("Basic {encoded}")
    }

    /// Whether the id and secret are both UUIDs, the form issued by the
    /// gateway.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        uuid::Uuid::parse_str(&self.client_id).is_ok()
            && uuid::Uuid::parse_str(&self.client_secret).is_ok()
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

/// Credentials to use for each capability.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSet {
    default: Option<Credentials>,
    capabilities: HashMap<Capability, Credentials>,
}

impl CredentialSet {
    /// Create a set using `credentials` for every capability.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            default: Some(credentials),
            capabilities: HashMap::new(),
        }
    }

    /// Set the credentials used for capabilities without their own.
    #[must_use]
    pub fn with_default(mut self, credentials: Credentials) -> Self {
        self.default = Some(credentials);
        self
    }

    /// Set the credentials used for `capability`.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability, credentials: Credentials) -> Self {
        self.capabilities.insert(capability, credentials);
        self
    }

    /// Whether no credentials have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.capabilities.is_empty()
    }

    /// Every credential pair in the set.
    pub fn iter(&self) -> impl Iterator<Item = &Credentials> {
        self.default.iter().chain(self.capabilities.values())
    }

    /// The credentials for `capability`, falling back to the default pair.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Configuration`] if neither capability-specific nor
    /// default credentials are set.
    pub fn get(&self, capability: Capability) -> Result<&Credentials, Error> {
        self.capabilities.get(&capability).or(self.default.as_ref()).ok_or_else(|| {
            Error::Configuration(format!("no client credentials configured for {capability}"))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_auth() {
        let creds = Credentials::new("client", "secret");
        assert_eq!(creds.basic_auth(), "Basic Y2xpZW50OnNlY3JldA==");
        assert!(!creds.is_well_formed());
        assert!(format!("{creds:?}").contains("[redacted]"));
    }

    #[test]
    fn capability_fallback() {
        let kyc = Credentials::new("kyc-id", "kyc-secret");
        let set = CredentialSet::new(Credentials::new("id", "secret"))
            .with_capability(Capability::KycMatch, kyc.clone());

        assert_eq!(set.get(Capability::KycMatch).expect("should have creds"), &kyc);
        assert_eq!(set.get(Capability::SimSwap).expect("should have creds").client_id, "id");

        let empty = CredentialSet::default();
        let err = empty.get(Capability::SimSwap).expect_err("should fail");
        assert!(matches!(err, Error::Configuration(_)));
    }
}
