//! # CIBA Errors
//!
//! This module defines the errors returned by the verification client. Each
//! step of the backchannel sequence has its own variant carrying the upstream
//! HTTP status and response body, leaving presentation to the caller.

use std::fmt::{self, Display};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A step in the backchannel verification sequence.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Backchannel authentication request (`POST /bc-authorize`).
    Authorize,

    /// Token exchange (`POST /token`).
    Token,

    /// Capability resource call using the access token.
    Verify,
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorize => write!(f, "bc-authorize"),
            Self::Token => write!(f, "token"),
            Self::Verify => write!(f, "verify"),
        }
    }
}

/// Errors raised while verifying a subject.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The request was rejected before any network call was made: a
    /// malformed phone number or missing required fields.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The `bc-authorize` call returned a non-2xx response or no
    /// `auth_req_id`.
    #[error("bc-authorize failed: {status} - {body}")]
    Authorization {
        /// HTTP status returned by the gateway.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// The token exchange returned a non-2xx response or no
    /// `access_token`. This includes the end-user not approving the
    /// backchannel request in time.
    #[error("token request failed: {status} - {body}")]
    Token {
        /// HTTP status returned by the gateway.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// The capability resource call returned a non-2xx response or a body
    /// that could not be read as the capability's result.
    #[error("verification failed: {status} - {body}")]
    Verification {
        /// HTTP status returned by the gateway.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// The gateway kept returning HTTP 500, or could not be reached, for
    /// every attempt allowed by the retry policy.
    #[error("{step} failed after retries: {message}")]
    Transient {
        /// The step that failed.
        step: Step,
        /// HTTP status of the last attempt, when a response was received.
        status: Option<u16>,
        /// Description of the last failure.
        message: String,
    },

    /// Credentials or settings required by the client are missing.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Build the step-specific error for a failed response.
    #[must_use]
    pub fn from_step(step: Step, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match step {
            Step::Authorize => Self::Authorization { status, body },
            Step::Token => Self::Token { status, body },
            Step::Verify => Self::Verification { status, body },
        }
    }

    /// The upstream HTTP status code, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Authorization { status, .. }
            | Self::Token { status, .. }
            | Self::Verification { status, .. } => Some(*status),
            Self::Transient { status, .. } => *status,
            Self::Validation(_) | Self::Configuration(_) => None,
        }
    }

    /// The upstream response body, if a response was received.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Authorization { body, .. }
            | Self::Token { body, .. }
            | Self::Verification { body, .. } => Some(body.as_str()),
            Self::Transient { status: Some(_), message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// The step of the sequence that failed. Validation and configuration
    /// errors happen before the sequence starts.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::Authorization { .. } => Some(Step::Authorize),
            Self::Token { .. } => Some(Step::Token),
            Self::Verification { .. } => Some(Step::Verify),
            Self::Transient { step, .. } => Some(*step),
            Self::Validation(_) | Self::Configuration(_) => None,
        }
    }

    /// Whether the error was a transient service failure.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Map the error to the classification used for end-user messaging.
    ///
    /// Upstream KYC error codes are only read from the body of a rejected
    /// capability call. Errors from the authorization and token steps are
    /// classified by HTTP status alone.
    #[must_use]
    pub fn classify(&self) -> Classification {
        if let Self::Validation(msg) = self {
            return Classification::InvalidRequest(msg.clone());
        }

        if let Self::Verification { body, .. } = self {
            if body.contains("INVALID_PARAM_COMBINATION") {
                return Classification::InvalidParamCombination;
            }
            if body.contains("ID_DOCUMENT_REQUIRED") {
                return Classification::IdDocumentRequired;
            }
            if body.contains("ID_DOCUMENT_MISMATCH") {
                return Classification::IdDocumentMismatch;
            }
        }

        match self.status() {
            Some(401) => Classification::InvalidCredentials,
            Some(403) => Classification::NotAuthorized,
            Some(404) => Classification::ServiceUnavailable,
            Some(422) => Classification::InvalidPayload,
            _ => Classification::Other(self.to_string()),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Presentational classification of an [`Error`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The request failed validation.
    InvalidRequest(String),

    /// HTTP 401: the client id/secret pair was rejected.
    InvalidCredentials,

    /// HTTP 403: the application may not verify this subject or scope.
    NotAuthorized,

    /// HTTP 404: the capability endpoint is not available.
    ServiceUnavailable,

    /// HTTP 422: the verification payload was rejected.
    InvalidPayload,

    /// Upstream `INVALID_PARAM_COMBINATION`.
    InvalidParamCombination,

    /// Upstream `ID_DOCUMENT_REQUIRED`.
    IdDocumentRequired,

    /// Upstream `ID_DOCUMENT_MISMATCH`.
    IdDocumentMismatch,

    /// Anything else, with the raw error message.
    Other(String),
}

impl Classification {
    /// The HTTP status to report to the caller.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidParamCombination => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotAuthorized | Self::IdDocumentRequired | Self::IdDocumentMismatch => {
                StatusCode::FORBIDDEN
            }
            Self::ServiceUnavailable => StatusCode::NOT_FOUND,
            Self::InvalidPayload => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// End-user message for the classification.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) | Self::Other(msg) => msg.clone(),
            Self::InvalidCredentials => "invalid credentials".to_string(),
            Self::NotAuthorized => "not authorized for this phone/scope".to_string(),
            Self::ServiceUnavailable => "service endpoint unavailable".to_string(),
            Self::InvalidPayload => "invalid verification payload".to_string(),
            Self::InvalidParamCombination => "invalid parameter combination".to_string(),
            Self::IdDocumentRequired => {
                "identity document required for this verification".to_string()
            }
            Self::IdDocumentMismatch => {
                "identity document does not match the phone number".to_string()
            }
        }
    }
}

/// Structured error returned to callers of the demo flows.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// End-user message.
    pub error: String,

    /// HTTP status code.
    pub status_code: u16,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        let classification = err.classify();
        Self {
            error: classification.message(),
            status_code: classification.status_code().as_u16(),
        }
    }
}

impl From<Error> for ErrorResponse {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

/// Construct an `Error::Validation` error from a format string.
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Validation(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Validation(format!($err))
    };
}
pub(crate) use invalid;

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn step_errors() {
        let err = Error::from_step(Step::Token, 403, r#"{"error":"access_denied"}"#);
        assert_eq!(err.step(), Some(Step::Token));
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.to_string(),
            r#"token request failed: 403 - {"error":"access_denied"}"#
        );
    }

    #[test]
    fn classify_status() {
        let cases = [
            (401, Classification::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (403, Classification::NotAuthorized, StatusCode::FORBIDDEN),
            (404, Classification::ServiceUnavailable, StatusCode::NOT_FOUND),
            (422, Classification::InvalidPayload, StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (status, expected, code) in cases {
            let classification = Error::from_step(Step::Authorize, status, "{}").classify();
            assert_eq!(classification, expected);
            assert_eq!(classification.status_code(), code);
        }
    }

    // Unknown statuses pass the raw message through.
    #[test]
    fn classify_other() {
        let err = Error::from_step(Step::Verify, 409, "conflict");
        let Classification::Other(msg) = err.classify() else {
            panic!("should be unclassified");
        };
        assert_eq!(msg, "verification failed: 409 - conflict");
    }

    #[test]
    fn classify_upstream_code() {
        let body = r#"{"status":403,"code":"ID_DOCUMENT_MISMATCH","message":"mismatch"}"#;
        let err = Error::from_step(Step::Verify, 403, body);
        assert_eq!(err.classify(), Classification::IdDocumentMismatch);
    }

    // KYC codes in an authorization or token error body do not override the
    // HTTP status.
    #[test]
    fn classify_code_outside_verify() {
        let body = r#"{"code":"ID_DOCUMENT_REQUIRED","message":"bad client"}"#;
        let err = Error::from_step(Step::Authorize, 401, body);
        assert_eq!(err.classify(), Classification::InvalidCredentials);

        let body = r#"{"code":"INVALID_PARAM_COMBINATION"}"#;
        let err = Error::from_step(Step::Token, 403, body);
        assert_eq!(err.classify(), Classification::NotAuthorized);
    }

    #[test]
    fn transient() {
        let err = Error::Transient {
            step: Step::Authorize,
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), None);
        assert!(matches!(err.classify(), Classification::Other(_)));
    }

    #[test]
    fn error_response() {
        let err = Error::from_step(Step::Token, 403, "{}");
        let ser = serde_json::to_value(ErrorResponse::from(&err)).expect("should serialize");
        assert_eq!(
            ser,
            json!({"error": "not authorized for this phone/scope", "statusCode": 403})
        );

        let err = invalid!("phone number {} is not valid", "+34000000000");
        let resp = ErrorResponse::from(err);
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.error, "phone number +34000000000 is not valid");
    }
}
