//! Error types for matchforge
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API,
//! and convert to `tonic::Status` codes at the RPC boundary.

use thiserror::Error;
use tonic::Status;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },
}

/// Errors raised while fetching validation data from the IAM service.
///
/// During `TokenValidator::initialize` any of these aborts startup; during
/// the periodic background refresh they are logged and the next interval
/// acts as the retry.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid IAM client configuration: {0}")]
    Configuration(String),

    #[error("Client credential grant failed: {0}")]
    TokenGrant(String),

    #[error("Client credential grant returned an unusable token: {0}")]
    InvalidTokenGrant(String),

    #[error("Failed to fetch JWKS: {0}")]
    Jwks(String),

    #[error("Failed to fetch revocation list: {0}")]
    RevocationList(String),

    #[error("Failed to fetch role '{role_id}': {reason}")]
    Role { role_id: String, reason: String },
}

/// Token validation failures.
///
/// All of these map to `UNAUTHENTICATED` at the RPC boundary.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token header carries no key id")]
    MissingKeyId,

    #[error("No signing key cached for key id '{0}'")]
    UnknownKey(String),

    #[error("Token has been revoked")]
    Revoked,

    #[error("User has been revoked")]
    UserRevoked,

    #[error("Token lacks the required permission")]
    Permission,

    #[error("Token claim '{0}' is missing")]
    MissingClaim(&'static str),

    #[error("Token decode failed: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),
}

/// Errors produced by the full authorization path (decode + revocation +
/// permission resolution). Role lookups can fail on the network, which is
/// an internal fault rather than a caller problem.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl AuthError {
    /// Map an authorization outcome to the RPC status contract:
    /// token-validation failures are `UNAUTHENTICATED`, anything
    /// unexpected is `INTERNAL` carrying the error text.
    pub fn into_status(self) -> Status {
        match self {
            AuthError::Token(e) => Status::unauthenticated(e.to_string()),
            AuthError::Fetch(e) => Status::internal(e.to_string()),
        }
    }
}

/// Game-rule parsing and validation errors
#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Malformed rules JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}

impl From<RulesError> for Status {
    fn from(err: RulesError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}
