//! Setup errors for the OCI client.
//!
//! These cover everything that must succeed before the first directory call:
//! reading the profile, loading the private key and building the HTTP
//! client. Failures of individual API calls are reported as
//! [`GatewayError`](ocipa_core::GatewayError) instead.

/// Errors raised while preparing an [`IdentityClient`](crate::IdentityClient).
#[derive(Debug, thiserror::Error)]
pub enum OciError {
    /// The OCI config file or profile is missing or incomplete.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The API signing key could not be read or parsed.
    #[error("Invalid private key {path}: {message}")]
    PrivateKey {
        /// Path of the key file.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// A request could not be signed.
    #[error("Failed to sign request: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl OciError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `PrivateKey` error.
    #[must_use]
    pub fn private_key(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PrivateKey {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }
}

/// Result alias for client setup.
pub type OciResult<T> = Result<T, OciError>;
