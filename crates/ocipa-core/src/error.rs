//! Identity directory error types.
//!
//! Every call the analyzer makes to the identity directory can fail on its
//! own. The analyzer absorbs these failures at the granularity of one
//! compartment or one identifier, so the error type only needs to carry
//! enough detail to name the cause in a warning.

use std::fmt;

use serde::Serialize;

/// Errors returned by an [`IdentityGateway`](crate::gateway::IdentityGateway).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The requested resource does not exist (or is hidden from the caller).
    #[error("Not found: {resource}")]
    NotFound {
        /// Identifier or description of the missing resource.
        resource: String,
    },

    /// The caller is not authorized to read the resource.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description of the denial.
        message: String,
    },

    /// A transport failure, throttling response or server-side error.
    #[error("Transient error: {message}")]
    Transient {
        /// Description of the failure.
        message: String,
    },

    /// The directory answered with something that could not be decoded.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the decoding failure.
        message: String,
    },
}

impl GatewayError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `Transient` error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates a new `Protocol` error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns `true` if repeating the same request might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Coarse classification, carried in logs and scan warnings.
    #[must_use]
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::NotFound { .. } => GatewayErrorKind::NotFound,
            Self::AccessDenied { .. } => GatewayErrorKind::AccessDenied,
            Self::Transient { .. } => GatewayErrorKind::Transient,
            Self::Protocol { .. } => GatewayErrorKind::Protocol,
        }
    }
}

/// Coarse classification of [`GatewayError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    NotFound,
    AccessDenied,
    Transient,
    Protocol,
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AccessDenied => write!(f, "access_denied"),
            Self::Transient => write!(f, "transient"),
            Self::Protocol => write!(f, "protocol"),
        }
    }
}

/// Result alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;
