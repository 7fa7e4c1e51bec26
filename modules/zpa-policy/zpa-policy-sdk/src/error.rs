//! Error types for the ZPA policy module.

use thiserror::Error;

/// Errors raised by a [`PolicyRuleBackend`](crate::PolicyRuleBackend).
///
/// These represent transport and remote API failures only. They are
/// propagated to callers unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyBackendError {
    /// The policy set or rule does not exist remotely.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The remote API rejected the request.
    #[error("remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The remote service could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PolicyBackendError {
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors returned by the [`PolicyRulesClient`](crate::PolicyRulesClient).
#[derive(Debug, Error)]
pub enum PolicyRulesError {
    /// The caller's declaration is invalid. Never retried.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// The policy set or rule targeted by the call no longer exists remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// A remote call failed.
    #[error(transparent)]
    Remote(#[from] PolicyBackendError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PolicyRulesError {
    /// `true` when the remote reported that the target no longer exists.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Remote(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// A policy type token that is not part of the known enumeration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown policy type '{0}'")]
pub struct UnknownPolicyType(pub String);
