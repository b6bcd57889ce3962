//! Error types for hostdns
//!
//! This module defines all error types used throughout the crate.
//!
//! The first five variants form the orchestration taxonomy. Whether one of
//! them is fatal depends on where it surfaces; see
//! [`LifecycleController`](crate::controller::LifecycleController).

use thiserror::Error;

/// Result type alias for hostdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hostdns
#[derive(Error, Debug)]
pub enum Error {
    /// A provider call could not be completed (network, auth, session)
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The resource identifier does not resolve to any resource
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The poll budget ran out before the resource reported an address
    #[error("Address not ready for {resource_id} after {attempts} attempt(s)")]
    AddressNotReady {
        /// Resource that was polled
        resource_id: String,
        /// Attempts consumed
        attempts: u32,
    },

    /// Publishing the address record failed
    #[error("DNS binding failed for {hostname}: {message}")]
    DnsBindingFailed {
        /// Hostname being bound
        hostname: String,
        /// Error message
        message: String,
    },

    /// Removing the address record failed
    #[error("DNS unbind failed for {hostname}: {message}")]
    DnsUnbindFailed {
        /// Hostname being unbound
        hostname: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a provider-unavailable error
    pub fn provider_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a "resource not found" error
    pub fn resource_not_found(resource_id: impl Into<String>) -> Self {
        Self::ResourceNotFound(resource_id.into())
    }

    /// Create an address-not-ready error
    pub fn address_not_ready(resource_id: impl Into<String>, attempts: u32) -> Self {
        Self::AddressNotReady {
            resource_id: resource_id.into(),
            attempts,
        }
    }

    /// Create a DNS binding error
    pub fn dns_binding_failed(hostname: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DnsBindingFailed {
            hostname: hostname.into(),
            message: message.into(),
        }
    }

    /// Create a DNS unbind error
    pub fn dns_unbind_failed(hostname: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DnsUnbindFailed {
            hostname: hostname.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error belongs to the provider taxonomy
    /// (`ProviderUnavailable` or `ResourceNotFound`)
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::ResourceNotFound(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
