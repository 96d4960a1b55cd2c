//! Failures of the refresh engine.

use pkg_vault::VaultError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while deciding on or performing a refresh.
///
/// Every variant except [`RefreshError::ListingFailed`] is scoped to one
/// binding and is absorbed by the scheduler.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// A staleness check needed the backend and could not reach it.
    #[error("backend unreachable while checking {binding}: {source}")]
    BackendUnreachable {
        binding: String,
        #[source]
        source: VaultError,
    },

    /// The backend could not deliver the secret for a binding.
    #[error("secret for {binding} is not accessible: {source}")]
    SecretNotAccessible {
        binding: String,
        #[source]
        source: VaultError,
    },

    /// Staleness annotations are absent or cannot be parsed.
    #[error("staleness metadata missing: {reason}")]
    MetadataMissing { reason: String },

    #[error("failed to read state for {binding}: {source}")]
    StoreReadFailed {
        binding: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write state for {binding}: {source}")]
    StoreWriteFailed {
        binding: String,
        #[source]
        source: anyhow::Error,
    },

    /// Bindings could not be enumerated. Aborts the current tick only.
    #[error("failed to list vault bindings: {source}")]
    ListingFailed {
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid configuration for {binding}: {reason}")]
    InvalidConfiguration { binding: String, reason: String },

    #[error("refresh of {binding} timed out after {}s", after.as_secs())]
    Timeout { binding: String, after: Duration },
}

pub type Result<T> = std::result::Result<T, RefreshError>;
