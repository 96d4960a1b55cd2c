use thiserror::Error;

/// Errors returned by [`crate::VaultClient`].
#[derive(Debug, Error)]
pub enum VaultError {
    /// The request never produced a response: connection refused, DNS,
    /// TLS or timeout.
    #[error("backend unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("backend returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The backend answered 2xx but the payload is unusable.
    #[error("malformed backend response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, VaultError>;
