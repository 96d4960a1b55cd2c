//! Client for the secrets backend.
//!
//! Only the calls the refresh engine needs are implemented: PKI certificate
//! issuance, key/value reads and a token self-lookup.

pub mod client;
pub mod error;
pub mod types;

pub use client::{VaultClient, VaultClientConfig};
pub use error::VaultError;
