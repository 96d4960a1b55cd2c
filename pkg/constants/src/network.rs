//! Network-related constants.

/// Default port for the operator API server.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Default secrets backend base URL (includes the API version segment).
pub const DEFAULT_VAULT_URL: &str = "http://127.0.0.1:8200/v1/";

/// Header carrying the backend token on every request.
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Backend path used to verify the configured token at startup.
pub const VAULT_LOOKUP_SELF_PATH: &str = "auth/token/lookup-self";
