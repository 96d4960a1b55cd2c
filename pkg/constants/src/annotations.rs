//! Target secret annotation keys and formats.

/// Prefix shared by every annotation this operator writes.
pub const ANNOTATION_PREFIX: &str = "vault.koudingspawn.de";

/// Suffix of the annotation holding the time of the last successful write.
pub const LAST_UPDATE_ANNOTATION: &str = "/lastUpdated";

/// Suffix of the annotation holding the refresh comparison value.
/// For PKI secrets this is a minute-truncated timestamp, for key/value
/// secrets a digest of the delivered data.
pub const COMPARE_ANNOTATION: &str = "/compare";

/// chrono format of every timestamp annotation (always UTC).
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Secret type marker written on every target secret.
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Data key of the issued certificate in a PKI secret.
pub const TLS_CERT_KEY: &str = "tls.crt";

/// Data key of the issued private key in a PKI secret.
pub const TLS_PRIVATE_KEY: &str = "tls.key";

/// Full key of the last-update annotation.
pub fn last_update_key() -> String {
    format!("{}{}", ANNOTATION_PREFIX, LAST_UPDATE_ANNOTATION)
}

/// Full key of the compare annotation.
pub fn compare_key() -> String {
    format!("{}{}", ANNOTATION_PREFIX, COMPARE_ANNOTATION)
}
