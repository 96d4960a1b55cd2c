//! Filesystem path constants.

/// Default config file path for the operator.
pub const DEFAULT_CONFIG: &str = "/etc/vault-crd/config.yaml";

/// Default data directory for the state store.
pub const DEFAULT_DATA_DIR: &str = "/tmp/vault-crd-data";
