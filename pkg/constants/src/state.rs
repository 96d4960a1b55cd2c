//! State store key layout.

/// Prefix of every stored binding: `/registry/vaults/<ns>/<name>`.
pub const VAULTS_PREFIX: &str = "/registry/vaults/";

/// Prefix of every delivered secret: `/registry/secrets/<ns>/<name>`.
pub const SECRETS_PREFIX: &str = "/registry/secrets/";

/// Prefix of the append-only event log: `/registry/events/<ns>/<seq>`.
pub const EVENTS_PREFIX: &str = "/registry/events/";
