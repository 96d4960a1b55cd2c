//! Scheduled refresh defaults.

/// Seconds between two reconciliation passes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Seconds to wait before the first reconciliation pass.
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 30;

/// Upper bound for a single backend request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// How much earlier than `issued_at + ttl` a PKI secret becomes due, in seconds.
pub const DEFAULT_REFRESH_MARGIN_SECS: u64 = 0;
