//! Refresh-tracking annotations on delivered secrets.
//!
//! Two annotations drive refreshes: `lastUpdated`, the time of the last
//! successful write, and `compare`, the minute-truncated instant after which
//! the secret is due again. Comparisons are therefore minute-granular.

use chrono::{DateTime, Duration, DurationRound, NaiveDateTime, Utc};
use pkg_constants::annotations::{DATE_FORMAT, compare_key, last_update_key};
use std::collections::HashMap;

use crate::error::{RefreshError, Result};

/// Round `t` down to the start of its minute.
pub fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::minutes(1)).unwrap_or(t)
}

pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format(DATE_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Annotations for a secret written at `now` that is valid for `ttl`.
pub fn encode(now: DateTime<Utc>, ttl: Duration) -> HashMap<String, String> {
    HashMap::from([
        (last_update_key(), format_timestamp(now)),
        (compare_key(), format_timestamp(truncate_to_minute(now + ttl))),
    ])
}

/// The `compare` instant of a secret's annotations.
pub fn decode(annotations: &HashMap<String, String>) -> Result<DateTime<Utc>> {
    let key = compare_key();
    let value = annotations
        .get(&key)
        .ok_or_else(|| RefreshError::MetadataMissing {
            reason: format!("annotation {} is absent", key),
        })?;
    parse_timestamp(value).ok_or_else(|| RefreshError::MetadataMissing {
        reason: format!("annotation {} has unparsable value '{}'", key, value),
    })
}

/// Due once `now` reaches `compare`; the boundary itself counts as due.
pub fn is_stale(compare: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= compare
}
