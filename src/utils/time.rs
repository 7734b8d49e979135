//! Canonical UTC timestamps for record bookkeeping.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Serialize a timestamp in the canonical ISO-8601 form used by the
/// persisted tabular store.
pub fn to_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parse a timestamp from the persisted store; `None` on empty or
/// malformed input.
pub fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
