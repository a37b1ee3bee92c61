// Timestamp wire format
//
// Every timestamp that crosses a boundary (CSV tables, CLI flags, forms, API
// bodies) is the fixed string `YYYY-MM-DD HH:MM`, minute precision, no zone.

use chrono::{Local, NaiveDateTime, Timelike};

use crate::error::{ParkingError, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse a `YYYY-MM-DD HH:MM` string
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
        ParkingError::InvalidTimestamp {
            value: value.to_string(),
            source,
        }
    })
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time truncated to the minute (default for entry/exit inputs)
pub fn now_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.date()
        .and_hms_opt(now.hour(), now.minute(), 0)
        .unwrap_or(now)
}

/// `now_timestamp()` already rendered in wire format
pub fn now_string() -> String {
    format_timestamp(&now_timestamp())
}

// ============================================================================
// SERDE ADAPTERS (CSV columns)
// ============================================================================

/// Required timestamp column
pub mod minutes {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, TIMESTAMP_FORMAT};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}

/// Optional timestamp column; an empty cell means "not set"
pub mod minutes_opt {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, TIMESTAMP_FORMAT};

    pub fn serialize<S: Serializer>(ts: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&format_timestamp(ts)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}
