//! Core data types for the wave store.
//!
//! - [`Wave`]: the stored record (id, name, date)
//! - Date helpers for the fixed `YYYY-MM-DD HH:MM:SS` column layout and the
//!   JSON `waveDate` field

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Column layout for persisted wave dates (local time, second precision).
pub const WAVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layouts accepted when reading a date back, in the order they are tried.
const WAVE_DATE_READ_FORMATS: &[&str] = &[
    WAVE_DATE_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A single wave record.
///
/// The id is chosen by the caller and never changes once the wave is stored.
///
/// Fields are public, so a struct literal may carry sub-second precision.
/// The column keeps whole seconds only; [`WaveRepository`](crate::storage::WaveRepository)
/// writes return the stored form, as [`Wave::new`] builds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wave {
    /// Primary key, assigned by the caller.
    pub id: Uuid,
    /// Display name. `null` or a missing field in JSON becomes the empty string.
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    /// Wave timestamp in local time, truncated to whole seconds.
    #[serde(
        serialize_with = "serialize_wave_date",
        deserialize_with = "deserialize_wave_date"
    )]
    pub wave_date: NaiveDateTime,
}

impl Wave {
    /// Create a wave, truncating the date to second precision.
    pub fn new(id: Uuid, name: impl Into<String>, wave_date: NaiveDateTime) -> Self {
        Self {
            id,
            name: name.into(),
            wave_date: truncate_to_seconds(wave_date),
        }
    }

    /// Create a wave with a fresh random id.
    pub fn with_random_id(name: impl Into<String>, wave_date: NaiveDateTime) -> Self {
        Self::new(Uuid::new_v4(), name, wave_date)
    }

    /// Whether the name is empty or only whitespace.
    pub fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Drop the sub-second part of a timestamp.
pub fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Format a wave date for the `wavedate` column.
pub fn format_wave_date(ts: &NaiveDateTime) -> String {
    ts.format(WAVE_DATE_FORMAT).to_string()
}

/// Parse a `wavedate` column value.
///
/// Accepts the canonical layout plus `T`-separated, fractional-second and
/// date-only variants. Returns `None` when nothing matches.
pub fn parse_wave_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    WAVE_DATE_READ_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(truncate_to_seconds)
}

/// Parse a JSON `waveDate`, additionally accepting RFC 3339 with an offset.
fn parse_json_wave_date(s: &str) -> Option<NaiveDateTime> {
    parse_wave_date(s).or_else(|| {
        DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| truncate_to_seconds(dt.with_timezone(&Local).naive_local()))
    })
}

fn serialize_wave_date<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&ts.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn deserialize_wave_date<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_json_wave_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid waveDate: '{raw}'")))
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
