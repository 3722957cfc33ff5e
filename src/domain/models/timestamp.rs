use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serializer;

/// Parses RFC 3339 timestamps, and the naive ISO-8601 form the backend emits
/// (`2024-03-01T09:00:05.123456`), which is read as UTC.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = value.parse::<NaiveDateTime>() {
        return Some(Utc.from_utc_datetime(&naive));
    }

    return None;
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    return serializer.serialize_str(&value.to_rfc3339());
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    return parse(&raw)
        .ok_or_else(|| return serde::de::Error::custom(format!("invalid timestamp: {raw}")));
}
