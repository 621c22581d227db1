use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// One raw entry of the fetched town-hall collection.
///
/// The feed is hand-entered, so coordinate and timestamp fields arrive as
/// numbers, numeric strings, or not at all. The custom deserializers fold
/// all of those into Option rather than failing the whole payload.
#[derive(Debug, Deserialize)]
pub struct RawEvent {
    #[serde(default, rename = "eventId")]
    pub event_id: Option<String>,
    #[serde(default, rename = "eventName")]
    pub event_name: String,
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "Location")]
    pub location: String,
    #[serde(default, rename = "dateString")]
    pub date_string: String,
    #[serde(default, rename = "Time")]
    pub time: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "iconFlag")]
    pub icon_flag: String,
    #[serde(default)]
    pub chamber: String,
    #[serde(default, deserialize_with = "deserialize_coord")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_coord")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "deserialize_district")]
    pub district: Option<u32>,
    #[serde(default)]
    pub link: Option<String>,
}

/// An event as held by application state. Created once from a RawEvent,
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub address: String,
    pub venue: String,
    pub date: String,
    pub time: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub icon_flag: String,
    pub chamber: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub state: Option<String>,
    pub district: Option<u32>,
    pub url: Option<String>,
}

impl EventRecord {
    /// Convert a raw feed entry. `key` is the entry's key in the fetched
    /// collection, used when the entry carries no id of its own.
    pub fn from_raw(key: &str, raw: RawEvent) -> Self {
        Self {
            id: raw.event_id.unwrap_or_else(|| key.to_string()),
            name: raw.event_name,
            display_name: raw.display_name,
            address: raw.address,
            venue: raw.location,
            date: raw.date_string,
            time: raw.time,
            starts_at: raw.starts_at,
            icon_flag: raw.icon_flag,
            chamber: raw.chamber,
            lat: raw.lat,
            lng: raw.lng,
            state: raw.state,
            district: raw.district,
            url: raw.link,
        }
    }
}

fn deserialize_coord<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn deserialize_district<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64().map(|v| v as u32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn deserialize_timestamp<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    let s = match value {
        Value::String(s) if !s.is_empty() => s,
        _ => return Ok(None),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    // The feed also carries bare "YYYY-MM-DD HH:MM:SS" stamps.
    match NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => Ok(Some(naive.and_utc())),
        Err(err) => {
            warn!("Unparseable starts_at {:?}: {err}", s);
            Ok(None)
        }
    }
}
