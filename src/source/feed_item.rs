//! The message type received from the crisis-information feed.
//!
//! `FeedItem` mirrors one JSON object of the Krisinformation news endpoint.
//! Field names on the wire are PascalCase (`Identifier`, `Headline`, ...);
//! the serde attributes below map them onto snake_case Rust fields.
//!
//! ## For contributors
//!
//! The service is not strict about its own schema: `Area` may be `null`,
//! `Preamble` may be missing, and timestamps sometimes lack an offset.  The
//! deserializers here are deliberately lenient so that one odd entry never
//! fails the whole poll.  Only a body that is not a JSON array of objects is
//! treated as a parse error.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Description used by the feed for nation-wide messages.
pub const NATIONAL_SCOPE: &str = "Sverige";

/// A single crisis message as published by the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedItem {
    /// Unique identifier within the feed.
    #[serde(rename = "Identifier", default, deserialize_with = "lenient_text")]
    pub identifier: String,

    /// Short headline.
    #[serde(rename = "Headline", default, deserialize_with = "lenient_text")]
    pub headline: String,

    /// Lead paragraph.  `None` when missing or not a string.
    #[serde(rename = "Preamble", default, deserialize_with = "text_or_none")]
    pub preamble: Option<String>,

    /// First publication time.
    ///
    /// `None` means the timestamp was absent or unparseable; such an item is
    /// never considered too old.
    #[serde(rename = "Published", default, deserialize_with = "lenient_timestamp")]
    pub published: Option<DateTime<Utc>>,

    /// Time of the most recent update.
    #[serde(rename = "Updated", default, deserialize_with = "lenient_timestamp")]
    pub updated: Option<DateTime<Utc>>,

    /// Issuing authority, e.g. "Länsstyrelsen i Stockholms län".
    #[serde(rename = "SenderName", default, deserialize_with = "text_or_none")]
    pub sender_name: Option<String>,

    /// Geographic areas the message is aimed at, in feed order.
    #[serde(rename = "Area", default, deserialize_with = "null_as_empty")]
    pub areas: Vec<Area>,
}

/// A geographic target of a [`FeedItem`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Area {
    #[serde(rename = "Type", default, deserialize_with = "lenient_area_kind")]
    pub kind: AreaKind,
    #[serde(rename = "Description", default, deserialize_with = "lenient_text")]
    pub description: String,
}

/// The `Type` field of an [`Area`].  Anything other than `County` or
/// `Country` is kept verbatim; a missing or null type is `Other("")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaKind {
    County,
    Country,
    Other(String),
}

impl From<String> for AreaKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "County" => AreaKind::County,
            "Country" => AreaKind::Country,
            _ => AreaKind::Other(raw),
        }
    }
}

impl Default for AreaKind {
    fn default() -> Self {
        AreaKind::Other(String::new())
    }
}

impl Area {
    #[cfg(test)]
    pub fn new(kind: AreaKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    /// `true` for the nation-wide `Country`/`Sverige` area.
    pub fn is_national(&self) -> bool {
        self.kind == AreaKind::Country && self.description == NATIONAL_SCOPE
    }
}

impl FeedItem {
    /// Whether both the published and the updated timestamps lie more than
    /// `max_age` before `now`.
    ///
    /// A missing timestamp counts as "now", so an item with either timestamp
    /// missing is never too old.
    pub fn is_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let too_old = |ts: Option<DateTime<Utc>>| ts.is_some_and(|ts| now - ts > max_age);
        too_old(self.published) && too_old(self.updated)
    }
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

/// Parse an ISO-8601 timestamp, with or without an offset.  Offset-less
/// values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    })
}

/// Strings pass through, numbers keep their textual form, anything else is
/// empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => text,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_area_kind<'de, D>(deserializer: D) -> Result<AreaKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_or_none(deserializer)?.map(AreaKind::from).unwrap_or_default())
}

/// `null` becomes an empty list, and elements that are not area objects are
/// skipped.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Area>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| Area::deserialize(value).ok())
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item_with_times(published: Option<DateTime<Utc>>, updated: Option<DateTime<Utc>>) -> FeedItem {
        FeedItem {
            identifier: "id".to_string(),
            headline: "Headline".to_string(),
            preamble: None,
            published,
            updated,
            sender_name: None,
            areas: vec![],
        }
    }

    #[test]
    fn deserializes_full_entry() {
        let json = r#"{
            "Identifier": "KRI-1",
            "Headline": "Brand i Uppsala",
            "Preamble": "Stäng fönster och dörrar.",
            "Published": "2024-03-01T10:15:00+01:00",
            "Updated": "2024-03-01T11:00:00+01:00",
            "SenderName": "Räddningstjänsten",
            "Area": [
                {"Type": "County", "Description": "Uppsala län"},
                {"Type": "Municipality", "Description": "Uppsala"}
            ]
        }"#;

        let item: FeedItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.identifier, "KRI-1");
        assert_eq!(item.headline, "Brand i Uppsala");
        assert_eq!(item.preamble.as_deref(), Some("Stäng fönster och dörrar."));
        assert_eq!(
            item.published,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap())
        );
        assert_eq!(item.sender_name.as_deref(), Some("Räddningstjänsten"));
        assert_eq!(item.areas.len(), 2);
        assert_eq!(item.areas[0].kind, AreaKind::County);
        assert_eq!(item.areas[1].kind, AreaKind::Other("Municipality".to_string()));
    }

    #[test]
    fn null_area_and_missing_fields_are_tolerated() {
        let json = r#"{"Identifier": "x", "Headline": "h", "Area": null, "Preamble": 42}"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();

        assert!(item.areas.is_empty());
        assert!(item.preamble.is_none(), "non-text preamble becomes None");
        assert!(item.published.is_none());
        assert!(item.sender_name.is_none());
    }

    #[test]
    fn area_without_type_is_other() {
        let json = r#"{"Identifier": "x", "Area": [
            {"Description": "Solna"},
            {"Type": null, "Description": "Sverige"},
            {"Type": "Country", "Description": null}
        ]}"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.areas[0], Area::new(AreaKind::Other(String::new()), "Solna"));
        assert_eq!(item.areas[1].kind, AreaKind::default());
        assert!(!item.areas[1].is_national());
        assert_eq!(item.areas[2], Area::new(AreaKind::Country, ""));
    }

    #[test]
    fn timestamp_without_offset_is_utc() {
        let ts = parse_timestamp("2024-05-06T07:08:09").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
    }

    #[test]
    fn unparseable_timestamp_becomes_none() {
        let json = r#"{"Identifier": "x", "Published": "yesterday-ish"}"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert!(item.published.is_none());
    }

    #[test]
    fn national_area_is_recognised() {
        assert!(Area::new(AreaKind::Country, "Sverige").is_national());
        assert!(!Area::new(AreaKind::County, "Sverige").is_national());
        assert!(!Area::new(AreaKind::Country, "Norge").is_national());
    }

    #[test]
    fn older_than_requires_both_timestamps_old() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2025, 1, 30, 0, 0, 0).unwrap();
        let week = Duration::days(7);

        assert!(item_with_times(Some(old), Some(old)).is_older_than(week, now));
        assert!(!item_with_times(Some(old), Some(recent)).is_older_than(week, now));
        assert!(!item_with_times(Some(recent), Some(old)).is_older_than(week, now));
    }

    #[test]
    fn missing_timestamp_is_never_old() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        assert!(!item_with_times(Some(old), None).is_older_than(Duration::days(7), now));
        assert!(!item_with_times(None, None).is_older_than(Duration::days(7), now));
    }
}
