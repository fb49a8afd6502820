use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use utoipa::ToSchema;

/// Calendar-date wire format shared by stored records and day labels.
pub static DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Resting/max heart-rate pair set at onboarding. Immutable afterwards;
/// edits replace the whole value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeartRateProfile {
    pub resting_hr: i32,
    pub max_hr: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Athlete {
    pub id: i64,
    pub name: String,
    pub resting_hr: i32,
    pub max_hr: i32,
    pub created_at: OffsetDateTime,
}

impl Athlete {
    pub fn profile(&self) -> HeartRateProfile {
        HeartRateProfile {
            resting_hr: self.resting_hr,
            max_hr: self.max_hr,
        }
    }
}

/// Strava OAuth tokens for one athlete. Stored and rotated by the source
/// collaborator; the scoring core never touches these.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp after which the access token is no longer valid.
    pub expires_at: i64,
}

/// Durable per-activity summary: seconds spent in each heart-rate zone
/// plus the metadata aggregation needs. The canonical encoding is JSON
/// with exactly these field names; `date` is `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityZoneRecord {
    pub z1: f64,
    pub z2: f64,
    pub z3: f64,
    pub z4: f64,
    pub z5: f64,
    pub sport: String,
    #[serde(rename = "tot_time")]
    pub total_time: f64,
    #[serde(with = "iso_date")]
    pub date: Date,
}

impl ActivityZoneRecord {
    pub fn zone_seconds(&self) -> [f64; 5] {
        [self.z1, self.z2, self.z3, self.z4, self.z5]
    }

    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_canonical_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Share of total activity time spent in each zone, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZonePercentages {
    #[serde(rename = "Z1")]
    pub z1: f64,
    #[serde(rename = "Z2")]
    pub z2: f64,
    #[serde(rename = "Z3")]
    pub z3: f64,
    #[serde(rename = "Z4")]
    pub z4: f64,
    #[serde(rename = "Z5")]
    pub z5: f64,
}

/// Label→score pairs serialized as a JSON object in insertion order.
///
/// The week breakdown is ordered (Mon..Sun, then "PTO remaining"), so a
/// plain map type would scramble it on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedScores(Vec<(String, f64)>);

impl OrderedScores {
    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.0.push((label.into(), value));
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(l, v)| (l.as_str(), *v))
    }
}

impl Serialize for OrderedScores {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap as _;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedScores {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = OrderedScores;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of labels to scores")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, value)) = access.next_entry::<String, f64>()? {
                    entries.push((label, value));
                }
                Ok(OrderedScores(entries))
            }
        }

        deserializer.deserialize_map(Visitor)
    }
}

/// One athlete's row in the published scoreboard. Rebuilt in full on
/// every scoring run; never mutated incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f64,
    pub zones: ZonePercentages,
    pub last_7: OrderedScores,
    pub sports: BTreeMap<String, u32>,
}

/// The document handed to the publish sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreboardDocument {
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Push event as delivered by the activity source's webhook.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookEvent {
    pub object_type: String,
    pub aspect_type: String,
    pub owner_id: i64,
    pub object_id: i64,
    #[serde(default)]
    pub updates: HashMap<String, serde_json::Value>,
}

impl WebhookEvent {
    /// Athlete events are only acted on when they revoke access.
    pub fn is_deauthorization(&self) -> bool {
        self.object_type == "athlete"
            && self
                .updates
                .get("authorized")
                .is_some_and(|v| *v == "false" || *v == false)
    }
}

/// Platform-wide counters for the stats endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Stats {
    pub athletes: i64,
    pub activities: i64,
}

pub mod iso_date {
    //! Serde codec for `time::Date` using the `YYYY-MM-DD` wire format.

    use serde::{Deserialize as _, de::Error as _};
    use time::Date;

    use super::DATE_FORMAT;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, DATE_FORMAT).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn record_canonical_json_round_trips() {
        let record = ActivityZoneRecord {
            z1: 120.0,
            z2: 340.5,
            z3: 0.0,
            z4: 60.0,
            z5: 12.5,
            sport: "Run".to_string(),
            total_time: 533.0,
            date: date!(2025 - 11 - 03),
        };

        let encoded = record.to_canonical_json().unwrap();
        assert!(encoded.contains("\"tot_time\":533.0"));
        assert!(encoded.contains("\"date\":\"2025-11-03\""));

        let decoded = ActivityZoneRecord::from_canonical_json(&encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn record_missing_zone_field_is_rejected() {
        let raw = r#"{"z1":1.0,"z2":2.0,"sport":"Ride","tot_time":3.0,"date":"2025-11-03"}"#;
        assert!(ActivityZoneRecord::from_canonical_json(raw).is_err());
    }

    #[test]
    fn ordered_scores_serialize_in_insertion_order() {
        let mut scores = OrderedScores::default();
        scores.push("Wed (11/05)", 12.5);
        scores.push("Mon (11/03)", 50.0);
        scores.push("PTO remaining", 600.0);

        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(
            json,
            r#"{"Wed (11/05)":12.5,"Mon (11/03)":50.0,"PTO remaining":600.0}"#
        );

        let back: OrderedScores = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scores);
    }

    #[test]
    fn deauthorization_event_detection() {
        let raw = r#"{
            "object_type": "athlete",
            "aspect_type": "update",
            "owner_id": 7,
            "object_id": 7,
            "updates": {"authorized": "false"}
        }"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert!(event.is_deauthorization());

        let raw = r#"{
            "object_type": "activity",
            "aspect_type": "create",
            "owner_id": 7,
            "object_id": 99
        }"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert!(!event.is_deauthorization());
    }
}
