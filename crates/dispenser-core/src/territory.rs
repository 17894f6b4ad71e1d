use serde::{Deserialize, Serialize};

pub type TerritoryId = u32;

/// A catalog entry. Everything except `active` is fixed at authoring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    #[serde(rename = "territory_name")]
    pub name: String,
    #[serde(rename = "map_description", default)]
    pub description: String,
    #[serde(default)]
    pub map_image_url: String,
    #[serde(default)]
    pub map_link: String,
    pub active: bool,
}

impl Territory {
    pub fn new(id: TerritoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            map_image_url: format!("/maps/{id}.svg"),
            map_link: String::new(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub territory_id: TerritoryId,
    /// Unix epoch milliseconds; RFC 3339 UTC on the wire.
    #[serde(with = "rfc3339_millis")]
    pub assigned_at: u64,
}

mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ms: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = i64::try_from(*ms).map_err(|_| S::Error::custom("timestamp out of range"))?;
        let at = DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or_else(|| S::Error::custom("timestamp out of range"))?;
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let at = DateTime::parse_from_rfc3339(&raw).map_err(D::Error::custom)?;
        u64::try_from(at.timestamp_millis()).map_err(|_| D::Error::custom("timestamp before epoch"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub assigned: usize,
    pub remaining: usize,
    pub is_exhausted: bool,
}

impl Stats {
    pub fn compute(active: usize, assigned: usize) -> Self {
        let remaining = active.saturating_sub(assigned);
        Self {
            total: active,
            assigned,
            remaining,
            is_exhausted: remaining == 0,
        }
    }
}
