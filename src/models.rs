// Data structures shared by the feed clients, the view state and the
// renderer-facing API.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::error::FetchError;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position { latitude, longitude }
    }
}

/// One active shuttle as reported by the transit feed. No identity is kept
/// across polls; the whole list is replaced each time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusPosition {
    #[serde(rename(deserialize = "routeID"), deserialize_with = "deserialize_id")]
    pub route_id: String,
    #[serde(rename(deserialize = "lat"), deserialize_with = "deserialize_coordinate")]
    pub latitude: f64,
    #[serde(rename(deserialize = "lon"), deserialize_with = "deserialize_coordinate")]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStop {
    #[serde(rename(deserialize = "lat"), deserialize_with = "deserialize_coordinate")]
    pub latitude: f64,
    #[serde(rename(deserialize = "lon"), deserialize_with = "deserialize_coordinate")]
    pub longitude: f64,
}

/// A bike-share station built from one status record and its matching
/// information record.
///
/// `fields` holds the complete union of both source records, with status
/// values replacing information values on key collision. The typed fields
/// are views over that union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BikeStation {
    pub station_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub num_bikes_available: u32,
    pub num_docks_available: u32,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl BikeStation {
    pub fn from_merged(fields: serde_json::Map<String, serde_json::Value>) -> Result<Self, FetchError> {
        let station_id = fields
            .get("station_id")
            .and_then(json_id)
            .ok_or_else(|| FetchError::ParseError("Station record without station_id".to_string()))?;

        let number = |key: &str| -> Result<f64, FetchError> {
            fields.get(key).and_then(json_number).ok_or_else(|| {
                FetchError::ParseError(format!("Station '{}' is missing '{}'", station_id, key))
            })
        };

        let latitude = number("lat")?;
        let longitude = number("lon")?;
        let num_bikes_available = number("num_bikes_available")?.max(0.0) as u32;
        let num_docks_available = number("num_docks_available")?.max(0.0) as u32;
        let name = fields
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(BikeStation {
            station_id,
            name,
            latitude,
            longitude,
            num_bikes_available,
            num_docks_available,
            fields,
        })
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// The visible part of the map. Only obtainable through [`MapRegion::new`],
/// so every instance has in-range coordinates and positive zoom deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapRegion {
    latitude: f64,
    longitude: f64,
    latitude_delta: f64,
    longitude_delta: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidRegion(String);

impl MapRegion {
    pub fn new(
        latitude: f64,
        longitude: f64,
        latitude_delta: f64,
        longitude_delta: f64,
    ) -> Result<Self, InvalidRegion> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidRegion(format!("latitude {} out of range", latitude)));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidRegion(format!("longitude {} out of range", longitude)));
        }
        for delta in [latitude_delta, longitude_delta] {
            if !delta.is_finite() || delta <= 0.0 {
                return Err(InvalidRegion(format!("zoom delta {} must be positive", delta)));
            }
        }

        Ok(MapRegion {
            latitude,
            longitude,
            latitude_delta,
            longitude_delta,
        })
    }

    pub fn center(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }

    pub fn latitude_delta(&self) -> f64 {
        self.latitude_delta
    }

    pub fn longitude_delta(&self) -> f64 {
        self.longitude_delta
    }

    /// Same zoom, new center.
    pub fn recentered(&self, center: Position) -> Result<Self, InvalidRegion> {
        MapRegion::new(
            center.latitude,
            center.longitude,
            self.latitude_delta,
            self.longitude_delta,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStyle {
    pub color: String,
    pub label: String,
}

impl RouteStyle {
    pub fn new(color: impl Into<String>, label: impl Into<String>) -> Self {
        RouteStyle {
            color: color.into(),
            label: label.into(),
        }
    }

    pub fn hidden() -> Self {
        RouteStyle::new("transparent", "")
    }
}

/// Route identifier to marker style. Routes without an entry render with
/// [`RouteStyle::hidden`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteStyles(HashMap<String, RouteStyle>);

impl RouteStyles {
    pub fn style_for(&self, route_id: &str) -> RouteStyle {
        self.0.get(route_id).cloned().unwrap_or_else(RouteStyle::hidden)
    }
}

impl Default for RouteStyles {
    fn default() -> Self {
        let mut styles = HashMap::new();
        styles.insert("4".to_string(), RouteStyle::new("green", "O"));
        styles.insert("3".to_string(), RouteStyle::new("purple", "H"));
        RouteStyles(styles)
    }
}

// ============================================================================
// Lenient JSON helpers
// ============================================================================

// The transit feed sends coordinates as text ("40.91") and sometimes as
// plain numbers; ids show up either way too.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn deserialize_coordinate<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid coordinate '{}'", s))),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    json_id(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid identifier {}", value)))
}

/// String or integer JSON value as an identifier string.
pub fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
