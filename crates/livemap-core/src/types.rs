// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the livemap bridge.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::codec;
use crate::error::Result;
use crate::geo::{BoundingBox, Coordinates};

/// Unique identifier for a bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pinpoint {
    pub id: i64,
    pub longitude: f64,
    pub latitude: f64,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_entity_shape: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Pinpoint {
    pub fn new(id: i64, coordinates: &Coordinates, name: impl Into<String>) -> Self {
        Self {
            id,
            longitude: coordinates.longitude,
            latitude: coordinates.latitude,
            name: name.into(),
            description: String::new(),
            external_data: None,
            image_url: None,
            media_url: None,
            media_type: None,
            geo_entity_shape: None,
            tags: None,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A dated happening, optionally attached to a pinpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// The livemap API calls the attached pinpoint `point`.
    #[serde(
        rename = "point",
        alias = "pinpoint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pinpoint: Option<Pinpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_data: Option<Map<String, Value>>,
}

/// Search filters (tags, free text, date range).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Serialized as `yyyy-mm-dd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Styling for `drawPolyline`. Unset fields fall back to the web defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Route through the itinerary service instead of drawing straight segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_network: Option<bool>,
}

/// An image marker placed at a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub coordinates: Coordinates,
    pub img: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The query that produced a `contentUpdated` notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdatedQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_altitude: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_altitude: Option<i64>,
}

/// Offline tile mode passed in the `offline` URL parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineOptions {
    pub enable: bool,
    /// Tile source URL template.
    pub tiles: String,
    /// Pinpoint ids never shown while offline.
    #[serde(default)]
    pub blacklist: Vec<i64>,
}

impl OfflineOptions {
    pub fn to_url_parameter(&self) -> Result<String> {
        codec::encode_string(self)
    }
}

/// Intro card toggle passed in the `introcard` URL parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntroCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Edge insets in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Camera animation options for `easeTo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EaseToOptions {
    pub center: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<Padding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animate: Option<bool>,
}

impl EaseToOptions {
    /// Only latitude and longitude of `center` are sent.
    pub fn new(center: &Coordinates) -> Self {
        Self {
            center: Coordinates::new(center.latitude, center.longitude),
            zoom: None,
            padding: None,
            bearing: None,
            pitch: None,
            duration: None,
            animate: None,
        }
    }
}

/// Options for `fitBounds`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitBoundsOptions {
    pub padding: Padding,
}

/// An indoor map feature the user tapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndoorFeature {
    pub wemap_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// A building floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndoorLevel {
    pub name: String,
    pub short_name: String,
    pub level: f64,
}

/// A fix from a native location provider, in the shape the web provider
/// callback expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,
    pub accuracy: f64,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    /// Course over ground in degrees.
    pub bearing: f64,
}

impl ProviderLocation {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }
}

/// Augmented-reality view mode forced from native.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArViewMode {
    On,
    Off,
    Auto,
}

impl ArViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Auto => "AUTO",
        }
    }
}

/// Host capabilities that need an OS-level permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Camera,
}

impl Permission {
    /// Name used by the web application (`permissionsDenied` payloads).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
        }
    }
}

/// OS authorization status of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pinpoint_json() -> Value {
        json!({
            "id": 31604315,
            "longitude": 3.88,
            "latitude": 43.61,
            "name": "Musée Fabre",
            "description": "Fine arts museum",
            "external_data": { "ticketing": "https://example.org" },
            "tags": ["museum"],
            "likes_count": 12
        })
    }

    #[test]
    fn pinpoint_ignores_unmodelled_fields() {
        let pinpoint: Pinpoint = serde_json::from_value(pinpoint_json()).unwrap();
        assert_eq!(pinpoint.id, 31604315);
        assert_eq!(pinpoint.tags.as_deref(), Some(&["museum".to_string()][..]));
        assert!(pinpoint.image_url.is_none());
    }

    #[test]
    fn pinpoint_round_trip() {
        let pinpoint: Pinpoint = serde_json::from_value(pinpoint_json()).unwrap();
        let back: Pinpoint =
            serde_json::from_value(serde_json::to_value(&pinpoint).unwrap()).unwrap();
        assert_eq!(back, pinpoint);
    }

    #[test]
    fn pinpoint_requires_description() {
        let mut value = pinpoint_json();
        value.as_object_mut().unwrap().remove("description");
        let err = serde_json::from_value::<Pinpoint>(value).unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn event_reads_point_as_pinpoint() {
        let event: Event = serde_json::from_value(json!({
            "id": 2816693,
            "name": "Concert",
            "description": "Open air",
            "point": pinpoint_json(),
        }))
        .unwrap();
        assert_eq!(event.pinpoint.map(|p| p.id), Some(31604315));
    }

    #[test]
    fn filters_dates_are_iso() {
        let filters = Filters {
            tags: Some(vec!["jardin-remarquable".into()]),
            query: Some("Aragon".into()),
            start_date: NaiveDate::from_ymd_opt(2019, 9, 21),
            end_date: None,
        };
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(value["startDate"], json!("2019-09-21"));
        assert!(value.get("endDate").is_none());
        assert_eq!(serde_json::from_value::<Filters>(value).unwrap(), filters);
    }

    #[test]
    fn polyline_options_only_emit_set_fields() {
        let options = PolylineOptions {
            color: Some("#2F7DE1".into()),
            use_network: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(options).unwrap(),
            json!({ "color": "#2F7DE1", "useNetwork": true })
        );
    }

    #[test]
    fn offline_options_url_parameter() {
        let offline = OfflineOptions {
            enable: true,
            tiles: "https://tiles.example.org/{z}/{x}/{y}.png".into(),
            blacklist: vec![1, 2],
        };
        let parsed: Value = serde_json::from_str(&offline.to_url_parameter().unwrap()).unwrap();
        assert_eq!(parsed["enable"], json!(true));
        assert_eq!(parsed["blacklist"], json!([1, 2]));
    }

    #[test]
    fn provider_location_timestamp() {
        let location = ProviderLocation {
            lat: 43.6,
            lng: 3.8,
            alt: None,
            accuracy: 3.0,
            time: 1_650_000_000_000,
            bearing: 90.0,
        };
        assert_eq!(location.timestamp().unwrap().timestamp(), 1_650_000_000);
    }

    #[test]
    fn ar_view_mode_wire_names() {
        assert_eq!(serde_json::to_value(ArViewMode::Off).unwrap(), json!("OFF"));
        assert_eq!(ArViewMode::Auto.as_str(), "AUTO");
    }

    #[test]
    fn permission_wire_name() {
        assert_eq!(serde_json::to_value(Permission::Camera).unwrap(), json!("camera"));
    }
}
