// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geographic value objects exchanged with the livemap web application.
//
// Field names follow the livemap JavaScript API. Optional fields are omitted
// on encode and accepted as either absent or `null` on decode.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// A WGS84 position, optionally with altitude and horizontal accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// `[longitude, latitude]`, the GeoJSON position order.
    pub fn to_lng_lat_array(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Latitude and longitude only, dropping altitude and accuracy.
    pub fn to_lng_lat_object(&self) -> serde_json::Value {
        json!({
            "latitude": self.latitude,
            "longitude": self.longitude,
        })
    }
}

/// Rectangular area given by its north-east and south-west corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub north_east: Coordinates,
    pub south_west: Coordinates,
}

impl BoundingBox {
    pub fn new(north_east: Coordinates, south_west: Coordinates) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    /// Build from a `[west, south, east, north]` array.
    pub fn from_bounds_array(bounds: [f64; 4]) -> Self {
        let [west, south, east, north] = bounds;
        Self {
            north_east: Coordinates::new(north, east),
            south_west: Coordinates::new(south, west),
        }
    }

    /// `[west, south, east, north]`, the order `fitBounds` expects.
    pub fn to_bounds_array(&self) -> [f64; 4] {
        [
            self.south_west.longitude,
            self.south_west.latitude,
            self.north_east.longitude,
            self.north_east.latitude,
        ]
    }

    /// Leaflet-style `LatLngBounds` JSON used by the `maxbounds` URL parameter.
    pub fn to_url_parameter(&self) -> String {
        json!({
            "_northEast": { "lat": self.north_east.latitude, "lng": self.north_east.longitude },
            "_southWest": { "lat": self.south_west.latitude, "lng": self.south_west.longitude },
        })
        .to_string()
    }
}

/// Device orientation as a unit quaternion `[x, y, z, w]`.
///
/// Travels on the wire as a bare four-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attitude {
    pub quaternion: [f64; 4],
}

impl Attitude {
    pub fn new(quaternion: [f64; 4]) -> Self {
        Self { quaternion }
    }
}

/// Emitted by the map after a pan or zoom settles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapMoved {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}
