//! Data models for USGS earthquake API responses and the hypocenter dataset.
//!
//! These structures match the GeoJSON format from USGS summary and detail
//! feeds. Only the fields the locator shows are kept.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::errors::LocatorError;
use crate::params::EventParams;

/// Top-level GeoJSON response from USGS summary feeds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Feed metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Earthquake events
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Validate the response structure.
    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.type_ != "FeatureCollection" {
            return Err(LocatorError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{}'",
                self.type_
            )));
        }
        Ok(())
    }
}

/// Metadata about the feed response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Human-readable title
    pub title: String,

    /// Number of events in response
    pub count: usize,
}

/// A single earthquake event. Detail lookups return one of these directly.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Always "Feature"
    #[serde(rename = "type")]
    pub type_: String,

    /// Unique event ID
    pub id: String,

    /// Geographic location
    pub geometry: Geometry,

    /// Event properties
    pub properties: Properties,
}

impl Feature {
    /// Validate the event structure.
    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.type_ != "Feature" {
            return Err(LocatorError::InvalidResponse(format!(
                "expected type 'Feature', got '{}'",
                self.type_
            )));
        }
        if self.id.is_empty() {
            return Err(LocatorError::Validation("empty event ID".into()));
        }
        if self.geometry.type_ != "Point" {
            return Err(LocatorError::InvalidResponse(format!(
                "expected 'Point' geometry, got '{}'",
                self.geometry.type_
            )));
        }
        if self.geometry.coordinates.len() < 2 {
            return Err(LocatorError::Validation(format!(
                "expected at least 2 coordinates, got {}",
                self.geometry.coordinates.len()
            )));
        }
        Ok(())
    }

    /// Get the event time as a `DateTime<Utc>`.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.properties.time).single()
    }

    fn coordinate(&self, index: usize) -> Option<f64> {
        self.geometry
            .coordinates
            .get(index)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    /// Get longitude (degrees).
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.coordinate(0)
    }

    /// Get latitude (degrees).
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.coordinate(1)
    }

    /// Get depth in kilometers (positive down).
    #[must_use]
    pub fn depth_km(&self) -> Option<f64> {
        self.coordinate(2)
    }

    /// The fields the locator needs, keyed the way the page URL keys them.
    #[must_use]
    pub fn to_event_params(&self) -> EventParams {
        let finite = |v: Option<f64>| v.filter(|n| n.is_finite());
        EventParams {
            id: Some(self.id.clone()),
            lng: self.longitude(),
            lat: self.latitude(),
            depth: self.depth_km(),
            time: Some(self.properties.time.to_string()),
            location: self.properties.place.clone(),
            magnitude: finite(self.properties.mag),
            mmi: finite(self.properties.mmi),
            sig: finite(self.properties.sig),
        }
    }
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// Always "Point"
    #[serde(rename = "type")]
    pub type_: String,

    /// Coordinates: [longitude, latitude, depth_km]; depth may be null
    pub coordinates: Vec<Option<f64>>,
}

/// Event properties from USGS API.
#[derive(Debug, Clone, Deserialize)]
pub struct Properties {
    /// Magnitude value
    pub mag: Option<f64>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event time (ms since epoch)
    pub time: i64,

    /// Modified Mercalli Intensity
    #[serde(default)]
    pub mmi: Option<f64>,

    /// Significance score (0-1000+)
    #[serde(default)]
    pub sig: Option<f64>,
}

/// One point of the local hypocenter dataset.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HypocenterPoint {
    /// `[lng, lat, elevation_m]` with depth as negative meters
    pub position: [f64; 3],
}

impl HypocenterPoint {
    #[must_use]
    pub fn elevation_m(&self) -> f64 {
        self.position[2]
    }
}

/// Parse the hypocenter dataset (a JSON array of points).
///
/// # Errors
///
/// Returns an error if the JSON does not match the dataset shape.
pub fn parse_hypocenters(json: &str) -> Result<Vec<HypocenterPoint>, LocatorError> {
    Ok(serde_json::from_str(json)?)
}
