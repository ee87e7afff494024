//! View models for the event panel and the recent-earthquake list.

use serde::Serialize;

use crate::models::{Feature, FeatureCollection};
use crate::params::{EventParams, id_query};
use crate::timefmt::{FormattedTime, TimeMode};

/// Shown when a value is absent.
pub const UNKNOWN: &str = "Unknown";

/// Roman numerals for rounded MMI values 0-12.
const INTENSITY_LOOKUP: [&str; 13] = [
    "I", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

/// MMI as a Roman numeral, or `-` when unknown.
#[must_use]
pub fn intensity_numeral(mmi: Option<f64>) -> &'static str {
    match mmi.filter(|m| m.is_finite()) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(m) => INTENSITY_LOOKUP[m.round().clamp(0.0, 12.0) as usize],
        None => "-",
    }
}

/// Significance tier used to highlight list entries: 2 (≥600), 1 (≥400), 0.
#[must_use]
pub fn significance_tier(sig: Option<f64>) -> u8 {
    match sig {
        Some(s) if s >= 600.0 => 2,
        Some(s) if s >= 400.0 => 1,
        _ => 0,
    }
}

#[must_use]
pub fn depth_label(depth_km: Option<f64>) -> String {
    depth_km.map_or_else(|| UNKNOWN.to_string(), |d| format!("{d:.1}km"))
}

#[must_use]
pub fn magnitude_label(magnitude: Option<f64>) -> String {
    magnitude.map_or_else(|| UNKNOWN.to_string(), |m| format!("{m:.1}"))
}

/// Everything shown in the panel for a focused event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPanel {
    pub id: Option<String>,
    #[serde(flatten)]
    pub time: FormattedTime,
    pub location: String,
    pub depth: String,
    pub intensity: String,
    pub magnitude: String,
    pub significance: u8,
}

impl EventPanel {
    #[must_use]
    pub fn new(params: &EventParams, mode: TimeMode) -> Self {
        Self {
            id: params.id.clone(),
            time: FormattedTime::from_raw(params.time.as_deref(), mode),
            location: params
                .location
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            depth: depth_label(params.depth),
            intensity: intensity_numeral(params.mmi).to_string(),
            magnitude: magnitude_label(params.magnitude),
            significance: significance_tier(params.sig),
        }
    }
}

/// One row of the recent-earthquake list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentItem {
    pub id: String,
    #[serde(flatten)]
    pub time: FormattedTime,
    /// `M6.1 - place`, or just the place when the magnitude is unknown
    pub label: String,
    pub significance: u8,
    /// The event the page was opened on
    pub active: bool,
    /// Query string that focuses this event
    pub query: String,
}

impl RecentItem {
    #[must_use]
    pub fn from_feature(feature: &Feature, active_id: Option<&str>, mode: TimeMode) -> Self {
        let params = feature.to_event_params();
        let place = params.location.as_deref().unwrap_or("Unknown location");
        let label = match params.magnitude {
            Some(m) => format!("M{m:.1} - {place}"),
            None => place.to_string(),
        };

        Self {
            id: feature.id.clone(),
            time: feature
                .time()
                .map_or_else(FormattedTime::missing, |ts| FormattedTime::new(ts, mode)),
            label,
            significance: significance_tier(params.sig),
            active: active_id == Some(feature.id.as_str()),
            query: id_query(&feature.id),
        }
    }

    /// Params to focus when this row is picked.
    #[must_use]
    pub fn params_in(&self, feed: &FeatureCollection) -> Option<EventParams> {
        feed.features
            .iter()
            .find(|f| f.id == self.id)
            .map(Feature::to_event_params)
    }
}

/// Rows for every event of a feed, in feed order (newest first).
#[must_use]
pub fn recent_items(feed: &FeatureCollection, active_id: Option<&str>, mode: TimeMode) -> Vec<RecentItem> {
    feed.features
        .iter()
        .map(|f| RecentItem::from_feature(f, active_id, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feed() -> FeatureCollection {
        serde_json::from_str(include_str!("../fixtures/sample_4.5_month.geojson"))
            .expect("failed to parse sample feed")
    }

    #[test]
    fn test_intensity_numerals() {
        assert_eq!(intensity_numeral(Some(7.0)), "VII");
        assert_eq!(intensity_numeral(Some(7.6)), "VIII");
        assert_eq!(intensity_numeral(Some(0.2)), "I");
        assert_eq!(intensity_numeral(Some(15.0)), "XII");
        assert_eq!(intensity_numeral(None), "-");
    }

    #[test]
    fn test_significance_tiers() {
        assert_eq!(significance_tier(Some(650.0)), 2);
        assert_eq!(significance_tier(Some(600.0)), 2);
        assert_eq!(significance_tier(Some(400.0)), 1);
        assert_eq!(significance_tier(Some(399.0)), 0);
        assert_eq!(significance_tier(None), 0);
    }

    #[test]
    fn test_panel_with_missing_values() {
        let params = EventParams {
            lng: Some(1.0),
            lat: Some(1.0),
            time: Some("2023-01-05T00:00:00Z".into()),
            ..EventParams::default()
        };
        let panel = EventPanel::new(&params, TimeMode::Utc);
        assert_eq!(panel.time.date, "2023-01-05");
        assert_eq!(panel.time.timezone, "UTC");
        assert_eq!(panel.depth, UNKNOWN);
        assert_eq!(panel.magnitude, UNKNOWN);
        assert_eq!(panel.intensity, "-");
        assert_eq!(panel.location, UNKNOWN);
    }

    #[test]
    fn test_recent_items_from_feed() {
        let feed = sample_feed();
        let items = recent_items(&feed, Some("us7000j1bb"), TimeMode::Utc);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].label, "M7.2 - off the east coast of Honshu, Japan");
        assert_eq!(items[0].significance, 2);
        assert!(!items[0].active);

        assert_eq!(items[1].significance, 1);
        assert!(items[1].active);
        assert_eq!(items[1].query, "?id=us7000j1bb");

        assert_eq!(items[2].label, "Coquimbo, Chile");
        assert_eq!(items[2].significance, 0);
    }

    #[test]
    fn test_recent_item_params() {
        let feed = sample_feed();
        let items = recent_items(&feed, None, TimeMode::Utc);
        let params = items[1].params_in(&feed).expect("present in feed");
        assert_eq!(params.lng, Some(-178.9));
        assert_eq!(params.depth, Some(560.2));
        assert_eq!(params.mmi, None);
    }
}
