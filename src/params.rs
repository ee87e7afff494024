//! Query-string parameters describing a single earthquake.
//!
//! The page URL carries an event either by USGS id (`?id=us7000abcd`) or
//! inline (`?lng=..&lat=..&d=..&t=..&l=..&m=..&s=..&g=..`). The whole query
//! is parsed once into a typed record; bad or missing numbers become `None`.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Bytes left as-is when a value is put back into a link: the unreserved
/// marks kept by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Event fields carried by the URL (or backfilled by a detail lookup).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventParams {
    /// USGS event id
    pub id: Option<String>,
    /// Longitude in degrees
    pub lng: Option<f64>,
    /// Latitude in degrees
    pub lat: Option<f64>,
    /// Depth in kilometers (positive down)
    pub depth: Option<f64>,
    /// Origin time: epoch milliseconds or an ISO-8601 timestamp
    pub time: Option<String>,
    /// Human-readable place description
    pub location: Option<String>,
    /// Magnitude
    pub magnitude: Option<f64>,
    /// Modified Mercalli Intensity (0-12)
    pub mmi: Option<f64>,
    /// USGS significance score
    pub sig: Option<f64>,
}

impl EventParams {
    /// Whether the record carries enough to place a hypocenter on the map.
    #[must_use]
    pub fn is_locatable(&self) -> bool {
        self.lng.is_some() && self.lat.is_some() && self.time.is_some()
    }

    /// Turn a locatable record into a focused event.
    #[must_use]
    pub fn focus(self) -> Option<FocusedEvent> {
        if self.time.is_none() {
            return None;
        }
        match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => Some(FocusedEvent {
                lng,
                lat,
                params: self,
            }),
            _ => None,
        }
    }
}

/// An event with a known surface position.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusedEvent {
    pub lng: f64,
    pub lat: f64,
    pub params: EventParams,
}

impl FocusedEvent {
    /// Depth in kilometers, never negative.
    #[must_use]
    pub fn depth_km(&self) -> f64 {
        self.params
            .depth
            .filter(|d| d.is_finite())
            .map_or(0.0, |d| d.max(0.0))
    }

    /// Depth as an elevation in meters (surface = 0, downward negative).
    #[must_use]
    pub fn elevation_m(&self) -> f64 {
        -self.depth_km() * 1000.0
    }
}

/// Everything recognized in the page query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub event: EventParams,
    /// `static` was present: render once without interaction
    pub static_render: bool,
}

impl QueryParams {
    /// Parse a query string. A leading `?` or a full URL are both accepted.
    ///
    /// Keys and values are percent-decoded with `+` kept literal, so a
    /// `+09:00` offset survives. The first occurrence of a key wins and
    /// unknown keys are ignored.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.split_once('?').map_or(query, |(_, q)| q);
        let query = query.split_once('#').map_or(query, |(q, _)| q);

        let mut raw: HashMap<String, String> = HashMap::new();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            raw.entry(decode_component(key))
                .or_insert_with(|| decode_component(value));
        }

        let text = |key: &str| {
            raw.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let number = |key: &str| raw.get(key).and_then(|v| parse_number(v));

        Self {
            event: EventParams {
                id: text("id"),
                lng: number("lng"),
                lat: number("lat"),
                depth: number("d"),
                time: text("t"),
                location: text("l"),
                magnitude: number("m"),
                mmi: number("s"),
                sig: number("g"),
            },
            static_render: raw.contains_key("static"),
        }
    }

    /// Whether the page should open focused on one event.
    ///
    /// An id alone is enough: the remaining fields come from a detail lookup.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.event.is_locatable() || self.event.id.is_some()
    }

    /// Interactive unless a focused event was asked to render statically.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        !(self.is_focused() && self.static_render)
    }
}

/// Coerce a query value to a finite number.
#[must_use]
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Query string that reopens the page on a single event.
#[must_use]
pub fn id_query(id: &str) -> String {
    format!("?id={}", utf8_percent_encode(id, COMPONENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_event() {
        let q = QueryParams::parse(
            "?lng=142.37&lat=38.32&d=29&t=2011-03-11T05%3A46%3A24Z&l=Tohoku%2C%20Japan&m=9.1&s=9&g=2184",
        );
        let e = &q.event;
        assert_eq!(e.lng, Some(142.37));
        assert_eq!(e.lat, Some(38.32));
        assert_eq!(e.depth, Some(29.0));
        assert_eq!(e.time.as_deref(), Some("2011-03-11T05:46:24Z"));
        assert_eq!(e.location.as_deref(), Some("Tohoku, Japan"));
        assert_eq!(e.magnitude, Some(9.1));
        assert_eq!(e.mmi, Some(9.0));
        assert_eq!(e.sig, Some(2184.0));
        assert!(q.is_focused());
        assert!(q.is_interactive());
    }

    #[test]
    fn test_non_numeric_values_are_absent() {
        let q = QueryParams::parse("lng=abc&lat=&d=deep&m=NaN&g=inf");
        assert_eq!(q.event.lng, None);
        assert_eq!(q.event.lat, None);
        assert_eq!(q.event.depth, None);
        assert_eq!(q.event.magnitude, None);
        assert_eq!(q.event.sig, None);
        assert!(!q.is_focused());
    }

    #[test]
    fn test_mmi_parsed_independently_of_magnitude() {
        let q = QueryParams::parse("?s=6.4");
        assert_eq!(q.event.magnitude, None);
        assert_eq!(q.event.mmi, Some(6.4));
    }

    #[test]
    fn test_id_alone_is_focused() {
        let q = QueryParams::parse("?id=abc123");
        assert_eq!(q.event.id.as_deref(), Some("abc123"));
        assert!(q.is_focused());
        assert!(!q.event.is_locatable());
    }

    #[test]
    fn test_static_needs_focus() {
        assert!(QueryParams::parse("?static").is_interactive());
        assert!(!QueryParams::parse("?id=abc123&static=1").is_interactive());
    }

    #[test]
    fn test_first_occurrence_wins_and_unknown_keys_ignored() {
        let q = QueryParams::parse("?m=5.5&zoom=3&m=7.0");
        assert_eq!(q.event.magnitude, Some(5.5));
    }

    #[test]
    fn test_full_url_accepted() {
        let q = QueryParams::parse("https://example.com/index.html?id=us7000abcd#top");
        assert_eq!(q.event.id.as_deref(), Some("us7000abcd"));
    }

    #[test]
    fn test_focus_requires_position_and_time() {
        let partial = QueryParams::parse("?lng=10&lat=20").event;
        assert!(partial.focus().is_none());

        let event = QueryParams::parse("?lng=10&lat=20&t=0&d=-2").event;
        let focused = event.focus().expect("locatable");
        assert!((focused.lng - 10.0).abs() < f64::EPSILON);
        assert!(focused.depth_km().abs() < f64::EPSILON);
    }

    #[test]
    fn test_id_query_encodes() {
        assert_eq!(id_query("us7000abcd"), "?id=us7000abcd");
        assert_eq!(id_query("a b&c+d"), "?id=a%20b%26c%2Bd");
        let back = QueryParams::parse(&id_query("a b&c+d"));
        assert_eq!(back.event.id.as_deref(), Some("a b&c+d"));
    }

    #[test]
    fn test_plus_is_literal() {
        let q = QueryParams::parse("?lng=142&lat=38&t=2011-03-11T14:46:24+09:00&l=New+Zealand");
        assert_eq!(q.event.time.as_deref(), Some("2011-03-11T14:46:24+09:00"));
        assert_eq!(q.event.location.as_deref(), Some("New+Zealand"));
    }

    #[test]
    fn test_offset_time_reaches_the_panel() {
        use crate::timefmt::{FormattedTime, TimeMode};

        let q = QueryParams::parse("?lng=142&lat=38&t=2011-03-11T14:46:24+09:00");
        let time = FormattedTime::from_raw(q.event.time.as_deref(), TimeMode::Utc);
        assert_eq!(time.date, "2011-03-11");
        assert_eq!(time.time, "05:46:24");
    }

    #[test]
    fn test_key_without_value() {
        let q = QueryParams::parse("?static&id=abc&&lng");
        assert!(q.static_render);
        assert_eq!(q.event.id.as_deref(), Some("abc"));
        assert_eq!(q.event.lng, None);
    }
}
