//! USGS Earthquake API client and local dataset loading.
//!
//! Provides blocking HTTP access to USGS summary and detail feeds.
//! Uses reqwest with rustls for TLS.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::errors::LocatorError;
use crate::models::{Feature, FeatureCollection, HypocenterPoint, parse_hypocenters};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("eqlocator/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
pub const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Available feed types for summary feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedType {
    AllHour,
    AllDay,
    AllWeek,
    AllMonth,
    Mag1Hour,
    Mag1Day,
    Mag1Week,
    Mag1Month,
    Mag25Hour,
    Mag25Day,
    Mag25Week,
    Mag25Month,
    Mag45Hour,
    Mag45Day,
    Mag45Week,
    /// Feed behind the recent-earthquake list
    #[default]
    Mag45Month,
    SignificantHour,
    SignificantDay,
    SignificantWeek,
    SignificantMonth,
}

impl FeedType {
    /// Get the URL path segment for this feed type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllHour => "all_hour",
            Self::AllDay => "all_day",
            Self::AllWeek => "all_week",
            Self::AllMonth => "all_month",
            Self::Mag1Hour => "1.0_hour",
            Self::Mag1Day => "1.0_day",
            Self::Mag1Week => "1.0_week",
            Self::Mag1Month => "1.0_month",
            Self::Mag25Hour => "2.5_hour",
            Self::Mag25Day => "2.5_day",
            Self::Mag25Week => "2.5_week",
            Self::Mag25Month => "2.5_month",
            Self::Mag45Hour => "4.5_hour",
            Self::Mag45Day => "4.5_day",
            Self::Mag45Week => "4.5_week",
            Self::Mag45Month => "4.5_month",
            Self::SignificantHour => "significant_hour",
            Self::SignificantDay => "significant_day",
            Self::SignificantWeek => "significant_week",
            Self::SignificantMonth => "significant_month",
        }
    }
}

impl std::str::FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all_hour" => Ok(Self::AllHour),
            "all_day" => Ok(Self::AllDay),
            "all_week" => Ok(Self::AllWeek),
            "all_month" => Ok(Self::AllMonth),
            "1.0_hour" => Ok(Self::Mag1Hour),
            "1.0_day" => Ok(Self::Mag1Day),
            "1.0_week" => Ok(Self::Mag1Week),
            "1.0_month" => Ok(Self::Mag1Month),
            "2.5_hour" => Ok(Self::Mag25Hour),
            "2.5_day" => Ok(Self::Mag25Day),
            "2.5_week" => Ok(Self::Mag25Week),
            "2.5_month" => Ok(Self::Mag25Month),
            "4.5_hour" => Ok(Self::Mag45Hour),
            "4.5_day" => Ok(Self::Mag45Day),
            "4.5_week" => Ok(Self::Mag45Week),
            "4.5_month" => Ok(Self::Mag45Month),
            "significant_hour" => Ok(Self::SignificantHour),
            "significant_day" => Ok(Self::SignificantDay),
            "significant_week" => Ok(Self::SignificantWeek),
            "significant_month" => Ok(Self::SignificantMonth),
            _ => Err(format!("unknown feed type: {s}")),
        }
    }
}

/// Client for USGS earthquake API.
#[derive(Debug, Clone)]
pub struct UsgsClient {
    client: Client,
    base_url: String,
}

impl UsgsClient {
    /// Create a new USGS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, LocatorError> {
        Self::with_base_url(USGS_BASE_URL)
    }

    /// Create a client against another host serving the same paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: &str) -> Result<Self, LocatorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of a summary feed.
    #[must_use]
    pub fn feed_url(&self, feed_type: FeedType) -> String {
        format!(
            "{}/earthquakes/feed/v1.0/summary/{}.geojson",
            self.base_url,
            feed_type.as_str()
        )
    }

    /// URL of a single event's detail record.
    #[must_use]
    pub fn detail_url(&self, id: &str) -> String {
        format!("{}/earthquakes/feed/v1.0/detail/{id}.geojson", self.base_url)
    }

    /// Fetch a summary GeoJSON feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self), fields(feed = feed_type.as_str()))]
    pub fn fetch_feed(&self, feed_type: FeedType) -> Result<FeatureCollection, LocatorError> {
        let feed: FeatureCollection = self.get_json(&self.feed_url(feed_type))?;

        // Validate response structure
        feed.validate()?;

        debug!("fetched {} events", feed.features.len());
        Ok(feed)
    }

    /// Fetch one event by USGS id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the id is unknown, or the
    /// record is not a usable event.
    #[instrument(skip(self))]
    pub fn fetch_detail(&self, id: &str) -> Result<Feature, LocatorError> {
        let feature: Feature = self.get_json(&self.detail_url(id))?;
        feature.validate()?;

        debug!("fetched detail for {}", feature.id);
        Ok(feature)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LocatorError> {
        debug!("fetching {}", url);

        let response = self.client.get(url).send()?;
        let response = check_status(response)?;
        Ok(response.json()?)
    }
}

/// Turn a non-success status into an API error carrying the body.
fn check_status(response: Response) -> Result<Response, LocatorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(LocatorError::Api {
        status: status.as_u16(),
        message: body,
    })
}

/// Read the hypocenter point dataset from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[instrument]
pub fn load_hypocenters(path: &Path) -> Result<Vec<HypocenterPoint>, LocatorError> {
    let json = std::fs::read_to_string(path)?;
    let points = parse_hypocenters(&json)?;
    debug!("loaded {} hypocenters", points.len());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_type_round_trip() {
        let types = [
            FeedType::AllHour,
            FeedType::Mag45Month,
            FeedType::SignificantWeek,
        ];

        for feed_type in types {
            let s = feed_type.as_str();
            let parsed: FeedType = s.parse().expect("failed to parse");
            assert_eq!(parsed, feed_type);
        }
    }

    #[test]
    fn test_default_feed_is_month_of_large_events() {
        assert_eq!(FeedType::default().as_str(), "4.5_month");
    }

    #[test]
    fn test_endpoint_urls() {
        let client = UsgsClient::with_base_url("http://localhost:9000/").expect("client");
        assert_eq!(
            client.feed_url(FeedType::Mag45Month),
            "http://localhost:9000/earthquakes/feed/v1.0/summary/4.5_month.geojson"
        );
        assert_eq!(
            client.detail_url("abc123"),
            "http://localhost:9000/earthquakes/feed/v1.0/detail/abc123.geojson"
        );
    }

    #[test]
    fn test_load_missing_dataset_fails() {
        let err = load_hypocenters(Path::new("does/not/exist.json")).expect_err("missing file");
        assert!(matches!(err, LocatorError::Io(_)));
    }

    #[test]
    fn test_load_bundled_dataset() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/hypocenters.json");
        let points = load_hypocenters(&path).expect("bundled dataset");
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.elevation_m() <= 0.0));
    }
}
