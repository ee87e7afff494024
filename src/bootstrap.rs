//! Page start-up: fetch what the first render needs, concurrently.
//!
//! The recent-earthquake feed and the optional detail lookup for `?id=`
//! run side by side on the blocking pool and are joined before the session
//! starts. Each request is tried once. A failed detail lookup drops the id
//! and the page opens in browsing mode.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::client::{FeedType, UsgsClient};
use crate::errors::LocatorError;
use crate::models::{Feature, FeatureCollection};
use crate::params::{EventParams, QueryParams};

/// Everything joined before the first render.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub query: QueryParams,
    /// The URL event, backfilled from the detail record when an id was given
    pub event: EventParams,
    pub feed: FeatureCollection,
}

impl Bootstrap {
    /// Whether the session should open on one event.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.event.is_locatable()
    }
}

/// Merge a detail lookup into the URL event.
///
/// On success the record's fields replace the URL's; on failure the id is
/// dropped and whatever the URL carried inline is kept.
#[must_use]
pub fn apply_detail(mut event: EventParams, detail: Result<Feature, LocatorError>) -> EventParams {
    match detail {
        Ok(feature) => {
            let fetched = feature.to_event_params();
            EventParams {
                id: event.id.take().or(fetched.id),
                ..fetched
            }
        }
        Err(e) => {
            warn!("detail lookup failed, browsing instead: {}", e);
            event.id = None;
            event
        }
    }
}

/// Resolve the URL event, looking it up by id when one is given.
pub async fn resolve_event(client: &UsgsClient, query: &QueryParams) -> EventParams {
    let event = query.event.clone();
    let Some(id) = event.id.clone() else {
        return event;
    };

    let client = client.clone();
    let detail = tokio::task::spawn_blocking(move || client.fetch_detail(&id))
        .await
        .unwrap_or_else(|e| Err(LocatorError::InvalidResponse(format!("lookup task failed: {e}"))));
    apply_detail(event, detail)
}

/// Fetch the feed and resolve the URL event concurrently.
///
/// # Errors
///
/// Returns an error if the feed cannot be fetched; detail failures only
/// degrade to browsing.
pub async fn bootstrap(client: &UsgsClient, query: QueryParams, feed_type: FeedType) -> Result<Bootstrap> {
    let feed_client = client.clone();
    let feed = tokio::task::spawn_blocking(move || feed_client.fetch_feed(feed_type));

    let (feed, event) = tokio::join!(feed, resolve_event(client, &query));
    let feed = feed
        .context("feed task panicked")?
        .context("failed to fetch earthquake feed")?;

    debug!(
        events = feed.features.len(),
        focused = event.is_locatable(),
        "bootstrap complete"
    );
    Ok(Bootstrap { query, event, feed })
}
