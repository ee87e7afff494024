//! HTTP API for the locator.
//!
//! Provides the resolved session to a map page using:
//! - Axum for HTTP server
//! - SSE (Server-Sent Events) for the marker wave animation
//! - JSON endpoints for the session, camera, recent list and dataset

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::bootstrap::{self, Bootstrap};
use crate::camera::{CameraOptions, ViewportSize, calculate_camera_options};
use crate::client::{self, FeedType, UsgsClient};
use crate::host::{Host, Input, Snapshot};
use crate::marker::wave_rings;
use crate::models::{FeatureCollection, HypocenterPoint};
use crate::palette::depth_color;
use crate::panel::{RecentItem, recent_items};
use crate::params::QueryParams;
use crate::timefmt::TimeMode;

/// Interval between wave frames on the SSE stream.
const WAVE_TICK_MS: u64 = 50;

const DEFAULT_WIDTH: f64 = 1280.0;
const DEFAULT_HEIGHT: f64 = 800.0;
const DEFAULT_MAX_ZOOM: f64 = 7.0;

/// Radius of a dataset point on the map, in meters.
const POINT_RADIUS_M: f64 = 500.0;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub feed_type: FeedType,
    /// Hypocenter dataset, loaded once at start-up
    pub hypocenters: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            feed_type: FeedType::default(),
            hypocenters: PathBuf::from("data/hypocenters.json"),
        }
    }
}

/// A dataset point with its depth color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColoredHypocenter {
    pub position: [f64; 3],
    pub color: [u8; 3],
    pub radius_m: f64,
}

impl From<&HypocenterPoint> for ColoredHypocenter {
    fn from(point: &HypocenterPoint) -> Self {
        Self {
            position: point.position,
            color: depth_color(point.elevation_m()).to_array(),
            radius_m: POINT_RADIUS_M,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Channel for broadcasting wave frames to SSE clients
    tx: broadcast::Sender<String>,
    client: UsgsClient,
    hypocenters: Arc<Vec<ColoredHypocenter>>,
    /// Server configuration
    config: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, client: UsgsClient, hypocenters: &[HypocenterPoint]) -> Self {
        let (tx, _rx) = broadcast::channel::<String>(16);
        Self {
            tx,
            client,
            hypocenters: Arc::new(hypocenters.iter().map(ColoredHypocenter::from).collect()),
            config,
        }
    }
}

/// Errors returned by API handlers as `{"error": ...}` bodies.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// USGS could not be reached or answered badly
    Upstream(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Upstream(e) => {
                tracing::warn!("upstream failure: {e:#}");
                (StatusCode::BAD_GATEWAY, format!("{e:#}"))
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/session", get(session_handler))
        .route("/api/replay", post(replay_handler))
        .route("/api/camera", get(camera_handler))
        .route("/api/recent", get(recent_handler))
        .route("/api/hypocenters", get(hypocenters_handler))
        .route("/api/waves", get(waves_handler))
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(config: ServerConfig, client: UsgsClient) -> anyhow::Result<()> {
    let hypocenters = client::load_hypocenters(&config.hypocenters).unwrap_or_else(|e| {
        tracing::warn!(
            "hypocenter dataset {} unavailable, serving none: {}",
            config.hypocenters.display(),
            e
        );
        Vec::new()
    });

    let state = AppState::new(config.clone(), client, &hypocenters);

    // Spawn the wave clock
    let tx = state.tx.clone();
    tokio::spawn(async move {
        tick_waves(tx).await;
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌍 eqlocator starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Background task that broadcasts the wave rings on a monotonic clock.
async fn tick_waves(tx: broadcast::Sender<String>) {
    let started = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(Duration::from_millis(WAVE_TICK_MS));

    loop {
        interval.tick().await;
        if tx.receiver_count() == 0 {
            continue;
        }

        let now_ms = started.elapsed().as_secs_f64() * 1000.0;
        match serde_json::to_string(&wave_rings(now_ms)) {
            Ok(frame) => {
                let _ = tx.send(frame);
            }
            Err(e) => tracing::warn!("failed to encode wave frame: {}", e),
        }
    }
}

/// Main page handler - serves the HTML UI.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

/// Viewport size carried next to the event parameters.
#[derive(Debug, Default, Deserialize)]
struct ViewportQuery {
    width: Option<f64>,
    height: Option<f64>,
}

impl ViewportQuery {
    fn size(&self) -> ViewportSize {
        ViewportSize::new(
            self.width.unwrap_or(DEFAULT_WIDTH),
            self.height.unwrap_or(DEFAULT_HEIGHT),
        )
    }
}

async fn load(state: &AppState, query: QueryParams) -> Result<Bootstrap, ApiError> {
    let boot = bootstrap::bootstrap(&state.client, query, state.config.feed_type)
        .await
        .map_err(ApiError::Upstream)?;
    tracing::debug!(focused = boot.is_focused(), "session loaded");
    Ok(boot)
}

/// Resolve a shared link into the settled page.
async fn session_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    Query(viewport): Query<ViewportQuery>,
) -> Result<Json<Snapshot>, ApiError> {
    let query = QueryParams::parse(raw.as_deref().unwrap_or_default());
    let boot = load(&state, query).await?;

    let host = Host::start(&boot.query, boot.event, viewport.size()).with_feed(boot.feed);
    Ok(Json(host.snapshot()))
}

/// A start-up link followed by inputs to replay.
#[derive(Debug, Deserialize)]
struct ReplayRequest {
    #[serde(default)]
    query: String,
    width: Option<f64>,
    height: Option<f64>,
    #[serde(default)]
    inputs: Vec<Input>,
}

/// Start a session and replay page inputs against it.
async fn replay_handler(
    State(state): State<AppState>,
    Json(request): Json<ReplayRequest>,
) -> Result<Json<Snapshot>, ApiError> {
    let size = ViewportQuery {
        width: request.width,
        height: request.height,
    }
    .size();
    let boot = load(&state, QueryParams::parse(&request.query)).await?;

    let mut host = Host::start(&boot.query, boot.event, size).with_feed(boot.feed);
    for input in &request.inputs {
        match host.needs_lookup(input) {
            Some(query) => {
                let event = bootstrap::resolve_event(&state.client, &query).await;
                host.select(event);
            }
            None => host.apply(input),
        }
    }
    Ok(Json(host.snapshot()))
}

#[derive(Debug, Deserialize)]
struct CameraQuery {
    depth: f64,
    max_zoom: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
}

/// Camera framing for a depth and viewport.
async fn camera_handler(Query(query): Query<CameraQuery>) -> Result<Json<CameraOptions>, ApiError> {
    let max_zoom = query.max_zoom.unwrap_or(DEFAULT_MAX_ZOOM);
    if !max_zoom.is_finite() || max_zoom < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "max_zoom must be a non-negative number, got {max_zoom}"
        )));
    }
    let size = ViewportQuery {
        width: query.width,
        height: query.height,
    }
    .size();
    Ok(Json(calculate_camera_options(query.depth, max_zoom, size)))
}

#[derive(Debug, Default, Deserialize)]
struct RecentQuery {
    active: Option<String>,
    #[serde(default)]
    utc: bool,
}

/// Recent list rows from the configured feed.
async fn recent_handler(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentItem>>, ApiError> {
    let client = state.client.clone();
    let feed_type = state.config.feed_type;
    let feed: FeatureCollection = tokio::task::spawn_blocking(move || client.fetch_feed(feed_type))
        .await
        .map_err(|e| ApiError::Upstream(e.into()))?
        .map_err(|e| ApiError::Upstream(e.into()))?;

    let mode = if query.utc { TimeMode::Utc } else { TimeMode::Local };
    Ok(Json(recent_items(&feed, query.active.as_deref(), mode)))
}

/// The hypocenter dataset with depth colors.
async fn hypocenters_handler(State(state): State<AppState>) -> Json<Vec<ColoredHypocenter>> {
    Json(state.hypocenters.as_ref().clone())
}

/// SSE stream of wave-ring frames.
async fn waves_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(frame) => Some(Ok(Event::default().event("waves").data(frame))),
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>eqlocator</title>
<style>
  body { margin: 0; font: 14px/1.4 system-ui, sans-serif; background: #111; color: #eee; }
  main { display: grid; grid-template-columns: 310px 1fr; height: 100vh; }
  aside { overflow-y: auto; border-right: 1px solid #333; }
  aside a { display: block; padding: 8px 12px; color: inherit; text-decoration: none; border-bottom: 1px solid #222; }
  aside a.active { background: #2a2a40; }
  .sig-1 { color: #fee08b; } .sig-2 { color: #f46d43; }
  pre { margin: 0; padding: 12px; overflow: auto; }
  #waves { position: fixed; right: 12px; bottom: 12px; opacity: .6; }
  @media (max-width: 640px) { main { grid-template-columns: 1fr; grid-template-rows: 196px 1fr; } }
</style>
</head>
<body>
<main>
  <aside id="recent"></aside>
  <pre id="session">loading…</pre>
</main>
<div id="waves"></div>
<script>
const size = `width=${innerWidth}&height=${innerHeight}`;
const q = location.search ? location.search.slice(1) + "&" : "";
fetch(`/api/session?${q}${size}`).then(r => r.json()).then(s => {
  document.getElementById("session").textContent = JSON.stringify(s, null, 2);
  document.getElementById("recent").innerHTML = (s.recent || []).map(i =>
    `<a class="sig-${i.significance}${i.active ? " active" : ""}" href="${i.query}">
       <div>${i.date} ${i.time} (${i.timezone})</div><div>${i.label}</div></a>`).join("");
});
new EventSource("/api/waves").addEventListener("waves", e => {
  const [a, b] = JSON.parse(e.data);
  document.getElementById("waves").textContent =
    `${a.radius.toFixed(0)}px ${b.radius.toFixed(0)}px`;
});
</script>
</body>
</html>
"##;
