//! Headless host for the session.
//!
//! Plays the role of the map page without a browser: the map is a
//! [`MercatorViewport`], every camera move lands instantly, and the
//! resulting panel, camera and marker are collected into a snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::{CameraOptions, ViewportSize, calculate_camera_options};
use crate::marker::{HoverInfo, MarkerState, Projector, ScreenPoint, WaveRing};
use crate::models::{Feature, FeatureCollection};
use crate::panel::{EventPanel, RecentItem, recent_items};
use crate::params::{EventParams, QueryParams};
use crate::session::{Command, InitialView, Mode, Session};
use crate::viewport::MercatorViewport;

/// Max zoom used when reporting the framing of a settled event.
const REPORT_MAX_ZOOM: f64 = 7.0;

/// What the page looks like once the camera has settled.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub interactive: bool,
    pub focused: bool,
    /// Dataset points answer the pointer
    pub hover_enabled: bool,
    pub initial_view: InitialView,
    /// Commands issued on the way, in order
    pub commands: Vec<Command>,
    pub panel: Option<EventPanel>,
    pub camera: Option<CameraOptions>,
    pub center: [f64; 2],
    pub zoom: f64,
    pub pitch: f64,
    pub marker: MarkerState,
    pub waves: [WaveRing; 2],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent: Vec<RecentItem>,
}

/// A user or page event replayed against a started session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum Input {
    /// Open another shared link in place
    Select { query: String },
    /// Click a recent-list row
    PickRecent { id: String },
    /// The panel's close button
    Close,
    Resize { width: f64, height: f64 },
    /// Pointer over a dataset point, or off the layer with no position
    Hover {
        position: Option<[f64; 3]>,
        #[serde(default)]
        pointer: Option<[f64; 2]>,
    },
    Frame { now_ms: f64 },
}

/// A session together with the map it drives.
#[derive(Debug)]
pub struct Host {
    session: Session,
    viewport: MercatorViewport,
    initial_view: InitialView,
    commands: Vec<Command>,
    panel: Option<EventPanel>,
    feed: FeatureCollection,
    recent: Vec<RecentItem>,
}

impl Host {
    /// Create the map for `query` and run the page start-up for `event`.
    #[must_use]
    pub fn start(query: &QueryParams, event: EventParams, size: ViewportSize) -> Self {
        let session = Session::new(query.is_interactive(), size);
        let focused = event.focus();
        let initial_view = session.initial_view(query.is_focused(), focused.as_ref());

        let [lng, lat] = initial_view.center;
        let viewport = MercatorViewport::new(size, lng, lat, initial_view.zoom)
            .with_pitch(initial_view.pitch)
            .with_padding(initial_view.padding);

        let mut host = Self {
            session,
            viewport,
            initial_view,
            commands: Vec::new(),
            panel: None,
            feed: FeatureCollection::default(),
            recent: Vec::new(),
        };
        let commands = host.session.start(focused.map(|f| f.params), &host.viewport);
        host.run(commands);
        host
    }

    /// Attach the recent list; the row of the shown event starts highlighted.
    #[must_use]
    pub fn with_feed(mut self, feed: FeatureCollection) -> Self {
        let active_id = self
            .session
            .current_event()
            .and_then(|e| e.params.id.clone());
        self.recent = recent_items(&feed, active_id.as_deref(), self.session.time_mode());
        self.feed = feed;
        self
    }

    /// Replay one input and let the camera settle.
    pub fn apply(&mut self, input: &Input) {
        debug!(?input, "replaying input");
        let commands = match input {
            Input::Select { query } => {
                let event = self.resolve(QueryParams::parse(query).event);
                self.session.select(Some(event), &self.viewport)
            }
            Input::PickRecent { id } => {
                let params = self
                    .recent
                    .iter()
                    .find(|item| &item.id == id)
                    .and_then(|item| item.params_in(&self.feed));
                match params {
                    Some(params) => self.session.pick_recent(params, &self.viewport),
                    None => {
                        debug!(%id, "not in the recent list");
                        Vec::new()
                    }
                }
            }
            Input::Close => self.session.close(&self.viewport),
            Input::Resize { width, height } => {
                let size = ViewportSize::new(*width, *height);
                self.viewport.size = size;
                self.session.on_resize(size, &self.viewport)
            }
            Input::Hover { position, pointer } => {
                let info = position.map(|position| {
                    let [lng, lat, elevation_m] = position;
                    let pointer = pointer.map_or_else(
                        || self.viewport.project(lng, lat, elevation_m),
                        |[x, y]| ScreenPoint::new(x, y),
                    );
                    HoverInfo { position, pointer }
                });
                self.session.on_hover(info.as_ref(), &self.viewport);
                Vec::new()
            }
            Input::Frame { now_ms } => {
                self.session.on_frame(*now_ms);
                Vec::new()
            }
        };
        self.run(commands);
    }

    /// Open an already resolved event in place.
    pub fn select(&mut self, event: EventParams) {
        let commands = self.session.select(Some(event), &self.viewport);
        self.run(commands);
    }

    /// The link a `Select` opens, when it names an id that neither the link
    /// nor the loaded feed can place. Such links need a detail lookup
    /// before [`Host::select`].
    #[must_use]
    pub fn needs_lookup(&self, input: &Input) -> Option<QueryParams> {
        let Input::Select { query } = input else {
            return None;
        };
        let query = QueryParams::parse(query);
        let id = query.event.id.as_deref()?;
        if query.event.is_locatable() || self.feed.features.iter().any(|f| f.id == id) {
            return None;
        }
        Some(query)
    }

    /// Backfill an id-only event from the loaded feed.
    fn resolve(&self, event: EventParams) -> EventParams {
        if event.is_locatable() {
            return event;
        }
        event
            .id
            .as_deref()
            .and_then(|id| self.feed.features.iter().find(|f| f.id == id))
            .map_or(event, Feature::to_event_params)
    }

    /// Carry out commands, landing camera moves until the session settles.
    fn run(&mut self, mut commands: Vec<Command>) {
        loop {
            let moved = settle(&mut self.viewport, &commands);
            self.track(&commands);
            self.commands.append(&mut commands);
            if !moved {
                break;
            }
            self.session.on_move(&self.viewport);
            commands = self.session.on_move_end();
        }
    }

    fn track(&mut self, commands: &[Command]) {
        for command in commands {
            match command {
                Command::ShowPanel(panel) => self.panel = Some(panel.clone()),
                Command::HidePanel => self.panel = None,
                Command::HighlightItem(id) => {
                    for item in &mut self.recent {
                        item.active = id.as_deref() == Some(item.id.as_str());
                    }
                }
                _ => {}
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let camera = match self.session.mode() {
            Mode::Focused(event) => Some(calculate_camera_options(
                event.depth_km(),
                REPORT_MAX_ZOOM,
                self.viewport.size,
            )),
            _ => None,
        };

        Snapshot {
            interactive: self.session.interactive(),
            focused: matches!(self.session.mode(), Mode::Focused(_)),
            hover_enabled: self.session.hover_enabled(),
            initial_view: self.initial_view,
            commands: self.commands.clone(),
            panel: self.panel.clone(),
            camera,
            center: [self.viewport.lng, self.viewport.lat],
            zoom: self.viewport.zoom,
            pitch: self.viewport.pitch,
            marker: self.session.marker().state().clone(),
            waves: self.session.marker().waves(),
            recent: self.recent.clone(),
        }
    }
}

/// Run the page start-up for `event` and let the camera settle.
#[must_use]
pub fn render(query: &QueryParams, event: EventParams, size: ViewportSize) -> Snapshot {
    Host::start(query, event, size).snapshot()
}

/// Land every camera command on the viewport.
///
/// Returns whether any command moved the camera.
pub fn settle(viewport: &mut MercatorViewport, commands: &[Command]) -> bool {
    let mut moved = false;
    for command in commands {
        if let Command::Camera { target, .. } = command {
            viewport.jump_to(target);
            moved = true;
        }
    }
    moved
}
