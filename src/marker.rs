//! Hypocenter marker geometry.
//!
//! The marker is five primitives drawn over the map: two expanding wave
//! rings and a blurred point at the hypocenter, a leader line up to the
//! surface, and a flattened point at the epicenter. This module computes
//! where they land on screen; drawing them is up to the host.

use serde::Serialize;

use crate::palette::{Rgb, depth_color};
use crate::params::FocusedEvent;

/// Largest wave ring radius in pixels before it restarts.
pub const WAVE_MAX_RADIUS: f64 = 300.0;

/// Milliseconds for one full opacity cycle.
pub const WAVE_PERIOD_MS: f64 = 3000.0;

/// Wave ring frame used when a single still image is rendered.
pub const STATIC_WAVE_TIME_MS: f64 = 750.0;

const WAVE_SPEED_MS_PER_PX: f64 = 10.0;
const TOOLTIP_OFFSET_PX: f64 = 4.0;

/// Projection from geographic coordinates to screen pixels.
///
/// Implemented by the host's map viewport.
pub trait Projector {
    /// Project a position with an altitude in meters (negative below ground).
    fn project(&self, lng: f64, lat: f64, altitude_m: f64) -> ScreenPoint;

    /// Camera pitch in degrees (0 = looking straight down).
    fn pitch(&self) -> f64;

    /// Longitude of the map center.
    fn center_lng(&self) -> f64;
}

/// A position in CSS pixels from the top-left of the map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// `Math.sign` semantics: zero stays zero.
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Longitude shift that keeps a marker on the same side of the ±180° seam
/// as the map center.
///
/// Returns `0`, `360` or `-360`.
#[must_use]
pub fn antimeridian_offset(marker_lng: f64, center_lng: f64) -> f64 {
    let shortest = (marker_lng - center_lng + 540.0) % 360.0 - 180.0;
    let hemispheres = sign(marker_lng) - sign(center_lng);
    if shortest * hemispheres < 0.0 {
        sign(shortest) * 360.0
    } else {
        0.0
    }
}

/// One expanding ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaveRing {
    pub radius: f64,
    pub opacity: f64,
}

/// Both rings at `now_ms`; the second runs half a cycle behind the first.
#[must_use]
pub fn wave_rings(now_ms: f64) -> [WaveRing; 2] {
    let ring = |radius_offset: f64, phase: f64| WaveRing {
        radius: (now_ms / WAVE_SPEED_MS_PER_PX + radius_offset) % WAVE_MAX_RADIUS,
        opacity: 1.0 - (now_ms / WAVE_PERIOD_MS + phase) % 1.0,
    };
    [ring(0.0, 0.0), ring(WAVE_MAX_RADIUS / 2.0, 0.5)]
}

/// A depth label next to the pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub position: ScreenPoint,
    pub text: String,
}

/// Screen geometry of a visible marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerFrame {
    pub hypocenter: ScreenPoint,
    pub epicenter: ScreenPoint,
    /// Leader line from the hypocenter up to the epicenter
    pub leader: [ScreenPoint; 2],
    /// Hypocenter elevation in meters (negative below ground)
    pub elevation_m: f64,
    /// Hypocenter fill
    pub color: Rgb,
    /// Vertical squash of the epicenter point onto the tilted map plane
    pub epicenter_scale_y: f64,
    pub tooltip: Option<Tooltip>,
}

impl MarkerFrame {
    fn new(hypocenter: ScreenPoint, epicenter: ScreenPoint, elevation_m: f64, pitch: f64) -> Self {
        Self {
            hypocenter,
            epicenter,
            leader: [hypocenter, epicenter],
            elevation_m,
            color: depth_color(elevation_m),
            epicenter_scale_y: pitch.to_radians().cos(),
            tooltip: None,
        }
    }
}

/// A point of the hypocenter dataset under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverInfo {
    /// `[lng, lat, elevation_m]`
    pub position: [f64; 3],
    /// Where the point was picked on screen
    pub pointer: ScreenPoint,
}

/// Marker for a focused event: both ends are projected.
#[must_use]
pub fn event_frame(event: &FocusedEvent, projector: &dyn Projector) -> MarkerFrame {
    let lng = event.lng + antimeridian_offset(event.lng, projector.center_lng());
    let elevation_m = event.elevation_m();
    let epicenter = projector.project(lng, event.lat, 0.0);
    let hypocenter = projector.project(lng, event.lat, elevation_m);
    MarkerFrame::new(hypocenter, epicenter, elevation_m, projector.pitch())
}

/// Marker for a hovered dataset point: the hypocenter is where it was picked.
#[must_use]
pub fn hover_frame(info: &HoverInfo, projector: &dyn Projector) -> MarkerFrame {
    let [lng, lat, elevation_m] = info.position;
    let lng = lng + antimeridian_offset(lng, projector.center_lng());
    let epicenter = projector.project(lng, lat, 0.0);

    let mut frame = MarkerFrame::new(info.pointer, epicenter, elevation_m, projector.pitch());
    frame.tooltip = Some(Tooltip {
        position: ScreenPoint::new(
            info.pointer.x + TOOLTIP_OFFSET_PX,
            info.pointer.y + TOOLTIP_OFFSET_PX,
        ),
        text: format!("{:.2}km", -elevation_m / 1000.0),
    });
    frame
}

/// Whether the marker is drawn.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "frame", rename_all = "lowercase")]
pub enum MarkerState {
    #[default]
    Hidden,
    Visible(MarkerFrame),
}

/// Keeps the current marker and wave rings between frames.
#[derive(Debug, Clone)]
pub struct MarkerRenderer {
    state: MarkerState,
    waves: [WaveRing; 2],
}

impl Default for MarkerRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: MarkerState::Hidden,
            waves: wave_rings(0.0),
        }
    }

    pub fn show_event(&mut self, event: &FocusedEvent, projector: &dyn Projector) {
        self.state = MarkerState::Visible(event_frame(event, projector));
    }

    pub fn show_hover(&mut self, info: &HoverInfo, projector: &dyn Projector) {
        self.state = MarkerState::Visible(hover_frame(info, projector));
    }

    pub fn hide(&mut self) {
        self.state = MarkerState::Hidden;
    }

    /// Advance the wave rings to `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> [WaveRing; 2] {
        self.waves = wave_rings(now_ms);
        self.waves
    }

    #[must_use]
    pub fn state(&self) -> &MarkerState {
        &self.state
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        matches!(self.state, MarkerState::Visible(_))
    }

    #[must_use]
    pub fn waves(&self) -> [WaveRing; 2] {
        self.waves
    }
}
