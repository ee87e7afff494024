//! Browsing/focused state machine driven by map lifecycle events.
//!
//! The host (a browser page, the CLI renderer, a test) owns the map and
//! forwards its events here. Every handler updates the session and returns
//! the commands the host should carry out: camera moves, panel changes,
//! list highlighting and history pushes. Marker geometry is kept in the
//! session's [`MarkerRenderer`] and read back by the host after each call.

use serde::Serialize;
use tracing::debug;

use crate::camera::{CameraOptions, DeviceClass, Padding, ViewportSize, calculate_camera_options};
use crate::marker::{HoverInfo, MarkerRenderer, Projector, STATIC_WAVE_TIME_MS};
use crate::panel::EventPanel;
use crate::params::{EventParams, FocusedEvent, id_query};
use crate::timefmt::TimeMode;

/// Map center while browsing.
pub const BROWSE_CENTER: [f64; 2] = [15.0, 40.0];
pub const BROWSE_ZOOM: f64 = 4.0;
pub const MIN_ZOOM: f64 = 2.0;

/// Zoom reached at the end of the flight to an event.
pub const FLY_ZOOM: f64 = 6.0;
/// Pitch of the final, tilted view.
pub const FOCUS_PITCH: f64 = 60.0;

const FINAL_VIEW_MAX_ZOOM: f64 = 7.0;
const RESIZE_MAX_ZOOM: f64 = 8.0;
const STATIC_MAX_ZOOM: f64 = 6.0;

const FINAL_VIEW_MS: u32 = 2000;
const RESIZE_MS: u32 = 1000;
const RESET_MS: u32 = 1000;
const FLY_CURVE: f64 = 1.0;
const FLY_SPEED: f64 = 0.5;

/// Camera fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CameraMove {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Padding>,
}

impl From<CameraOptions> for CameraMove {
    fn from(camera: CameraOptions) -> Self {
        Self {
            zoom: Some(camera.zoom),
            padding: Some(camera.padding),
            ..Self::default()
        }
    }
}

/// How the host should animate a camera move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Jump,
    Ease { duration_ms: u32 },
    Fly { curve: f64, speed: f64 },
}

/// Something the host has to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Command {
    Camera {
        target: CameraMove,
        transition: Transition,
    },
    ShowPanel(EventPanel),
    HidePanel,
    /// Attach or detach the dataset hover handler
    SetHover(bool),
    /// Highlight a recent-list row, or clear the highlight
    HighlightItem(Option<String>),
    /// Push a query string onto the browser history
    PushHistory(String),
    /// A static render is ready to be captured
    RenderComplete,
}

/// What the session is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// No event selected; hovering the dataset shows markers
    Browsing,
    /// Camera is on its way to an event
    Flying(FocusedEvent),
    /// Camera has settled on an event
    Focused(FocusedEvent),
}

/// Where the map starts before any event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InitialView {
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: f64,
    pub pitch: f64,
    pub padding: Padding,
    pub interactive: bool,
}

/// Session state shared by all event handlers.
#[derive(Debug, Clone)]
pub struct Session {
    interactive: bool,
    mode: Mode,
    size: ViewportSize,
    device: DeviceClass,
    hover_enabled: bool,
    marker: MarkerRenderer,
}

impl Session {
    #[must_use]
    pub fn new(interactive: bool, size: ViewportSize) -> Self {
        Self {
            interactive,
            mode: Mode::Browsing,
            size,
            device: size.device(),
            hover_enabled: false,
            marker: MarkerRenderer::new(),
        }
    }

    #[must_use]
    pub fn interactive(&self) -> bool {
        self.interactive
    }

    #[must_use]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    #[must_use]
    pub fn marker(&self) -> &MarkerRenderer {
        &self.marker
    }

    #[must_use]
    pub fn hover_enabled(&self) -> bool {
        self.hover_enabled
    }

    /// Interactive pages show local time, static renders UTC.
    #[must_use]
    pub fn time_mode(&self) -> TimeMode {
        if self.interactive {
            TimeMode::Local
        } else {
            TimeMode::Utc
        }
    }

    /// The event being flown to or shown.
    #[must_use]
    pub fn current_event(&self) -> Option<&FocusedEvent> {
        match &self.mode {
            Mode::Browsing => None,
            Mode::Flying(event) | Mode::Focused(event) => Some(event),
        }
    }

    /// Camera the map is created with.
    ///
    /// `focused_link` is whether the link asked for an event before any
    /// lookup; an interactive page opened that way starts flat even if the
    /// lookup then comes back empty.
    #[must_use]
    pub fn initial_view(&self, focused_link: bool, event: Option<&FocusedEvent>) -> InitialView {
        match event {
            Some(event) if !self.interactive => {
                let camera = calculate_camera_options(event.depth_km(), STATIC_MAX_ZOOM, self.size);
                InitialView {
                    center: [event.lng, event.lat],
                    zoom: camera.zoom,
                    min_zoom: MIN_ZOOM,
                    pitch: FOCUS_PITCH,
                    padding: camera.padding,
                    interactive: false,
                }
            }
            _ => InitialView {
                center: BROWSE_CENTER,
                zoom: BROWSE_ZOOM,
                min_zoom: MIN_ZOOM,
                pitch: if self.interactive && focused_link { 0.0 } else { FOCUS_PITCH },
                padding: Padding::ZERO,
                interactive: self.interactive,
            },
        }
    }

    /// The map has loaded: show the initial event, or start browsing.
    pub fn start(&mut self, initial: Option<EventParams>, projector: &dyn Projector) -> Vec<Command> {
        let focusable = initial.as_ref().is_some_and(EventParams::is_locatable);
        if !focusable {
            self.hover_enabled = true;
            return vec![Command::SetHover(true)];
        }

        let mut commands = self.select(initial, projector);
        if !self.interactive {
            commands.push(Command::RenderComplete);
        }
        commands
    }

    /// Show an event, or return to browsing with `None`.
    pub fn select(&mut self, params: Option<EventParams>, projector: &dyn Projector) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.interactive {
            self.marker.hide();
            commands.push(Command::HidePanel);
        }

        let Some(event) = params.and_then(EventParams::focus) else {
            debug!("browsing");
            self.mode = Mode::Browsing;
            self.hover_enabled = true;
            commands.push(Command::Camera {
                target: CameraMove {
                    padding: Some(Padding::ZERO),
                    ..CameraMove::default()
                },
                transition: Transition::Ease {
                    duration_ms: RESET_MS,
                },
            });
            commands.push(Command::SetHover(true));
            return commands;
        };

        debug!(lng = event.lng, lat = event.lat, "focusing event");
        if self.interactive {
            self.hover_enabled = false;
            commands.push(Command::SetHover(false));
            commands.push(Command::Camera {
                target: CameraMove {
                    center: Some([event.lng, event.lat]),
                    zoom: Some(FLY_ZOOM),
                    pitch: Some(0.0),
                    padding: Some(Padding::ZERO),
                },
                transition: Transition::Fly {
                    curve: FLY_CURVE,
                    speed: FLY_SPEED,
                },
            });
            self.mode = Mode::Flying(event);
        } else {
            self.mode = Mode::Flying(event);
            commands.extend(self.final_view());
            if let Some(event) = self.current_event().cloned() {
                self.marker.show_event(&event, projector);
            }
            self.marker.tick(STATIC_WAVE_TIME_MS);
        }
        commands
    }

    /// A recent-list row was clicked.
    pub fn pick_recent(&mut self, params: EventParams, projector: &dyn Projector) -> Vec<Command> {
        let Some(id) = params.id.clone() else {
            return self.select(Some(params), projector);
        };
        let already_shown = self
            .current_event()
            .is_some_and(|e| e.params.id.as_deref() == Some(id.as_str()));
        if already_shown {
            return Vec::new();
        }

        let mut commands = vec![
            Command::HighlightItem(Some(id.clone())),
            Command::PushHistory(id_query(&id)),
        ];
        commands.extend(self.select(Some(params), projector));
        commands
    }

    /// The panel's close button.
    pub fn close(&mut self, projector: &dyn Projector) -> Vec<Command> {
        let mut commands = vec![Command::HighlightItem(None)];
        commands.extend(self.select(None, projector));
        commands
    }

    /// A camera move finished.
    pub fn on_move_end(&mut self) -> Vec<Command> {
        if matches!(self.mode, Mode::Flying(_)) {
            self.final_view()
        } else {
            Vec::new()
        }
    }

    /// The camera moved; keep the marker attached to the map.
    pub fn on_move(&mut self, projector: &dyn Projector) {
        match &self.mode {
            Mode::Browsing => self.marker.hide(),
            Mode::Focused(event) => self.marker.show_event(event, projector),
            Mode::Flying(_) => {}
        }
    }

    /// The map element changed size.
    pub fn on_resize(&mut self, size: ViewportSize, projector: &dyn Projector) -> Vec<Command> {
        self.size = size;
        let device_changed = size.device() != self.device;
        self.device = size.device();

        let mut commands = Vec::new();
        if self.interactive {
            match &self.mode {
                Mode::Browsing => self.marker.hide(),
                Mode::Focused(event) if device_changed => {
                    let camera = calculate_camera_options(event.depth_km(), RESIZE_MAX_ZOOM, size);
                    commands.push(Command::Camera {
                        target: camera.into(),
                        transition: Transition::Ease {
                            duration_ms: RESIZE_MS,
                        },
                    });
                }
                _ => {}
            }
        } else if let Mode::Focused(event) = &self.mode {
            if device_changed {
                let camera = calculate_camera_options(event.depth_km(), STATIC_MAX_ZOOM, size);
                commands.push(Command::Camera {
                    target: camera.into(),
                    transition: Transition::Jump,
                });
            }
            self.marker.show_event(event, projector);
        }
        commands
    }

    /// The pointer moved over the dataset layer.
    ///
    /// Returns whether the hover was handled; it is ignored unless browsing.
    pub fn on_hover(&mut self, info: Option<&HoverInfo>, projector: &dyn Projector) -> bool {
        if !self.hover_enabled {
            return false;
        }
        match info {
            Some(info) => self.marker.show_hover(info, projector),
            None => self.marker.hide(),
        }
        true
    }

    /// Animation frame at `now_ms` on the host's monotonic clock.
    pub fn on_frame(&mut self, now_ms: f64) {
        if self.interactive {
            self.marker.tick(now_ms);
        }
    }

    fn final_view(&mut self) -> Vec<Command> {
        let Mode::Flying(event) = &self.mode else {
            return Vec::new();
        };
        let event = event.clone();

        let mut commands = vec![Command::ShowPanel(EventPanel::new(&event.params, self.time_mode()))];

        if self.interactive {
            let camera = calculate_camera_options(event.depth_km(), FINAL_VIEW_MAX_ZOOM, self.size);
            commands.push(Command::Camera {
                target: CameraMove {
                    pitch: Some(FOCUS_PITCH),
                    ..CameraMove::from(camera)
                },
                transition: Transition::Ease {
                    duration_ms: FINAL_VIEW_MS,
                },
            });
        }

        self.mode = Mode::Focused(event);
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{MarkerState, ScreenPoint, wave_rings};
    use crate::viewport::MercatorViewport;

    const DESKTOP: ViewportSize = ViewportSize::new(1280.0, 800.0);
    const MOBILE: ViewportSize = ViewportSize::new(400.0, 800.0);

    fn tohoku() -> EventParams {
        EventParams {
            id: Some("us7000j1aa".into()),
            lng: Some(142.37),
            lat: Some(38.32),
            depth: Some(29.0),
            time: Some("2011-03-11T05:46:24Z".into()),
            location: Some("off the east coast of Honshu, Japan".into()),
            magnitude: Some(9.1),
            mmi: Some(9.0),
            sig: Some(2184.0),
        }
    }

    fn viewport() -> MercatorViewport {
        MercatorViewport::new(DESKTOP, 142.37, 38.32, 6.0).with_pitch(60.0)
    }

    fn camera_of(commands: &[Command]) -> Option<(CameraMove, Transition)> {
        commands.iter().find_map(|c| match c {
            Command::Camera { target, transition } => Some((*target, *transition)),
            _ => None,
        })
    }

    #[test]
    fn test_start_without_event_browses() {
        let mut session = Session::new(true, DESKTOP);
        let commands = session.start(None, &viewport());
        assert_eq!(commands, vec![Command::SetHover(true)]);
        assert_eq!(session.mode(), &Mode::Browsing);
        assert!(session.hover_enabled());
    }

    #[test]
    fn test_interactive_flight_then_final_view() {
        let vp = viewport();
        let mut session = Session::new(true, DESKTOP);
        let commands = session.start(Some(tohoku()), &vp);

        assert!(commands.contains(&Command::SetHover(false)));
        let (target, transition) = camera_of(&commands).expect("fly command");
        assert_eq!(target.center, Some([142.37, 38.32]));
        assert_eq!(target.zoom, Some(FLY_ZOOM));
        assert_eq!(transition, Transition::Fly { curve: 1.0, speed: 0.5 });
        assert!(matches!(session.mode(), Mode::Flying(_)));

        // moving mid-flight does not draw the marker
        session.on_move(&vp);
        assert!(!session.marker().is_visible());

        let commands = session.on_move_end();
        assert!(matches!(session.mode(), Mode::Focused(_)));
        let Some(Command::ShowPanel(panel)) = commands.first() else {
            panic!("expected panel first: {commands:?}");
        };
        assert_eq!(panel.magnitude, "9.1");
        assert_eq!(panel.intensity, "IX");

        let (target, transition) = camera_of(&commands).expect("ease command");
        let expected = calculate_camera_options(29.0, 7.0, DESKTOP);
        assert_eq!(target.pitch, Some(FOCUS_PITCH));
        assert_eq!(target.zoom, Some(expected.zoom));
        assert_eq!(target.padding, Some(expected.padding));
        assert_eq!(transition, Transition::Ease { duration_ms: 2000 });

        session.on_move(&vp);
        assert!(session.marker().is_visible());

        // a second move-end is stale
        assert!(session.on_move_end().is_empty());
    }

    #[test]
    fn test_static_render_is_immediate() {
        let vp = viewport();
        let mut session = Session::new(false, DESKTOP);
        let commands = session.start(Some(tohoku()), &vp);

        assert!(matches!(session.mode(), Mode::Focused(_)));
        assert_eq!(commands.last(), Some(&Command::RenderComplete));
        assert!(camera_of(&commands).is_none());

        let Some(Command::ShowPanel(panel)) = commands.first() else {
            panic!("expected panel: {commands:?}");
        };
        assert_eq!(panel.time.date, "2011-03-11");
        assert_eq!(panel.time.time, "05:46:24");
        assert_eq!(panel.time.timezone, "UTC");

        let MarkerState::Visible(frame) = session.marker().state() else {
            panic!("marker should be visible");
        };
        let center = ScreenPoint::new(640.0, 400.0);
        assert!((frame.epicenter.x - center.x).abs() < 1e-6);
        assert!(frame.hypocenter.y > frame.epicenter.y);
        assert_eq!(session.marker().waves(), wave_rings(750.0));

        // static pages don't animate
        session.on_frame(10_000.0);
        assert_eq!(session.marker().waves(), wave_rings(750.0));
    }

    #[test]
    fn test_static_initial_view_frames_event() {
        let session = Session::new(false, DESKTOP);
        let event = tohoku().focus().expect("locatable");
        let view = session.initial_view(true, Some(&event));
        let camera = calculate_camera_options(29.0, 6.0, DESKTOP);
        assert_eq!(view.center, [142.37, 38.32]);
        assert!((view.zoom - camera.zoom).abs() < f64::EPSILON);
        assert_eq!(view.padding, camera.padding);
        assert!((view.pitch - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_interactive_initial_view() {
        let session = Session::new(true, DESKTOP);
        let event = tohoku().focus().expect("locatable");
        assert!(session.initial_view(true, Some(&event)).pitch.abs() < f64::EPSILON);
        let browsing = session.initial_view(false, None);
        assert_eq!(browsing.center, BROWSE_CENTER);
        assert!((browsing.pitch - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_lookup_opens_flat() {
        let session = Session::new(true, DESKTOP);
        let view = session.initial_view(true, None);
        assert_eq!(view.center, BROWSE_CENTER);
        assert!(view.pitch.abs() < f64::EPSILON);
        assert!(view.interactive);
    }

    #[test]
    fn test_hover_only_while_browsing() {
        let vp = viewport();
        let mut session = Session::new(true, DESKTOP);
        session.start(None, &vp);

        let info = HoverInfo {
            position: [142.0, 38.0, -10_000.0],
            pointer: ScreenPoint::new(600.0, 380.0),
        };
        assert!(session.on_hover(Some(&info), &vp));
        assert!(session.marker().is_visible());
        assert!(session.on_hover(None, &vp));
        assert!(!session.marker().is_visible());

        session.select(Some(tohoku()), &vp);
        assert!(!session.on_hover(Some(&info), &vp));
        assert!(!session.marker().is_visible());
    }

    #[test]
    fn test_move_while_browsing_hides_marker() {
        let vp = viewport();
        let mut session = Session::new(true, DESKTOP);
        session.start(None, &vp);
        let info = HoverInfo {
            position: [142.0, 38.0, -10_000.0],
            pointer: ScreenPoint::new(600.0, 380.0),
        };
        session.on_hover(Some(&info), &vp);
        session.on_move(&vp);
        assert!(!session.marker().is_visible());
    }

    #[test]
    fn test_close_returns_to_browsing() {
        let vp = viewport();
        let mut session = Session::new(true, DESKTOP);
        session.start(Some(tohoku()), &vp);
        session.on_move_end();

        let commands = session.close(&vp);
        assert_eq!(commands.first(), Some(&Command::HighlightItem(None)));
        assert!(commands.contains(&Command::HidePanel));
        assert!(commands.contains(&Command::SetHover(true)));
        let (target, transition) = camera_of(&commands).expect("reset camera");
        assert_eq!(target.padding, Some(Padding::ZERO));
        assert_eq!(transition, Transition::Ease { duration_ms: 1000 });
        assert_eq!(session.mode(), &Mode::Browsing);
    }

    #[test]
    fn test_resize_across_breakpoint_reframes() {
        let vp = viewport();
        let mut session = Session::new(true, DESKTOP);
        session.start(Some(tohoku()), &vp);
        session.on_move_end();

        assert!(session.on_resize(ViewportSize::new(1200.0, 700.0), &vp).is_empty());

        let commands = session.on_resize(MOBILE, &vp);
        let (target, transition) = camera_of(&commands).expect("reframe");
        let expected = calculate_camera_options(29.0, 8.0, MOBILE);
        assert_eq!(target.zoom, Some(expected.zoom));
        assert_eq!(target.padding, Some(expected.padding));
        assert_eq!(transition, Transition::Ease { duration_ms: 1000 });

        assert!(session.on_resize(ViewportSize::new(380.0, 820.0), &vp).is_empty());
    }

    #[test]
    fn test_static_resize_jumps() {
        let vp = viewport();
        let mut session = Session::new(false, DESKTOP);
        session.start(Some(tohoku()), &vp);

        let commands = session.on_resize(MOBILE, &vp);
        let (target, transition) = camera_of(&commands).expect("jump");
        assert_eq!(transition, Transition::Jump);
        assert_eq!(target.zoom, Some(calculate_camera_options(29.0, 6.0, MOBILE).zoom));
        assert!(session.marker().is_visible());
    }

    #[test]
    fn test_pick_recent_pushes_history() {
        let vp = viewport();
        let mut session = Session::new(true, DESKTOP);
        session.start(None, &vp);

        let commands = session.pick_recent(tohoku(), &vp);
        assert_eq!(commands[0], Command::HighlightItem(Some("us7000j1aa".into())));
        assert_eq!(commands[1], Command::PushHistory("?id=us7000j1aa".into()));
        assert!(matches!(session.mode(), Mode::Flying(_)));

        // picking the same row again does nothing
        assert!(session.pick_recent(tohoku(), &vp).is_empty());
    }

    #[test]
    fn test_select_unlocatable_browses() {
        let vp = viewport();
        let mut session = Session::new(true, DESKTOP);
        let partial = EventParams {
            lng: Some(1.0),
            ..EventParams::default()
        };
        session.select(Some(partial), &vp);
        assert_eq!(session.mode(), &Mode::Browsing);
        assert!(session.hover_enabled());
    }

    #[test]
    fn test_frame_drives_waves() {
        let mut session = Session::new(true, DESKTOP);
        session.on_frame(1500.0);
        assert_eq!(session.marker().waves(), wave_rings(1500.0));
    }
}
