//! Pitched Web Mercator viewport.
//!
//! Reproduces the camera model map renderers use for tilted views: a
//! perspective camera 1.5 screen heights above the map center, tilted by
//! pitch. Altitudes are scaled with the meters-per-pixel of the
//! center latitude, so hypocenters sink below the surface when pitched.

use std::f64::consts::PI;

use glam::{DMat4, DVec3, DVec4};

use crate::camera::{Padding, ViewportSize};
use crate::marker::{Projector, ScreenPoint};
use crate::session::CameraMove;

/// World size in pixels at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Earth circumference used for the altitude scale, in meters.
pub const EARTH_CIRCUMFERENCE_M: f64 = 40.03e6;

/// Camera height above the center, in screen heights.
pub const CAMERA_ALTITUDE: f64 = 1.5;

const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
const NEAR: f64 = 0.1;
const FAR: f64 = 1000.0;

/// Web Mercator world coordinates at zoom 0 (y grows northward).
#[must_use]
pub fn lng_lat_to_world(lng: f64, lat: f64) -> (f64, f64) {
    let lambda = lng.to_radians();
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = TILE_SIZE * (lambda + PI) / (2.0 * PI);
    let y = TILE_SIZE * (PI + (PI / 4.0 + phi / 2.0).tan().ln()) / (2.0 * PI);
    (x, y)
}

/// A map camera: center, zoom, pitch and padding.
#[derive(Debug, Clone, PartialEq)]
pub struct MercatorViewport {
    pub size: ViewportSize,
    pub lng: f64,
    pub lat: f64,
    pub zoom: f64,
    /// Degrees from straight down
    pub pitch: f64,
    pub padding: Padding,
}

impl MercatorViewport {
    #[must_use]
    pub fn new(size: ViewportSize, lng: f64, lat: f64, zoom: f64) -> Self {
        Self {
            size,
            lng,
            lat,
            zoom,
            pitch: 0.0,
            padding: Padding::ZERO,
        }
    }

    #[must_use]
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// Land a camera move immediately, leaving unset fields alone.
    pub fn jump_to(&mut self, target: &CameraMove) {
        if let Some([lng, lat]) = target.center {
            self.lng = lng;
            self.lat = lat;
        }
        if let Some(zoom) = target.zoom {
            self.zoom = zoom;
        }
        if let Some(pitch) = target.pitch {
            self.pitch = pitch;
        }
        if let Some(padding) = target.padding {
            self.padding = padding;
        }
    }

    fn units_per_meter(&self) -> f64 {
        let lat_cos = self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().cos();
        TILE_SIZE / EARTH_CIRCUMFERENCE_M / lat_cos
    }

    fn view_projection(&self) -> DMat4 {
        let height = self.size.height.max(1.0);
        let aspect = self.size.width.max(1.0) / height;
        let fov_y = 2.0 * (0.5 / CAMERA_ALTITUDE).atan();
        let projection = DMat4::perspective_rh_gl(fov_y, aspect, NEAR, FAR);

        let (cx, cy) = lng_lat_to_world(self.lng, self.lat);
        let scale = 2f64.powf(self.zoom) / height;
        let view = DMat4::from_translation(DVec3::new(0.0, 0.0, -CAMERA_ALTITUDE))
            * DMat4::from_rotation_x(-self.pitch.to_radians())
            * DMat4::from_scale(DVec3::splat(scale))
            * DMat4::from_translation(DVec3::new(-cx, -cy, 0.0));

        projection * view
    }
}

impl Projector for MercatorViewport {
    fn project(&self, lng: f64, lat: f64, altitude_m: f64) -> ScreenPoint {
        let (x, y) = lng_lat_to_world(lng, lat);
        let z = altitude_m * self.units_per_meter();
        let clip = self.view_projection() * DVec4::new(x, y, z, 1.0);
        let w = if clip.w.abs() < f64::EPSILON { f64::EPSILON } else { clip.w };

        let Padding {
            top,
            bottom,
            left,
            right,
        } = self.padding;
        ScreenPoint::new(
            (clip.x / w + 1.0) * self.size.width / 2.0 + (left - right) / 2.0,
            (1.0 - clip.y / w) * self.size.height / 2.0 + (top - bottom) / 2.0,
        )
    }

    fn pitch(&self) -> f64 {
        self.pitch
    }

    fn center_lng(&self) -> f64 {
        self.lng
    }
}
