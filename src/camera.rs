//! Camera framing for a hypocenter seen on a pitched map.
//!
//! Deeper events need a wider view to keep the hypocenter framed at a fixed
//! pitch, and bigger viewports allow a closer zoom. Bottom padding pushes
//! the surface point up so the leader line down to a deep hypocenter fits.

use serde::Serialize;

/// Viewports narrower than this use the mobile layout.
pub const MOBILE_BREAKPOINT_PX: f64 = 640.0;

/// Height of the bottom panel on mobile.
pub const MOBILE_PANEL_HEIGHT_PX: f64 = 196.0;

/// Width of the side panel on desktop.
pub const DESKTOP_PANEL_WIDTH_PX: f64 = 310.0;

/// Depths below this are framed as surface events.
pub const MIN_DEPTH_KM: f64 = 1e-3;

const ZOOM_BASE: f64 = 5.73;
const PADDING_ZOOM_BASE: f64 = 5.09;
const MAX_PADDING_RATIO: f64 = 0.4;

/// Size of the map element in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn device(&self) -> DeviceClass {
        if self.width < MOBILE_BREAKPOINT_PX {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// Height left for the map once the mobile bottom panel is reserved.
    #[must_use]
    pub fn effective_height(&self) -> f64 {
        let height = match self.device() {
            DeviceClass::Mobile => self.height - MOBILE_PANEL_HEIGHT_PX,
            DeviceClass::Desktop => self.height,
        };
        height.max(1.0)
    }
}

/// Layout class, chosen by viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

/// Map padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Padding {
    pub const ZERO: Self = Self {
        top: 0.0,
        bottom: 0.0,
        left: 0.0,
        right: 0.0,
    };
}

/// Zoom and padding for framing one hypocenter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraOptions {
    pub zoom: f64,
    pub padding: Padding,
}

/// Compute the camera framing for a hypocenter `depth_km` below the surface.
///
/// Zoom is clamped to `[0, max_zoom]`. Non-finite or non-positive depths
/// are framed as surface events: full zoom and no extra bottom padding.
#[must_use]
pub fn calculate_camera_options(depth_km: f64, max_zoom: f64, size: ViewportSize) -> CameraOptions {
    let height = size.effective_height();
    let max_zoom = max_zoom.max(0.0);

    let (zoom, bottom) = if depth_km.is_finite() && depth_km >= MIN_DEPTH_KM {
        let zoom = ZOOM_BASE - depth_km.log2() + height.log2();
        let ratio = (depth_km / height * (max_zoom - PADDING_ZOOM_BASE).powi(2)).min(1.0);
        (zoom.clamp(0.0, max_zoom), height * MAX_PADDING_RATIO * ratio)
    } else {
        (max_zoom, 0.0)
    };

    let padding = match size.device() {
        DeviceClass::Mobile => Padding {
            top: MOBILE_PANEL_HEIGHT_PX,
            bottom,
            left: 0.0,
            right: 0.0,
        },
        DeviceClass::Desktop => Padding {
            top: 0.0,
            bottom,
            left: DESKTOP_PANEL_WIDTH_PX,
            right: 0.0,
        },
    };

    CameraOptions { zoom, padding }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: ViewportSize = ViewportSize::new(1280.0, 800.0);
    const MOBILE: ViewportSize = ViewportSize::new(390.0, 844.0);

    #[test]
    fn test_zoom_formula() {
        let camera = calculate_camera_options(100.0, 20.0, DESKTOP);
        let expected = 5.73 - 100f64.log2() + 800f64.log2();
        assert!((camera.zoom - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_stays_in_range() {
        for depth in [0.01, 0.5, 1.0, 10.0, 35.0, 120.0, 300.0, 700.0, 5000.0] {
            for size in [DESKTOP, MOBILE, ViewportSize::new(200.0, 150.0)] {
                let camera = calculate_camera_options(depth, 7.0, size);
                assert!(camera.zoom >= 0.0 && camera.zoom <= 7.0, "depth {depth}: {camera:?}");
            }
        }
    }

    #[test]
    fn test_zero_depth_is_finite() {
        for depth in [0.0, -3.0, f64::NAN] {
            let camera = calculate_camera_options(depth, 6.0, DESKTOP);
            assert!(camera.zoom.is_finite());
            assert!((camera.zoom - 6.0).abs() < f64::EPSILON);
            assert!(camera.padding.bottom.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_padding_monotonic_and_saturates() {
        let mut last = 0.0;
        for depth in [1.0, 5.0, 10.0, 50.0, 100.0, 200.0, 400.0, 700.0] {
            let bottom = calculate_camera_options(depth, 7.0, DESKTOP).padding.bottom;
            assert!(bottom >= last);
            last = bottom;
        }
        assert!((last - 800.0 * 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_mobile_layout() {
        let camera = calculate_camera_options(10.0, 7.0, MOBILE);
        assert_eq!(MOBILE.device(), DeviceClass::Mobile);
        assert!((camera.padding.top - 196.0).abs() < f64::EPSILON);
        assert!(camera.padding.left.abs() < f64::EPSILON);

        let expected = 5.73 - 10f64.log2() + (844.0f64 - 196.0).log2();
        assert!((camera.zoom - expected.min(7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_desktop_layout() {
        let camera = calculate_camera_options(10.0, 7.0, DESKTOP);
        assert_eq!(DESKTOP.device(), DeviceClass::Desktop);
        assert!(camera.padding.top.abs() < f64::EPSILON);
        assert!((camera.padding.left - 310.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tiny_mobile_viewport_does_not_blow_up() {
        let camera = calculate_camera_options(10.0, 7.0, ViewportSize::new(300.0, 100.0));
        assert!(camera.zoom.is_finite());
        assert!(camera.padding.bottom.is_finite());
    }
}
