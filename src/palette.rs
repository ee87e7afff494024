//! Depth color scale.
//!
//! Elevations from 0 m down to -500 km map onto the 11-step diverging
//! "Spectral" scheme, smoothed with a uniform cubic B-spline the way
//! d3's `interpolateSpectral` does.

use std::fmt;

use serde::{Serialize, Serializer};

/// Deepest elevation on the scale, in meters.
pub const DEPTH_DOMAIN_M: f64 = -500_000.0;

const SPECTRAL: [[f64; 3]; 11] = [
    [158.0, 1.0, 66.0],
    [213.0, 62.0, 79.0],
    [244.0, 109.0, 67.0],
    [253.0, 174.0, 97.0],
    [254.0, 224.0, 139.0],
    [255.0, 255.0, 191.0],
    [230.0, 245.0, 152.0],
    [171.0, 221.0, 164.0],
    [102.0, 194.0, 165.0],
    [50.0, 136.0, 189.0],
    [94.0, 79.0, 162.0],
];

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Color for an elevation in meters (surface 0, downward negative).
#[must_use]
pub fn depth_color(elevation_m: f64) -> Rgb {
    interpolate_spectral(elevation_m / DEPTH_DOMAIN_M)
}

/// Sample the spectral ramp at `t`, clamped to `[0, 1]`.
#[must_use]
pub fn interpolate_spectral(t: f64) -> Rgb {
    let n = SPECTRAL.len() - 1;
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let i = if t >= 1.0 { n - 1 } else { (t * n as f64).floor() as usize };

    let v1 = SPECTRAL[i];
    let v2 = SPECTRAL[i + 1];
    let v0 = if i > 0 { SPECTRAL[i - 1] } else { extrapolate(v1, v2) };
    let v3 = if i < n - 1 { SPECTRAL[i + 2] } else { extrapolate(v2, v1) };

    #[allow(clippy::cast_precision_loss)]
    let local = (t - i as f64 / n as f64) * n as f64;
    let channel = |c: usize| to_byte(basis(local, v0[c], v1[c], v2[c], v3[c]));

    Rgb {
        r: channel(0),
        g: channel(1),
        b: channel(2),
    }
}

fn extrapolate(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [2.0 * a[0] - b[0], 2.0 * a[1] - b[1], 2.0 * a[2] - b[2]]
}

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
