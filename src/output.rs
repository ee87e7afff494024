//! Output formatters for located events, recent lists and camera framings.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use serde::Serialize;

use crate::camera::CameraOptions;
use crate::host::Snapshot;
use crate::marker::MarkerState;
use crate::panel::RecentItem;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Significance tier colors
const RED: &str = "\x1b[91m"; // tier 2: sig >= 600
const YELLOW: &str = "\x1b[93m"; // tier 1: sig >= 400
const WHITE: &str = "\x1b[97m";

const ICON_QUAKE: &str = "🌍";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

fn significance_color(tier: u8) -> &'static str {
    match tier {
        2 => RED,
        1 => YELLOW,
        _ => WHITE,
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> io::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write a located event.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_snapshot<W: Write>(writer: &mut W, snapshot: &Snapshot, format: Format) -> io::Result<()> {
    match format {
        Format::Human => write_snapshot_human(writer, snapshot),
        Format::Json => writeln!(writer, "{}", to_json(snapshot, true)?),
        Format::Ndjson => writeln!(writer, "{}", to_json(snapshot, false)?),
    }
}

fn write_snapshot_human<W: Write>(writer: &mut W, snapshot: &Snapshot) -> io::Result<()> {
    let Some(panel) = &snapshot.panel else {
        return writeln!(writer, "{DIM}No event to locate (browsing){RESET}");
    };

    let color = significance_color(panel.significance);
    writeln!(
        writer,
        "{ICON_QUAKE} {color}{BOLD}M{}{RESET} │ {} │ depth {} │ MMI {}",
        panel.magnitude, panel.location, panel.depth, panel.intensity
    )?;
    writeln!(
        writer,
        "   {} {} {DIM}({}){RESET}",
        panel.time.date, panel.time.time, panel.time.timezone
    )?;

    if let Some(camera) = &snapshot.camera {
        write_camera_line(writer, camera)?;
    }
    writeln!(
        writer,
        "   {DIM}view{RESET}    center {:.3},{:.3} zoom {:.2} pitch {:.0}°",
        snapshot.center[0], snapshot.center[1], snapshot.zoom, snapshot.pitch
    )?;

    if let MarkerState::Visible(frame) = &snapshot.marker {
        writeln!(
            writer,
            "   {DIM}marker{RESET}  hypocenter ({:.1}, {:.1}) epicenter ({:.1}, {:.1}) fill {}",
            frame.hypocenter.x,
            frame.hypocenter.y,
            frame.epicenter.x,
            frame.epicenter.y,
            frame.color.to_hex()
        )?;
    }
    Ok(())
}

fn write_camera_line<W: Write>(writer: &mut W, camera: &CameraOptions) -> io::Result<()> {
    let p = camera.padding;
    writeln!(
        writer,
        "   {DIM}camera{RESET}  zoom {:.2} padding top {:.0} bottom {:.0} left {:.0} right {:.0}",
        camera.zoom, p.top, p.bottom, p.left, p.right
    )
}

/// Write a camera framing.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_camera<W: Write>(writer: &mut W, camera: &CameraOptions, format: Format) -> io::Result<()> {
    match format {
        Format::Human => write_camera_line(writer, camera),
        Format::Json => writeln!(writer, "{}", to_json(camera, true)?),
        Format::Ndjson => writeln!(writer, "{}", to_json(camera, false)?),
    }
}

/// Write recent-list rows.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_recent<W: Write>(writer: &mut W, items: &[RecentItem], format: Format) -> io::Result<()> {
    match format {
        Format::Human => {
            for item in items {
                let marker = if item.active { "▶" } else { " " };
                let color = significance_color(item.significance);
                writeln!(
                    writer,
                    "{marker} {} {} {DIM}({}){RESET} │ {color}{}{RESET} {DIM}{}{RESET}",
                    item.time.date, item.time.time, item.time.timezone, item.label, item.query
                )?;
            }
            Ok(())
        }
        Format::Json => writeln!(writer, "{}", to_json(items, true)?),
        Format::Ndjson => {
            for item in items {
                writeln!(writer, "{}", to_json(item, false)?)?;
            }
            Ok(())
        }
    }
}
