//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::client::FeedType;
use crate::output::Format;

/// Locate earthquakes on a pitched map, from the terminal or a browser.
#[derive(Parser, Debug)]
#[command(name = "eqlocator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a shared link and show where the camera lands
    Locate(LocateArgs),

    /// List recent earthquakes as the side panel would
    Recent(RecentArgs),

    /// Compute the camera framing for a hypocenter depth
    Camera(CameraArgs),

    /// Start the HTTP API server
    Ui(UiArgs),
}

/// Arguments for the `locate` command.
#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// Query string of a shared link, e.g. "?id=us7000j1aa" or "lng=142&lat=38&d=29&t=1299822384000"
    pub query: String,

    /// Viewport width in CSS pixels
    #[arg(long, default_value = "1280")]
    pub width: f64,

    /// Viewport height in CSS pixels
    #[arg(long, default_value = "800")]
    pub height: f64,

    /// Override the USGS base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `recent` command.
#[derive(Parser, Debug)]
pub struct RecentArgs {
    /// Feed type to fetch
    #[arg(long, default_value = "4.5_month", value_parser = parse_feed_type)]
    pub feed: FeedType,

    /// Maximum number of events to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Event id to mark as active
    #[arg(long)]
    pub active: Option<String>,

    /// Show times in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `camera` command.
#[derive(Parser, Debug)]
pub struct CameraArgs {
    /// Hypocenter depth in km
    #[arg(long)]
    pub depth: f64,

    /// Zoom used for the deepest framing
    #[arg(long, default_value = "7")]
    pub max_zoom: f64,

    /// Viewport width in CSS pixels
    #[arg(long, default_value = "1280")]
    pub width: f64,

    /// Viewport height in CSS pixels
    #[arg(long, default_value = "800")]
    pub height: f64,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Feed type for the recent list
    #[arg(long, default_value = "4.5_month", value_parser = parse_feed_type)]
    pub feed: FeedType,

    /// Hypocenter dataset to serve
    #[arg(long, default_value = "data/hypocenters.json")]
    pub hypocenters: PathBuf,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse a feed type from string.
fn parse_feed_type(s: &str) -> Result<FeedType, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_defaults() {
        let cli = Cli::try_parse_from(["eqlocator", "locate", "?id=abc123"]).expect("parse");
        let Command::Locate(args) = cli.command else {
            panic!("expected locate");
        };
        assert_eq!(args.query, "?id=abc123");
        assert!((args.width - 1280.0).abs() < f64::EPSILON);
        assert_eq!(args.format, Format::Human);
    }

    #[test]
    fn test_recent_feed_parse() {
        let cli = Cli::try_parse_from(["eqlocator", "recent", "--feed", "all_day", "-n", "5", "--utc"])
            .expect("parse");
        let Command::Recent(args) = cli.command else {
            panic!("expected recent");
        };
        assert_eq!(args.feed, FeedType::AllDay);
        assert_eq!(args.limit, 5);
        assert!(args.utc);
    }

    #[test]
    fn test_camera_requires_depth() {
        assert!(Cli::try_parse_from(["eqlocator", "camera"]).is_err());
        assert!(Cli::try_parse_from(["eqlocator", "camera", "--depth", "10", "--verbose"]).is_ok());
    }
}
