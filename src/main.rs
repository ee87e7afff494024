//! eqlocator - locate earthquakes on a pitched map.
//!
//! Resolves shared event links against the USGS feeds, frames the camera
//! for the hypocenter depth, and serves the session over a small HTTP API.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

mod bootstrap;
mod camera;
mod cli;
mod client;
mod errors;
mod host;
mod marker;
mod models;
mod output;
mod palette;
mod panel;
mod params;
mod server;
mod session;
mod timefmt;
mod viewport;

use camera::ViewportSize;
use cli::{Cli, Command};
use client::UsgsClient;
use params::QueryParams;
use timefmt::TimeMode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Locate(args) => cmd_locate(args),
        Command::Recent(args) => cmd_recent(args),
        Command::Camera(args) => cmd_camera(args),
        Command::Ui(args) => cmd_ui(args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn make_client(base_url: Option<&str>) -> Result<UsgsClient> {
    let client = match base_url {
        Some(url) => UsgsClient::with_base_url(url),
        None => UsgsClient::new(),
    };
    client.context("failed to create USGS client")
}

/// Execute the `locate` command - resolve a link and settle the camera.
fn cmd_locate(args: cli::LocateArgs) -> Result<()> {
    let client = make_client(args.base_url.as_deref())?;
    let query = QueryParams::parse(&args.query);
    let size = ViewportSize::new(args.width, args.height);

    let event = tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(bootstrap::resolve_event(&client, &query));

    if query.is_focused() && !event.is_locatable() {
        info!("nothing to locate for {}, opening in browsing mode", args.query);
    }

    let snapshot = host::render(&query, event, size);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_snapshot(&mut handle, &snapshot, args.format)?;
    Ok(())
}

/// Execute the `recent` command - one-shot fetch of the recent list.
fn cmd_recent(args: cli::RecentArgs) -> Result<()> {
    let client = make_client(None)?;

    let feed = client
        .fetch_feed(args.feed)
        .context("failed to fetch earthquake feed")?;
    debug!("{} ({} events)", feed.metadata.title, feed.metadata.count);

    let mode = if args.utc { TimeMode::Utc } else { TimeMode::Local };
    let mut items = panel::recent_items(&feed, args.active.as_deref(), mode);
    items.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_recent(&mut handle, &items, args.format)?;
    Ok(())
}

/// Execute the `camera` command.
fn cmd_camera(args: cli::CameraArgs) -> Result<()> {
    if !args.max_zoom.is_finite() || args.max_zoom < 0.0 {
        anyhow::bail!("max zoom must be a non-negative number, got {}", args.max_zoom);
    }
    let size = ViewportSize::new(args.width, args.height);
    let options = camera::calculate_camera_options(args.depth, args.max_zoom, size);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_camera(&mut handle, &options, args.format)?;
    Ok(())
}

/// Execute the `ui` command - start web server.
fn cmd_ui(args: cli::UiArgs) -> Result<()> {
    let client = make_client(None)?;
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        feed_type: args.feed,
        hypocenters: args.hypocenters.clone(),
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 eqlocator\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Feed:    {}", args.feed.as_str());
    println!("  Data:    {}", args.hypocenters.display());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config, client.clone()))
}
