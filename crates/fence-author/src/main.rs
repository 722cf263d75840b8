//! Geo-fence Authoring CLI
//!
//! Replays a recorded authoring session and writes the resulting fences.
//!
//! Usage:
//!   fence-author --session sessions/delhi.json \
//!                --output data/delhi_fences.json \
//!                --geojson --svg

use anyhow::{Context, Result};
use clap::Parser;
use fence_author::{load_session, replay_session, AuthorConfig};
use geofence_core::render;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "fence-author",
    about = "Replay a geo-fence authoring session and export the fence registry"
)]
struct Args {
    /// Path to the session JSON file
    #[arg(short, long)]
    session: PathBuf,

    /// Output report JSON file
    #[arg(short, long, default_value = "fence-report.json")]
    output: PathBuf,

    /// Also write fences as GeoJSON next to the report
    #[arg(long)]
    geojson: bool,

    /// Also write an SVG rendering next to the report
    #[arg(long)]
    svg: bool,

    /// Reference latitude at the surface centre (overrides GEOFENCE_REF_LAT)
    #[arg(long)]
    ref_lat: Option<f64>,

    /// Reference longitude at the surface centre (overrides GEOFENCE_REF_LON)
    #[arg(long)]
    ref_lon: Option<f64>,

    /// Degrees per pixel (overrides GEOFENCE_SCALE)
    #[arg(long)]
    scale: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "fence_author=debug,geofence_core=debug"
    } else {
        "fence_author=info,geofence_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("{}", "=".repeat(60));
    info!("Geo-fence Authoring Session");
    info!("{}", "=".repeat(60));

    let config = AuthorConfig::from_env().with_overrides(args.ref_lat, args.ref_lon, args.scale);
    info!(
        "Reference ({:.6}, {:.6}), scale {} deg/px",
        config.ref_lat, config.ref_lon, config.scale
    );

    let session = load_session(&args.session)
        .with_context(|| format!("failed to load session {:?}", args.session))?;
    let (replayer, report) = replay_session(&session, &config)?;

    info!("Writing report to {:?}", args.output);
    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {:?}", args.output))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)?;

    if args.geojson {
        let geojson_path = args.output.with_extension("geojson");
        info!("Writing GeoJSON to {:?}", geojson_path);
        let collection = render::to_geojson(replayer.registry().list());
        let file = File::create(&geojson_path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &collection)?;
    }

    if args.svg {
        let svg_path = args.output.with_extension("svg");
        info!("Writing SVG to {:?}", svg_path);
        fs::write(&svg_path, replayer.svg()?)?;
    }

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!(
        "Fences: {} ({} active, {} visible)",
        report.stats.total, report.stats.active, report.stats.visible
    );
    for (category, count) in &report.stats.by_category {
        info!("  {}: {}", category, count);
    }
    info!(
        "Actions applied: {}, rejected: {}",
        report.actions_applied,
        report.rejected.len()
    );
    for r in &report.rejected {
        info!("  #{} {}: {}", r.index, r.action, r.reason);
    }

    Ok(())
}
