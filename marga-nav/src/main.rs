//! MargaNav - navigate a simulated scene from the command line
//!
//! Loads a YAML scene (open flat ground when none is given), spawns the
//! planner, maze, executor and recovery tasks, and drives the character to
//! the goal with the retry and recovery policy from the TOML config.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use marga::{Pose, SimWorld, WorldPoint};
use marga_nav::{NavConfig, Navigator, Result, SharedWorld, TracingSink};

const DEFAULT_CONFIG: &str = "configs/marga-nav.toml";

/// Plan and execute a path through a simulated scene
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Runtime configuration (TOML); falls back to configs/marga-nav.toml, then defaults
    #[arg(long, value_parser)]
    config: Option<PathBuf>,

    /// Scene file (YAML)
    #[arg(long, value_parser)]
    scene: Option<PathBuf>,

    /// Start position as x,y,z
    #[arg(long, value_parser = parse_point, default_value = "0,0,0")]
    start: WorldPoint,

    /// Goal position as x,y,z
    #[arg(long, value_parser = parse_point)]
    goal: WorldPoint,
}

fn parse_point(s: &str) -> std::result::Result<WorldPoint, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("{:?}: {}", v, e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values[..] {
        [x, y, z] => Ok(WorldPoint::new(x, y, z)),
        [x, y] => Ok(WorldPoint::new(x, y, 0.0)),
        _ => Err(format!("expected x,y,z, got {:?}", s)),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("marga_nav=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            NavConfig::load(path)?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG);
            NavConfig::load(Path::new(DEFAULT_CONFIG))?
        }
        None => {
            info!("Using default configuration");
            NavConfig::default()
        }
    };

    let world = match &args.scene {
        Some(path) => {
            info!("Loading scene from {:?}", path);
            SimWorld::load(path)?
        }
        None => SimWorld::flat(0.0),
    };
    let world = Arc::new(world);

    info!("MargaNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Capsule {:.2}m x {:.2}m, {} retries, {} recoveries",
        config.planning.capsule.width,
        config.planning.capsule.height,
        config.navigator.max_retries,
        config.navigator.max_recoveries
    );

    let start = Pose::facing(args.start, args.goal);
    let shared: SharedWorld = Arc::clone(&world) as SharedWorld;
    let mut navigator = Navigator::start(config, shared, start, TracingSink);

    let report = navigator.navigate(args.goal)?;
    let p = report.pose.position;
    if report.status.is_ok() {
        info!(
            "Reached ({:.2}, {:.2}, {:.2}) after {} attempts",
            p.x, p.y, p.z, report.attempts
        );
    } else {
        warn!(
            "Navigation ended with {} (code {}) at ({:.2}, {:.2}, {:.2}) after {} attempts, {} recoveries",
            report.status,
            report.status.code(),
            p.x,
            p.y,
            p.z,
            report.attempts,
            report.recoveries
        );
    }
    info!(
        "{} ray casts, {} static path queries",
        world.ray_count(),
        world.static_query_count()
    );

    navigator.shutdown();
    info!("MargaNav finished");
    Ok(())
}
