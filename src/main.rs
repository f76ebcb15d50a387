// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mixpilot::catalog::{FileTrackSource, TrackCatalog};
use mixpilot::config::AppConfig;
use mixpilot::midi::{DeviceTransport, SimulatedTransport};
use mixpilot::navigation::plan_from;
use mixpilot::session::{OverrideFileFeed, SessionOrchestrator};
use mixpilot::timing::step_equivalents;

/// Autonomous DJ console driver
#[derive(Parser, Debug)]
#[command(name = "mixpilot")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `debug` or `mixpilot=trace` (overrides RUST_LOG)
    #[arg(long, global = true, env = "MIXPILOT_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an autonomous session
    Run {
        /// Configuration file (YAML, or TOML by extension)
        #[arg(short, long)]
        config: PathBuf,
        /// Track catalog export (YAML or JSON)
        #[arg(long)]
        catalog: PathBuf,
        /// Record signals instead of driving a device
        #[arg(long)]
        simulate: bool,
        /// Overrides file watched for venue/event/stop changes
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
    /// Print the navigation path between two browse positions
    Plan {
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration and, optionally, a catalog
    Check {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List MIDI output ports
    Ports,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "mixpilot=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load(path).with_context(|| format!("Failed to load config {:?}", path))
}

fn open_transport(config: &AppConfig, simulate: bool) -> Result<Arc<dyn DeviceTransport>> {
    if simulate || config.midi.simulate {
        let transport = match config.midi.fault_seed {
            Some(seed) => SimulatedTransport::with_faults(seed, config.midi.drop_rate),
            None => SimulatedTransport::new(),
        };
        info!("Simulated device: signals are recorded, not sent");
        return Ok(Arc::new(transport));
    }
    connect_device(config)
}

#[cfg(feature = "midir")]
fn connect_device(config: &AppConfig) -> Result<Arc<dyn DeviceTransport>> {
    use mixpilot::midi::MidirTransport;

    let transport = match &config.midi.port {
        Some(name) => MidirTransport::new_by_name(name)?,
        None => MidirTransport::new(0)?,
    };
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "midir"))]
fn connect_device(_config: &AppConfig) -> Result<Arc<dyn DeviceTransport>> {
    anyhow::bail!("Built without MIDI output; rebuild with `--features midir` or pass --simulate")
}

async fn run_session(
    config: &Path,
    catalog: &Path,
    simulate: bool,
    overrides: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let transport = open_transport(&config, simulate)?;
    let source = FileTrackSource::new(catalog);

    let mut orchestrator = SessionOrchestrator::from_config(&config, &source, transport)
        .context("Failed to prepare session")?;
    if let Some(path) = overrides {
        let feed = OverrideFileFeed::new(path, None)
            .with_context(|| format!("Failed to watch overrides {:?}", path))?;
        orchestrator = orchestrator.with_feed(Box::new(feed));
    }

    let stop = orchestrator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, stopping after the current cycle");
            stop.stop();
        }
    });

    let summary = orchestrator.run().await;
    println!(
        "Session ended ({}): {} tracks played, {} failed cycles, {:.0}s",
        summary.end_reason,
        summary.tracks_played,
        summary.failed_cycles,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

fn print_plan(from: usize, to: usize, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    let timing = config.timing.navigation();
    let overhead = step_equivalents(timing.reset_settle, timing.step_delay);
    let path = plan_from(from, to, overhead);
    println!("{}", path);
    println!(
        "reset overhead {} step-equivalents; estimated {:.2}s",
        overhead,
        timing.step_delay.as_secs_f64() * path.cost as f64
    );
    Ok(())
}

fn check(config: &Path, catalog: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    println!("Config OK");
    println!(
        "  decks: {}",
        config
            .controls
            .decks
            .keys()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  session: {:?} / {:?}, {} min, transition every {}s",
        config.session.venue,
        config.session.event,
        config.session.target_minutes,
        config.session.cycle_secs
    );

    if let Some(path) = catalog {
        let catalog = TrackCatalog::load(&FileTrackSource::new(path))
            .with_context(|| format!("Failed to load catalog {:?}", path))?;
        println!("Catalog OK: {}", catalog.stats());
    }
    Ok(())
}

#[cfg(feature = "midir")]
fn list_ports() -> Result<()> {
    mixpilot::midi::print_output_ports()
}

#[cfg(not(feature = "midir"))]
fn list_ports() -> Result<()> {
    anyhow::bail!("Built without MIDI output; rebuild with `--features midir`")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Command::Run {
            config,
            catalog,
            simulate,
            overrides,
        } => run_session(&config, &catalog, simulate, overrides.as_deref()).await,
        Command::Plan { from, to, config } => print_plan(from, to, config.as_deref()),
        Command::Check { config, catalog } => check(&config, catalog.as_deref()),
        Command::Ports => list_ports(),
    }
}
