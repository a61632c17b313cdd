use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexfront::{
    engine::{EngineBuilder, TickReport},
    scenario::ScenarioLoader,
    scheduler::run_realtime,
    systems::install_defaults,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Hex-world faction simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/twin_rivers.yaml")]
    scenario: PathBuf,

    /// Override the number of production ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Override snapshot interval in production ticks (0 disables)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long, default_value = "snapshots")]
    snapshot_dir: PathBuf,

    /// Pace ticks by the scenario cadence instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Log filter used when neither RUST_LOG nor the scenario sets one
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn log_report(report: &TickReport) {
    for entry in &report.ledger {
        tracing::debug!(
            kind = ?report.kind,
            tick = report.tick,
            player = %entry.name,
            currency = entry.currency,
            upkeep = entry.upkeep_cost,
            score = entry.score,
            units = entry.units,
            buildings = entry.buildings,
            "ledger"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader
        .load(&cli.scenario)
        .with_context(|| format!("loading {}", cli.scenario.display()))?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| scenario.logging.level.clone());
    init_tracing(&level);

    if let Some(interval) = cli.snapshot_interval {
        scenario.snapshot_interval_ticks = interval;
    }
    let ticks = scenario.production_ticks(cli.ticks);
    let built = scenario.build_world()?;
    let mut world = built.world;

    let builder = EngineBuilder::new(scenario.engine_settings(&cli.snapshot_dir));
    let mut engine = install_defaults(builder, scenario.score).build();

    if cli.realtime {
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        run_realtime(
            &mut engine,
            &mut world,
            scenario.cadence,
            Some(ticks),
            shutdown,
            log_report,
        )
        .await?;
    } else {
        engine.run_with_hook(&mut world, ticks, log_report)?;
    }

    info!(
        scenario = %scenario.name,
        production_ticks = engine.production_ticks(),
        upkeep_ticks = engine.upkeep_ticks(),
        "simulation finished"
    );
    for entry in world.ledger() {
        println!(
            "{:<12} currency {:>6}  score {:>6}  units {:>3}  buildings {:>3}",
            entry.name, entry.currency, entry.score, entry.units, entry.buildings
        );
    }
    Ok(())
}
