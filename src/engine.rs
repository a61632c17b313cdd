use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    components::{BuildingId, UnitId},
    rng::{RngManager, SystemRng},
    scheduler::TickClock,
    snapshot::SnapshotWriter,
    world::{Completion, PlayerLedger, World},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickKind {
    Production,
    Upkeep,
}

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub upkeep_every: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            clock: TickClock::new(self.settings.upkeep_every),
            settings: self.settings,
        }
    }
}

/// What observers learn after each tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub kind: TickKind,
    /// Ordinal among ticks of the same kind, starting at 1.
    pub tick: u64,
    pub produced: Vec<BuildingId>,
    pub completed: Vec<Completion>,
    pub destroyed_units: Vec<UnitId>,
    pub destroyed_buildings: Vec<BuildingId>,
    pub ledger: Vec<PlayerLedger>,
    pub snapshot_path: Option<PathBuf>,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    clock: TickClock,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, production_ticks: u64) -> Result<()> {
        self.run_with_hook(world, production_ticks, |_| {})
    }

    /// Runs `production_ticks` more production ticks, interleaving the upkeep
    /// ticks that fall due along the way.
    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        production_ticks: u64,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(&TickReport),
    {
        let target = self.clock.production_ticks() + production_ticks;
        info!(
            scenario = %self.settings.scenario_name,
            production_ticks,
            upkeep_every = self.settings.upkeep_every,
            "starting run"
        );
        loop {
            let kind = self.next_due();
            if kind == TickKind::Production && self.clock.production_ticks() >= target {
                break;
            }
            let report = self.dispatch(kind, world)?;
            hook(&report);
        }
        info!(
            scenario = %self.settings.scenario_name,
            production_ticks = self.clock.production_ticks(),
            upkeep_ticks = self.clock.upkeep_ticks(),
            "run finished"
        );
        Ok(())
    }

    /// Runs one tick of `kind` to completion. Every mutation of the world
    /// during a simulation goes through here.
    pub fn dispatch(&mut self, kind: TickKind, world: &mut World) -> Result<TickReport> {
        let tick = self.clock.record(kind);
        world.take_journal();
        for system in self.systems.iter_mut().filter(|system| system.runs_on(kind)) {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                kind,
                tick,
                scenario_name: &self.settings.scenario_name,
            };
            system
                .run(&ctx, world, &mut rng_stream)
                .with_context(|| format!("system '{}' failed on {kind:?} tick {tick}", system.name()))?;
        }

        let snapshot_path = if kind == TickKind::Production {
            self.snapshot_writer
                .maybe_write(world, &self.settings.scenario_name, tick)?
        } else {
            None
        };
        let journal = world.take_journal();
        debug!(
            ?kind,
            tick,
            produced = journal.produced.len(),
            completed = journal.completed.len(),
            destroyed = journal.destroyed_units.len() + journal.destroyed_buildings.len(),
            "tick complete"
        );
        Ok(TickReport {
            kind,
            tick,
            produced: journal.produced,
            completed: journal.completed,
            destroyed_units: journal.destroyed_units,
            destroyed_buildings: journal.destroyed_buildings,
            ledger: world.ledger(),
            snapshot_path,
        })
    }

    /// Kind of the next tick in the fixed interleaving.
    pub fn next_due(&self) -> TickKind {
        self.clock.next_due()
    }

    pub fn production_ticks(&self) -> u64 {
        self.clock.production_ticks()
    }

    pub fn upkeep_ticks(&self) -> u64 {
        self.clock.upkeep_ticks()
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }
}

pub struct SystemContext<'a> {
    pub kind: TickKind,
    pub tick: u64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn runs_on(&self, kind: TickKind) -> bool;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
