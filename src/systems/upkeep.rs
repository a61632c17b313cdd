use anyhow::Result;
use tracing::{debug, info};

use crate::{
    engine::{System, SystemContext, TickKind},
    rng::SystemRng,
    world::World,
};

pub struct UpkeepSystem;

impl UpkeepSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UpkeepSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for UpkeepSystem {
    fn name(&self) -> &str {
        "upkeep"
    }

    fn runs_on(&self, kind: TickKind) -> bool {
        kind == TickKind::Upkeep
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let players: Vec<_> = world.player_ids().collect();
        for player in players {
            let outcome = world.upkeep(player);
            debug!(
                tick = ctx.tick,
                player = player.raw(),
                paid = outcome.paid,
                "upkeep charged"
            );
            if !outcome.destroyed_units.is_empty() || !outcome.destroyed_buildings.is_empty() {
                info!(
                    player = player.raw(),
                    units = outcome.destroyed_units.len(),
                    buildings = outcome.destroyed_buildings.len(),
                    "upkeep unpaid, entities destroyed"
                );
            }
            world.journal.destroyed_units.extend(outcome.destroyed_units);
            world
                .journal
                .destroyed_buildings
                .extend(outcome.destroyed_buildings);
        }
        Ok(())
    }
}
