use anyhow::Result;
use rand::seq::SliceRandom;
use tracing::trace;

use crate::{
    components::{PlayerId, ProductionKind, UnitKind},
    engine::{System, SystemContext, TickKind},
    rng::SystemRng,
    spatial::TileId,
    world::World,
};

/// Faction policy, re-evaluated from scratch every production tick.
///
/// Cities fall back to minting currency while the faction can't cover its
/// upkeep and otherwise train engineers. Engineers pave the tile they stand
/// on, or wander to a random free neighbor when it is already built.
pub struct AgentSystem;

impl AgentSystem {
    pub fn new() -> Self {
        Self
    }

    fn plan_cities(&self, world: &mut World, player: PlayerId) {
        let Some(cities) = world.player(player).map(|p| p.cities().to_vec()) else {
            return;
        };
        for city in cities {
            let (currency, upkeep) = match world.player(player) {
                Some(p) => (p.currency(), p.upkeep_cost()),
                None => return,
            };
            if !world.city(city).is_some_and(|c| c.is_idle()) {
                continue;
            }
            let job = if currency < upkeep {
                ProductionKind::Currency { amount: 1 }
            } else {
                ProductionKind::Engineer
            };
            let _ = world.start_production(city, job);
        }
    }

    fn drive_engineers(&self, world: &mut World, player: PlayerId, rng: &mut SystemRng<'_>) {
        let Some(units) = world.player(player).map(|p| p.units().to_vec()) else {
            return;
        };
        for unit in units {
            let Some(tile) = world
                .unit(unit)
                .filter(|u| u.kind == UnitKind::Engineer)
                .and_then(|u| u.tile())
            else {
                continue;
            };
            let Some(here) = world.tile(tile) else {
                continue;
            };
            if !here.has_building() && here.biome.is_buildable() {
                let _ = world.request_build_road_hub(unit, tile);
                continue;
            }
            let free: Vec<TileId> = here
                .neighbors()
                .map(|(_, neighbor)| neighbor)
                .filter(|neighbor| world.tile(*neighbor).is_some_and(|t| !t.has_unit()))
                .collect();
            if let Some(&target) = free.choose(rng) {
                trace!(?unit, from = tile.raw(), to = target.raw(), "engineer wanders");
                let _ = world.request_move(unit, target);
            }
        }
    }
}

impl Default for AgentSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AgentSystem {
    fn name(&self) -> &str {
        "agent"
    }

    fn runs_on(&self, kind: TickKind) -> bool {
        kind == TickKind::Production
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let players: Vec<_> = world.player_ids().collect();
        for player in players {
            self.plan_cities(world, player);
            self.drive_engineers(world, player, rng);
        }
        Ok(())
    }
}
