//! City production jobs and the upkeep ledger.

use serde::Serialize;

use crate::components::{BuildingId, PlayerId, Production, ProductionKind, UnitId};
use crate::spatial::TileId;
use crate::world::{Completion, Outcome, Rejection, World};

/// What one production step did for a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityOutput {
    Idle,
    Working { work_done: u32, work_total: u32 },
    Completed(Completion),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpkeepOutcome {
    pub paid: i64,
    pub destroyed_units: Vec<UnitId>,
    pub destroyed_buildings: Vec<BuildingId>,
}

impl World {
    pub fn start_production(&mut self, city: BuildingId, kind: ProductionKind) -> Outcome {
        let Some(building) = self.buildings.get_mut(city.0) else {
            return Outcome::Rejected(Rejection::UnknownBuilding);
        };
        let Some(city) = building.as_city_mut() else {
            return Outcome::Rejected(Rejection::NotACity);
        };
        if city.production.is_some() {
            return Outcome::Rejected(Rejection::ProductionActive);
        }
        city.production = Some(Production::new(kind));
        Outcome::Done(())
    }

    pub fn produce_city(&mut self, id: BuildingId) -> CityOutput {
        let Some(building) = self.buildings.get_mut(id.0) else {
            return CityOutput::Idle;
        };
        let owner = building.owner;
        let Some(city) = building.as_city_mut() else {
            return CityOutput::Idle;
        };
        let productivity = city.productivity;
        let Some(job) = city.production.as_mut() else {
            return CityOutput::Idle;
        };
        if !job.advance(productivity) {
            return CityOutput::Working {
                work_done: job.work_done(),
                work_total: job.work_total(),
            };
        }
        let kind = job.kind;
        city.production = None;
        CityOutput::Completed(self.complete(id, owner, kind))
    }

    fn complete(&mut self, city: BuildingId, owner: PlayerId, kind: ProductionKind) -> Completion {
        match kind {
            ProductionKind::Engineer => Completion::Engineer {
                city,
                unit: self.spawn_engineer(city, owner),
            },
            ProductionKind::Currency { amount } => {
                self.player_mut(owner).currency += amount;
                Completion::Currency {
                    city,
                    player: owner,
                    amount,
                }
            }
        }
    }

    /// City tile if free, else the first free neighbor in direction order.
    pub fn spawn_tile(&self, city: BuildingId) -> Option<TileId> {
        let home = self.building(city)?.tile();
        let tile = self.tile(home)?;
        if !tile.has_unit() {
            return Some(home);
        }
        tile.neighbors()
            .map(|(_, neighbor)| neighbor)
            .find(|neighbor| self.tile(*neighbor).is_some_and(|t| !t.has_unit()))
    }

    fn spawn_engineer(&mut self, city: BuildingId, owner: PlayerId) -> Option<UnitId> {
        let tile = self.spawn_tile(city)?;
        let engineer = self.create_engineer(owner);
        let _ = self.move_unit(engineer, tile);
        Some(engineer)
    }

    /// Charges every unit, then every building, in roster order.
    ///
    /// Anything the player can't afford at its turn is destroyed, so an
    /// expensive entity early in the roster can starve cheaper ones after it.
    pub fn upkeep(&mut self, player: PlayerId) -> UpkeepOutcome {
        let mut outcome = UpkeepOutcome::default();
        let units = self.player_mut(player).units.clone();
        for unit in units {
            let Some(cost) = self.unit(unit).map(|u| u.upkeep_cost()) else {
                continue;
            };
            if cost > self.player_mut(player).currency {
                self.destroy_unit(unit);
                outcome.destroyed_units.push(unit);
            } else {
                self.player_mut(player).currency -= cost;
                outcome.paid += cost;
            }
        }
        let buildings = self.player_mut(player).buildings.clone();
        for building in buildings {
            let Some(cost) = self.building(building).map(|b| b.upkeep_cost()) else {
                continue;
            };
            if cost > self.player_mut(player).currency {
                self.destroy_building(building);
                outcome.destroyed_buildings.push(building);
            } else {
                self.player_mut(player).currency -= cost;
                outcome.paid += cost;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingKind, City};
    use crate::spatial::TileGrid;

    #[test]
    fn test_second_start_is_rejected() {
        let mut world = World::new(TileGrid::new(1, 1));
        let red = world.register_player("red", 0);
        let tile = world.grid().id_at(0, 0).unwrap();
        let city = world
            .add_building(red, tile, BuildingKind::City(City::new(1)))
            .done()
            .unwrap();

        assert!(world.start_production(city, ProductionKind::Engineer).is_done());
        let second = world.start_production(city, ProductionKind::Currency { amount: 1 });
        assert_eq!(second.rejection(), Some(Rejection::ProductionActive));
        assert_eq!(
            world.city(city).unwrap().production().unwrap().kind,
            ProductionKind::Engineer
        );
    }

    #[test]
    fn test_road_hub_cannot_produce() {
        let mut world = World::new(TileGrid::new(1, 1));
        let red = world.register_player("red", 0);
        let tile = world.grid().id_at(0, 0).unwrap();
        let hub = world
            .add_building(red, tile, BuildingKind::RoadHub)
            .done()
            .unwrap();

        let outcome = world.start_production(hub, ProductionKind::Engineer);
        assert_eq!(outcome.rejection(), Some(Rejection::NotACity));
        assert_eq!(world.produce_city(hub), CityOutput::Idle);
    }

    #[test]
    fn test_spawn_prefers_city_tile_then_neighbors() {
        let mut world = World::new(TileGrid::new(2, 2));
        let red = world.register_player("red", 0);
        let home = world.grid().id_at(0, 0).unwrap();
        let city = world
            .request_found_city(red, home, 10)
            .done()
            .unwrap();
        assert_eq!(world.spawn_tile(city), Some(home));

        let squatter = world.create_engineer(red);
        let _ = world.move_unit(squatter, home);
        let first_free = world.tile(home).unwrap().neighbors().next().map(|(_, id)| id);
        assert_eq!(world.spawn_tile(city), first_free);
    }
}
