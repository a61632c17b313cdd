use serde::Serialize;
use tracing::trace;

use crate::arena::Arena;
use crate::components::{
    Building, BuildingId, BuildingKind, City, Player, PlayerId, Unit, UnitId,
};
use crate::spatial::{opposite, Road, Tile, TileGrid, TileId};

/// Why a placement, move, or production request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TileOccupied,
    BuildingPresent,
    Unbuildable,
    AlreadyPlaced,
    ProductionActive,
    NotACity,
    NotOnTile,
    NotAdjacent,
    UnknownTile,
    UnknownUnit,
    UnknownBuilding,
    UnknownPlayer,
}

/// Result of a request that may be turned down as a matter of routine.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Done(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_done()
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Done(_) => None,
            Outcome::Rejected(reason) => Some(*reason),
        }
    }
}

macro_rules! reject_unless {
    ($cond:expr, $reason:expr) => {
        if !$cond {
            return Outcome::Rejected($reason);
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Completion {
    Engineer {
        city: BuildingId,
        unit: Option<UnitId>,
    },
    Currency {
        city: BuildingId,
        player: PlayerId,
        amount: i64,
    },
}

/// Events collected while a tick runs; drained by the engine afterwards.
#[derive(Debug, Default, Clone)]
pub struct TickJournal {
    pub produced: Vec<BuildingId>,
    pub completed: Vec<Completion>,
    pub destroyed_units: Vec<UnitId>,
    pub destroyed_buildings: Vec<BuildingId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerLedger {
    pub player: PlayerId,
    pub name: String,
    pub currency: i64,
    pub upkeep_cost: i64,
    pub score: i64,
    pub units: usize,
    pub buildings: usize,
}

pub struct World {
    grid: TileGrid,
    pub(crate) players: Vec<Player>,
    pub(crate) units: Arena<Unit>,
    pub(crate) buildings: Arena<Building>,
    cities: Vec<BuildingId>,
    pub(crate) journal: TickJournal,
}

impl World {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            players: Vec::new(),
            units: Arena::new(),
            buildings: Arena::new(),
            cities: Vec::new(),
            journal: TickJournal::default(),
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.grid.tile(id)
    }

    pub fn register_player(&mut self, name: impl Into<String>, currency: i64) -> PlayerId {
        let id = PlayerId(self.players.len() as u32);
        self.players.push(Player::new(name.into(), currency));
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.players.len() as u32).map(PlayerId)
    }

    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &Player)> {
        self.players
            .iter()
            .enumerate()
            .map(|(index, player)| (PlayerId(index as u32), player))
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0)
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id.0)
    }

    pub fn city(&self, id: BuildingId) -> Option<&City> {
        self.building(id).and_then(Building::as_city)
    }

    /// Every live city, in founding order.
    pub fn cities(&self) -> &[BuildingId] {
        &self.cities
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn ledger(&self) -> Vec<PlayerLedger> {
        self.players()
            .map(|(id, player)| PlayerLedger {
                player: id,
                name: player.name.clone(),
                currency: player.currency,
                upkeep_cost: player.upkeep_cost,
                score: player.score,
                units: player.units.len(),
                buildings: player.buildings.len(),
            })
            .collect()
    }

    pub fn take_journal(&mut self) -> TickJournal {
        std::mem::take(&mut self.journal)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        let count = self.players.len();
        self.players
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("player {} is not registered ({count} known)", id.0))
    }

    pub fn add_unit(&mut self, tile: TileId, unit: UnitId) -> Outcome {
        reject_unless!(self.grid.tile(tile).is_some(), Rejection::UnknownTile);
        let Some(placed) = self.units.get(unit.0).map(|u| u.tile) else {
            return Outcome::Rejected(Rejection::UnknownUnit);
        };
        reject_unless!(placed.is_none(), Rejection::AlreadyPlaced);
        reject_unless!(!self.grid.tile_at(tile).has_unit(), Rejection::TileOccupied);

        self.grid.tile_at_mut(tile).unit = Some(unit);
        if let Some(unit) = self.units.get_mut(unit.0) {
            unit.tile = Some(tile);
        }
        Outcome::Done(())
    }

    pub fn remove_unit(&mut self, tile: TileId) -> Option<UnitId> {
        let unit = self.grid.tile_mut(tile)?.unit.take()?;
        if let Some(unit) = self.units.get_mut(unit.0) {
            unit.tile = None;
        }
        Some(unit)
    }

    /// Lifts the unit off its tile and drops it on `target`.
    ///
    /// An occupied target still costs the unit its old tile: it ends up
    /// unplaced. Use [`World::request_move`] for a checked move.
    pub fn move_unit(&mut self, unit: UnitId, target: TileId) -> Outcome {
        reject_unless!(self.grid.tile(target).is_some(), Rejection::UnknownTile);
        let Some(current) = self.units.get(unit.0).map(|u| u.tile) else {
            return Outcome::Rejected(Rejection::UnknownUnit);
        };
        if let Some(old) = current {
            self.remove_unit(old);
        }
        self.add_unit(target, unit)
    }

    pub fn create_engineer(&mut self, owner: PlayerId) -> UnitId {
        assert!(
            self.player(owner).is_some(),
            "player {} is not registered",
            owner.0
        );
        let engineer = Unit::engineer(owner);
        let cost = engineer.upkeep_cost();
        let id = UnitId(self.units.insert(engineer));
        let player = self.player_mut(owner);
        player.units.push(id);
        player.upkeep_cost += cost;
        id
    }

    pub fn destroy_unit(&mut self, id: UnitId) -> bool {
        let Some(unit) = self.units.remove(id.0) else {
            return false;
        };
        if let Some(tile) = unit.tile {
            let tile = self.grid.tile_at_mut(tile);
            if tile.unit == Some(id) {
                tile.unit = None;
            }
        }
        let player = self.player_mut(unit.owner);
        player.forget_unit(id);
        player.upkeep_cost -= unit.upkeep_cost();
        true
    }

    /// Constructs a building for `owner` and binds it to `tile`.
    pub fn add_building(
        &mut self,
        owner: PlayerId,
        tile: TileId,
        kind: BuildingKind,
    ) -> Outcome<BuildingId> {
        reject_unless!(self.player(owner).is_some(), Rejection::UnknownPlayer);
        let Some(target) = self.grid.tile(tile) else {
            return Outcome::Rejected(Rejection::UnknownTile);
        };
        reject_unless!(!target.has_building(), Rejection::BuildingPresent);
        reject_unless!(target.biome.is_buildable(), Rejection::Unbuildable);

        let cost = kind.upkeep_cost();
        let is_city = matches!(kind, BuildingKind::City(_));
        let is_hub = matches!(kind, BuildingKind::RoadHub);
        let id = BuildingId(self.buildings.insert(Building::new(owner, tile, kind)));

        let player = self.player_mut(owner);
        player.buildings.push(id);
        player.upkeep_cost += cost;
        if is_city {
            player.cities.push(id);
            self.cities.push(id);
        }

        let slot = self.grid.tile_at_mut(tile);
        slot.road.get_or_insert_with(Road::default);
        slot.building = Some(id);
        if is_hub {
            self.link_spokes(tile, owner);
        }
        Outcome::Done(id)
    }

    fn link_spokes(&mut self, tile: TileId, owner: PlayerId) {
        let neighbors: Vec<_> = self.grid.tile_at(tile).neighbors().collect();
        for (direction, neighbor) in neighbors {
            let same_owner = self
                .grid
                .tile_at(neighbor)
                .building
                .and_then(|id| self.buildings.get(id.0))
                .is_some_and(|building| building.owner == owner);
            if !same_owner {
                continue;
            }
            if let Some(road) = self.grid.tile_at_mut(tile).road.as_mut() {
                road.connect(direction);
            }
            if let Some(road) = self.grid.tile_at_mut(neighbor).road.as_mut() {
                road.connect(opposite(direction));
            }
        }
    }

    /// Unbinds the tile's building and discards its road. The building itself
    /// stays registered with its owner until destroyed.
    pub fn remove_building(&mut self, tile: TileId) -> Option<BuildingId> {
        let slot = self.grid.tile_mut(tile)?;
        let building = slot.building.take()?;
        slot.road = None;
        let neighbors: Vec<_> = slot.neighbors().collect();
        for (direction, neighbor) in neighbors {
            if let Some(road) = self.grid.tile_at_mut(neighbor).road.as_mut() {
                road.disconnect(opposite(direction));
            }
        }
        Some(building)
    }

    pub fn destroy_building(&mut self, id: BuildingId) -> bool {
        let Some(building) = self.buildings.get(id.0) else {
            return false;
        };
        let tile = building.tile();
        if self.grid.tile_at(tile).building == Some(id) {
            self.remove_building(tile);
        }
        let Some(building) = self.buildings.remove(id.0) else {
            return false;
        };
        self.cities.retain(|city| *city != id);
        let player = self.player_mut(building.owner);
        player.forget_building(id);
        player.upkeep_cost -= building.upkeep_cost();
        true
    }

    pub fn request_found_city(
        &mut self,
        player: PlayerId,
        tile: TileId,
        productivity: u32,
    ) -> Outcome<BuildingId> {
        let outcome = self.add_building(player, tile, BuildingKind::City(City::new(productivity)));
        if let Some(reason) = outcome.rejection() {
            trace!(player = player.0, tile = tile.0, ?reason, "city not founded");
        }
        outcome
    }

    /// Builds a road hub on the tile the engineer stands on.
    pub fn request_build_road_hub(&mut self, engineer: UnitId, tile: TileId) -> Outcome<BuildingId> {
        let Some(unit) = self.units.get(engineer.0) else {
            return Outcome::Rejected(Rejection::UnknownUnit);
        };
        reject_unless!(unit.tile == Some(tile), Rejection::NotOnTile);
        let owner = unit.owner;
        let outcome = self.add_building(owner, tile, BuildingKind::RoadHub);
        if let Some(reason) = outcome.rejection() {
            trace!(tile = tile.0, ?reason, "road hub not built");
        }
        outcome
    }

    /// Single-hop move that never strands the unit.
    pub fn request_move(&mut self, unit: UnitId, target: TileId) -> Outcome {
        let Some(current) = self.units.get(unit.0).map(|u| u.tile) else {
            return Outcome::Rejected(Rejection::UnknownUnit);
        };
        let Some(destination) = self.grid.tile(target) else {
            return Outcome::Rejected(Rejection::UnknownTile);
        };
        reject_unless!(!destination.has_unit(), Rejection::TileOccupied);
        if let Some(from) = current {
            let adjacent = self
                .grid
                .tile_at(from)
                .neighbors()
                .any(|(_, neighbor)| neighbor == target);
            reject_unless!(adjacent, Rejection::NotAdjacent);
        }
        self.move_unit(unit, target)
    }
}
