use serde::{Deserialize, Serialize};

use crate::arena::Handle;
use crate::spatial::TileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub(crate) u32);

impl PlayerId {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub(crate) Handle);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub(crate) Handle);

pub const ENGINEER_UPKEEP: i64 = 10;
pub const CITY_UPKEEP: i64 = 0;
pub const ROAD_HUB_UPKEEP: i64 = 1;

pub const ENGINEER_WORK: u32 = 10;
pub const CURRENCY_WORK: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Engineer,
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub kind: UnitKind,
    pub(crate) owner: PlayerId,
    pub(crate) tile: Option<TileId>,
    upkeep_cost: i64,
}

impl Unit {
    pub(crate) fn engineer(owner: PlayerId) -> Self {
        Self {
            kind: UnitKind::Engineer,
            owner,
            tile: None,
            upkeep_cost: ENGINEER_UPKEEP,
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn tile(&self) -> Option<TileId> {
        self.tile
    }

    pub fn upkeep_cost(&self) -> i64 {
        self.upkeep_cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProductionKind {
    Engineer,
    Currency { amount: i64 },
}

impl ProductionKind {
    pub fn work_total(self) -> u32 {
        match self {
            ProductionKind::Engineer => ENGINEER_WORK,
            ProductionKind::Currency { .. } => CURRENCY_WORK,
        }
    }
}

/// A production job bound to one city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Production {
    pub kind: ProductionKind,
    work_done: u32,
}

impl Production {
    pub fn new(kind: ProductionKind) -> Self {
        Self { kind, work_done: 0 }
    }

    pub fn work_done(&self) -> u32 {
        self.work_done
    }

    pub fn work_total(&self) -> u32 {
        self.kind.work_total()
    }

    /// Adds work; returns `true` once the job is finished.
    pub(crate) fn advance(&mut self, productivity: u32) -> bool {
        self.work_done = self.work_done.saturating_add(productivity);
        self.work_done >= self.work_total()
    }
}

#[derive(Debug, Clone)]
pub struct City {
    pub productivity: u32,
    pub(crate) production: Option<Production>,
}

impl City {
    pub fn new(productivity: u32) -> Self {
        Self {
            productivity,
            production: None,
        }
    }

    pub fn production(&self) -> Option<&Production> {
        self.production.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.production.is_none()
    }
}

#[derive(Debug, Clone)]
pub enum BuildingKind {
    City(City),
    RoadHub,
}

impl BuildingKind {
    pub fn upkeep_cost(&self) -> i64 {
        match self {
            BuildingKind::City(_) => CITY_UPKEEP,
            BuildingKind::RoadHub => ROAD_HUB_UPKEEP,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildingKind::City(_) => "city",
            BuildingKind::RoadHub => "road_hub",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Building {
    pub(crate) owner: PlayerId,
    tile: TileId,
    pub(crate) kind: BuildingKind,
}

impl Building {
    pub(crate) fn new(owner: PlayerId, tile: TileId, kind: BuildingKind) -> Self {
        Self { owner, tile, kind }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }

    pub fn kind(&self) -> &BuildingKind {
        &self.kind
    }

    pub fn upkeep_cost(&self) -> i64 {
        self.kind.upkeep_cost()
    }

    pub fn as_city(&self) -> Option<&City> {
        match &self.kind {
            BuildingKind::City(city) => Some(city),
            BuildingKind::RoadHub => None,
        }
    }

    pub(crate) fn as_city_mut(&mut self) -> Option<&mut City> {
        match &mut self.kind {
            BuildingKind::City(city) => Some(city),
            BuildingKind::RoadHub => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    pub(crate) units: Vec<UnitId>,
    pub(crate) buildings: Vec<BuildingId>,
    pub(crate) cities: Vec<BuildingId>,
    pub(crate) currency: i64,
    pub(crate) upkeep_cost: i64,
    pub(crate) score: i64,
    /// Currency as of the last score update.
    pub(crate) score_mark: i64,
}

impl Player {
    pub(crate) fn new(name: String, currency: i64) -> Self {
        Self {
            name,
            units: Vec::new(),
            buildings: Vec::new(),
            cities: Vec::new(),
            currency,
            upkeep_cost: 0,
            score: 0,
            score_mark: currency,
        }
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn buildings(&self) -> &[BuildingId] {
        &self.buildings
    }

    pub fn cities(&self) -> &[BuildingId] {
        &self.cities
    }

    pub fn currency(&self) -> i64 {
        self.currency
    }

    pub fn upkeep_cost(&self) -> i64 {
        self.upkeep_cost
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub(crate) fn forget_unit(&mut self, unit: UnitId) {
        if let Some(index) = self.units.iter().position(|id| *id == unit) {
            self.units.remove(index);
        }
    }

    pub(crate) fn forget_building(&mut self, building: BuildingId) {
        if let Some(index) = self.buildings.iter().position(|id| *id == building) {
            self.buildings.remove(index);
        }
        if let Some(index) = self.cities.iter().position(|id| *id == building) {
            self.cities.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_completes_at_work_total() {
        let mut job = Production::new(ProductionKind::Engineer);
        assert!(!job.advance(5));
        assert_eq!(job.work_done(), 5);
        assert!(job.advance(5));
        assert_eq!(job.work_done(), 10);
    }

    #[test]
    fn test_currency_job_is_shorter() {
        let kind = ProductionKind::Currency { amount: 3 };
        assert_eq!(kind.work_total(), 5);
        assert!(Production::new(kind).advance(5));
    }

    #[test]
    fn test_building_upkeep() {
        assert_eq!(BuildingKind::City(City::new(5)).upkeep_cost(), 0);
        assert_eq!(BuildingKind::RoadHub.upkeep_cost(), 1);
    }
}
