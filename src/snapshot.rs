use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::components::{ProductionKind, UnitKind};
use crate::spatial::Biome;
use crate::world::World;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub rows: u32,
    pub columns: u32,
    pub tiles: Vec<TileSnapshot>,
    pub players: Vec<PlayerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub id: u32,
    pub biome: Biome,
    pub elevation: f64,
    pub water: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unit: Option<UnitKind>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub building: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub road_spokes: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub name: String,
    pub currency: i64,
    pub upkeep_cost: i64,
    pub score: i64,
    pub units: usize,
    pub buildings: usize,
    pub cities: Vec<CitySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub tile: u32,
    pub productivity: u32,
    pub production: Option<ProductionKind>,
    pub work_done: u32,
}

impl World {
    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let tiles = self
            .grid()
            .tiles()
            .map(|(id, tile)| TileSnapshot {
                id: id.raw(),
                biome: tile.biome,
                elevation: tile.elevation,
                water: tile.water(),
                unit: tile.unit().and_then(|u| self.unit(u)).map(|u| u.kind),
                building: tile
                    .building()
                    .and_then(|b| self.building(b))
                    .map(|b| b.kind().label().to_string()),
                road_spokes: tile.road().map(|road| road.spokes()),
            })
            .collect();
        let players = self
            .players()
            .map(|(id, player)| PlayerSnapshot {
                id: id.raw(),
                name: player.name.clone(),
                currency: player.currency(),
                upkeep_cost: player.upkeep_cost(),
                score: player.score(),
                units: player.units().len(),
                buildings: player.buildings().len(),
                cities: player
                    .cities()
                    .iter()
                    .filter_map(|city| {
                        let building = self.building(*city)?;
                        let state = building.as_city()?;
                        Some(CitySnapshot {
                            tile: building.tile().raw(),
                            productivity: state.productivity,
                            production: state.production().map(|job| job.kind),
                            work_done: state.production().map_or(0, |job| job.work_done()),
                        })
                    })
                    .collect(),
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            rows: self.grid().rows(),
            columns: self.grid().columns(),
            tiles,
            players,
        }
    }
}

/// Writes `<dir>/<scenario>/tick_NNNNNN.json` every `interval` production ticks.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn maybe_write(
        &self,
        world: &World,
        scenario: &str,
        tick: u64,
    ) -> Result<Option<PathBuf>, SnapshotError> {
        if self.interval == 0 || tick % self.interval != 0 {
            return Ok(None);
        }

        let dir = self.output_dir.join(scenario);
        fs::create_dir_all(&dir).map_err(|source| SnapshotError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(format!("tick_{tick:06}.json"));
        let json = serde_json::to_string_pretty(&world.snapshot(scenario))?;
        fs::write(&path, json).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), tick, "snapshot written");
        Ok(Some(path))
    }
}
