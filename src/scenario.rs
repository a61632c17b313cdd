use std::{
    fs,
    path::{Path, PathBuf},
};

use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    components::PlayerId,
    engine::EngineSettings,
    rng::{RngManager, PLACEMENT_STREAM, WORLDGEN_STREAM},
    scheduler::Cadence,
    spatial::TileId,
    systems::ScoreRule,
    world::World,
    worldgen::{MapGenerator, RainfallSummary, DEFAULT_NOISE_SIZE, MAX_RAINFALL_ROUNDS},
};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid scenario: {0}")]
    Invalid(String),
    #[error("cannot place city for player '{player}': {reason}")]
    Placement { player: String, reason: String },
}

fn default_noise_size() -> usize {
    DEFAULT_NOISE_SIZE
}

fn default_max_rainfall_rounds() -> u32 {
    MAX_RAINFALL_ROUNDS
}

fn default_snapshot_interval_ticks() -> u64 {
    0
}

fn default_productivity() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    pub map: MapConfig,
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub production_ticks: Option<u64>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub score: ScoreRule,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub players: Vec<ScenarioPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub rows: u32,
    pub columns: u32,
    #[serde(default = "default_noise_size")]
    pub noise_size: usize,
    #[serde(default = "default_max_rainfall_rounds")]
    pub max_rainfall_rounds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPlayer {
    pub name: String,
    #[serde(default)]
    pub currency: i64,
    #[serde(default)]
    pub cities: Vec<ScenarioCity>,
}

/// A starting city. Without a position it lands on a random free buildable tile.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCity {
    pub row: Option<u32>,
    pub column: Option<u32>,
    #[serde(default = "default_productivity")]
    pub productivity: u32,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario, ScenarioError> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path).map_err(|source| ScenarioError::Io {
            path: path.clone(),
            source,
        })?;
        let scenario: Scenario =
            serde_yaml::from_str(&data).map_err(|source| ScenarioError::Parse {
                path: path.clone(),
                source,
            })?;
        scenario.validate()?;
        debug!(path = %path.display(), name = %scenario.name, "loaded scenario");
        Ok(scenario)
    }
}

/// A world built from a scenario, with the players in declaration order.
pub struct ScenarioWorld {
    pub world: World,
    pub players: Vec<PlayerId>,
    pub rainfall: RainfallSummary,
}

impl Scenario {
    pub fn from_yaml_str(data: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario =
            serde_yaml::from_str(data).map_err(|source| ScenarioError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.map.rows == 0 || self.map.columns == 0 {
            return Err(ScenarioError::Invalid(format!(
                "map must have at least one tile, got {}x{}",
                self.map.rows, self.map.columns
            )));
        }
        if !self.map.noise_size.is_power_of_two() {
            return Err(ScenarioError::Invalid(format!(
                "noise_size must be a power of two, got {}",
                self.map.noise_size
            )));
        }
        if self.cadence.upkeep_every == 0 {
            return Err(ScenarioError::Invalid(
                "cadence.upkeep_every must be at least 1".to_string(),
            ));
        }
        if self.cadence.production_period_ms == 0 {
            return Err(ScenarioError::Invalid(
                "cadence.production_period_ms must be positive".to_string(),
            ));
        }
        if self.cadence.upkeep_period().is_none() {
            return Err(ScenarioError::Invalid(format!(
                "cadence.upkeep_every {} is too large for a {} ms production period",
                self.cadence.upkeep_every, self.cadence.production_period_ms
            )));
        }
        for player in &self.players {
            if player.currency < 0 {
                return Err(ScenarioError::Invalid(format!(
                    "player '{}' starts with negative currency {}",
                    player.name, player.currency
                )));
            }
            for city in &player.cities {
                if city.row.is_some() != city.column.is_some() {
                    return Err(ScenarioError::Invalid(format!(
                        "city of player '{}' needs both row and column, or neither",
                        player.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Generates the map and founds every starting city.
    pub fn build_world(&self) -> Result<ScenarioWorld, ScenarioError> {
        let rng = RngManager::new(self.seed);
        let generated = MapGenerator::new(self.map.rows, self.map.columns)
            .with_noise_size(self.map.noise_size)
            .with_max_rounds(self.map.max_rainfall_rounds)
            .generate(&mut rng.fork(WORLDGEN_STREAM));
        let mut world = World::new(generated.grid);
        let mut placement = rng.fork(PLACEMENT_STREAM);

        let mut players = Vec::with_capacity(self.players.len());
        for entry in &self.players {
            let player = world.register_player(entry.name.clone(), entry.currency);
            players.push(player);
            for city in &entry.cities {
                let tile = match (city.row, city.column) {
                    (Some(row), Some(column)) => {
                        world.grid().id_at(row, column).ok_or_else(|| {
                            ScenarioError::Placement {
                                player: entry.name.clone(),
                                reason: format!("({row}, {column}) is off the map"),
                            }
                        })?
                    }
                    _ => {
                        let free: Vec<TileId> = world
                            .grid()
                            .tiles()
                            .filter(|(_, tile)| tile.biome.is_buildable() && !tile.has_building())
                            .map(|(id, _)| id)
                            .collect();
                        *free.choose(&mut placement).ok_or_else(|| ScenarioError::Placement {
                            player: entry.name.clone(),
                            reason: "no free buildable tile left".to_string(),
                        })?
                    }
                };
                if let Some(reason) = world
                    .request_found_city(player, tile, city.productivity)
                    .rejection()
                {
                    return Err(ScenarioError::Placement {
                        player: entry.name.clone(),
                        reason: format!("tile {} rejected: {reason:?}", tile.raw()),
                    });
                }
            }
        }
        info!(
            scenario = %self.name,
            players = players.len(),
            cities = world.cities().len(),
            rainfall_rounds = generated.rainfall.rounds,
            "world built"
        );
        Ok(ScenarioWorld {
            world,
            players,
            rainfall: generated.rainfall,
        })
    }

    pub fn production_ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.production_ticks).unwrap_or(100)
    }

    pub fn engine_settings(&self, snapshot_dir: impl Into<PathBuf>) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
            upkeep_every: self.cadence.upkeep_every,
            snapshot_interval_ticks: self.snapshot_interval_ticks,
            snapshot_dir: snapshot_dir.into(),
        }
    }
}
