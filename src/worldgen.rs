//! Procedural map generation: biome draw, noise elevation, rainfall erosion.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::noise::Noise;
use crate::spatial::{Biome, TileGrid, TileId, DIRECTIONS};

pub const DEFAULT_NOISE_SIZE: usize = 256;
pub const MAX_RAINFALL_ROUNDS: u32 = 100;
pub const ELEVATION_SCALE: f64 = 20.0;
pub const NOISE_FREQUENCY: f64 = 4.0;
pub const INITIAL_WATER: f64 = 1.0;
pub const OCEAN_WATER_THRESHOLD: f64 = 1.5;

const FOREST_CUTOFF: f64 = 0.70;
const GRASS_CUTOFF: f64 = 0.90;
const DESERT_CUTOFF: f64 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainfallSummary {
    pub rounds: u32,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct GeneratedMap {
    pub grid: TileGrid,
    pub rainfall: RainfallSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct MapGenerator {
    rows: u32,
    columns: u32,
    noise_size: usize,
    max_rounds: u32,
}

impl MapGenerator {
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            noise_size: DEFAULT_NOISE_SIZE,
            max_rounds: MAX_RAINFALL_ROUNDS,
        }
    }

    pub fn with_noise_size(mut self, noise_size: usize) -> Self {
        self.noise_size = noise_size;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> GeneratedMap {
        let mut grid = TileGrid::new(self.rows, self.columns);
        let noise = Noise::new(self.noise_size, rng);
        assign_terrain(&mut grid, &noise, rng);
        let rainfall = simulate_rainfall(&mut grid, self.max_rounds);
        finalize_biomes(&mut grid);
        debug!(
            rows = self.rows,
            columns = self.columns,
            rounds = rainfall.rounds,
            converged = rainfall.converged,
            oceans = count_biome(&grid, Biome::Ocean),
            islands = count_biome(&grid, Biome::Island),
            "generated map"
        );
        GeneratedMap { grid, rainfall }
    }
}

pub fn draw_biome<R: Rng + ?Sized>(rng: &mut R) -> Biome {
    let roll: f64 = rng.gen();
    if roll < FOREST_CUTOFF {
        Biome::Forest
    } else if roll < GRASS_CUTOFF {
        Biome::Grass
    } else if roll < DESERT_CUTOFF {
        Biome::Desert
    } else {
        Biome::Mountain
    }
}

/// Draws every tile's biome and samples its elevation from `noise`.
pub fn assign_terrain<R: Rng + ?Sized>(grid: &mut TileGrid, noise: &Noise, rng: &mut R) {
    let rows = grid.rows() as f64;
    let columns = grid.columns() as f64;
    for tile in grid.tiles_mut() {
        tile.biome = draw_biome(rng);
        let x = tile.row() as f64 / rows * NOISE_FREQUENCY;
        let y = tile.column() as f64 / columns * NOISE_FREQUENCY;
        tile.elevation = ELEVATION_SCALE * noise.noise(x, y);
    }
}

/// Downhill water flow over the grid, one tile at a time.
///
/// Tiles are visited in ascending id order and transfers apply immediately,
/// so later tiles in a round see water moved by earlier ones. A tile with no
/// lower neighbor leaves the active set for good but can still receive water.
#[derive(Debug, Clone)]
pub struct Rainfall {
    active: Vec<TileId>,
    rounds: u32,
}

impl Rainfall {
    /// Floods every tile with the initial water level and activates it.
    pub fn start(grid: &mut TileGrid) -> Self {
        for tile in grid.tiles_mut() {
            tile.water = INITIAL_WATER;
        }
        Self {
            active: grid.ids().collect(),
            rounds: 0,
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn active(&self) -> &[TileId] {
        &self.active
    }

    pub fn is_settled(&self) -> bool {
        self.active.is_empty()
    }

    pub fn round(&mut self, grid: &mut TileGrid) {
        self.rounds += 1;
        self.active.retain(|&id| spill(grid, id));
    }
}

/// Returns whether the tile still had somewhere lower to send water.
fn spill(grid: &mut TileGrid, id: TileId) -> bool {
    let tile = grid.tile_at(id);
    let water = tile.water;
    let level = tile.elevation + water;

    let mut lower = [(id, 0.0); DIRECTIONS];
    let mut count = 0;
    let mut total_diff = 0.0;
    for (_, neighbor_id) in tile.neighbors() {
        let neighbor = grid.tile_at(neighbor_id);
        let neighbor_level = neighbor.elevation + neighbor.water;
        if neighbor_level < level {
            let diff = level - neighbor_level;
            lower[count] = (neighbor_id, diff);
            count += 1;
            total_diff += diff;
        }
    }

    if total_diff <= 0.0 {
        return false;
    }
    for &(neighbor_id, diff) in &lower[..count] {
        grid.tile_at_mut(neighbor_id).water += water * (diff / total_diff) * 0.5;
    }
    grid.tile_at_mut(id).water = water * 0.5;
    true
}

pub fn simulate_rainfall(grid: &mut TileGrid, max_rounds: u32) -> RainfallSummary {
    let mut rainfall = Rainfall::start(grid);
    while !rainfall.is_settled() && rainfall.rounds() < max_rounds {
        rainfall.round(grid);
    }
    RainfallSummary {
        rounds: rainfall.rounds(),
        converged: rainfall.is_settled(),
    }
}

/// Floods wet tiles: mountains poke out as islands, everything else drowns.
pub fn finalize_biomes(grid: &mut TileGrid) {
    for tile in grid.tiles_mut() {
        if tile.water > OCEAN_WATER_THRESHOLD {
            tile.biome = match tile.biome {
                Biome::Mountain | Biome::Island => Biome::Island,
                _ => Biome::Ocean,
            };
        }
    }
}

pub fn count_biome(grid: &TileGrid, biome: Biome) -> usize {
    grid.tiles().filter(|(_, tile)| tile.biome == biome).count()
}

pub fn total_water(grid: &TileGrid) -> f64 {
    grid.tiles().map(|(_, tile)| tile.water).sum()
}
