//! Spatial model - offset hex grid of tiles

use serde::{Deserialize, Serialize};

use crate::components::{BuildingId, UnitId};

/// Number of neighbor slots on a hex tile.
pub const DIRECTIONS: usize = 6;

/// Neighbor slot names, clockwise from east.
pub const EAST: usize = 0;
pub const SOUTH_EAST: usize = 1;
pub const SOUTH_WEST: usize = 2;
pub const WEST: usize = 3;
pub const NORTH_WEST: usize = 4;
pub const NORTH_EAST: usize = 5;

pub fn opposite(direction: usize) -> usize {
    (direction + 3) % DIRECTIONS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub(crate) u32);

impl TileId {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Forest,
    Grass,
    Desert,
    Mountain,
    Ocean,
    Island,
}

impl Biome {
    /// Whether a building may ever stand on this biome.
    pub fn is_buildable(self) -> bool {
        !matches!(self, Biome::Ocean)
    }
}

/// Spoke connectivity of a built tile, one bit per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    spokes: u8,
}

impl Road {
    pub fn is_connected(&self, direction: usize) -> bool {
        self.spokes & (1 << direction) != 0
    }

    pub fn spokes(&self) -> u8 {
        self.spokes
    }

    pub(crate) fn connect(&mut self, direction: usize) {
        self.spokes |= 1 << direction;
    }

    pub(crate) fn disconnect(&mut self, direction: usize) {
        self.spokes &= !(1 << direction);
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    row: u32,
    column: u32,
    pub biome: Biome,
    pub elevation: f64,
    pub(crate) water: f64,
    neighbors: [Option<TileId>; DIRECTIONS],
    pub(crate) unit: Option<UnitId>,
    pub(crate) building: Option<BuildingId>,
    pub(crate) road: Option<Road>,
}

impl Tile {
    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// Water left over from world generation.
    pub fn water(&self) -> f64 {
        self.water
    }

    pub fn neighbor(&self, direction: usize) -> Option<TileId> {
        self.neighbors.get(direction).copied().flatten()
    }

    /// Present neighbors with their direction index, in index order.
    pub fn neighbors(&self) -> impl Iterator<Item = (usize, TileId)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .filter_map(|(direction, slot)| slot.map(|id| (direction, id)))
    }

    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    pub fn has_unit(&self) -> bool {
        self.unit.is_some()
    }

    pub fn building(&self) -> Option<BuildingId> {
        self.building
    }

    pub fn has_building(&self) -> bool {
        self.building.is_some()
    }

    pub fn road(&self) -> Option<&Road> {
        self.road.as_ref()
    }
}

/// Offset hex grid; even rows sit half a tile to the right of odd rows.
#[derive(Debug, Clone)]
pub struct TileGrid {
    rows: u32,
    columns: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Builds the adjacency graph with every tile as flat grassland.
    pub fn new(rows: u32, columns: u32) -> Self {
        let mut tiles = Vec::with_capacity((rows * columns) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let mut neighbors = [None; DIRECTIONS];
                for (direction, slot) in neighbors.iter_mut().enumerate() {
                    *slot = neighbor_position(rows, columns, row, column, direction)
                        .map(|(r, c)| TileId(r * columns + c));
                }
                tiles.push(Tile {
                    row,
                    column,
                    biome: Biome::Grass,
                    elevation: 0.0,
                    water: 0.0,
                    neighbors,
                    unit: None,
                    building: None,
                    road: None,
                });
            }
        }
        Self {
            rows,
            columns,
            tiles,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn id_at(&self, row: u32, column: u32) -> Option<TileId> {
        if row < self.rows && column < self.columns {
            Some(TileId(row * self.columns + column))
        } else {
            None
        }
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.index())
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id.index())
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.tiles.len() as u32).map(TileId)
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (TileId(index as u32), tile))
    }

    pub(crate) fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    pub(crate) fn tile_at(&self, id: TileId) -> &Tile {
        &self.tiles[id.index()]
    }

    pub(crate) fn tile_at_mut(&mut self, id: TileId) -> &mut Tile {
        &mut self.tiles[id.index()]
    }
}

fn neighbor_position(
    rows: u32,
    columns: u32,
    row: u32,
    column: u32,
    direction: usize,
) -> Option<(u32, u32)> {
    let shift = if row % 2 == 0 { 1 } else { 0 };
    let (dr, dc): (i64, i64) = match direction {
        EAST => (0, 1),
        SOUTH_EAST => (1, shift),
        SOUTH_WEST => (1, shift - 1),
        WEST => (0, -1),
        NORTH_WEST => (-1, shift - 1),
        NORTH_EAST => (-1, shift),
        _ => return None,
    };
    let r = row as i64 + dr;
    let c = column as i64 + dc;
    if r < 0 || c < 0 || r >= rows as i64 || c >= columns as i64 {
        None
    } else {
        Some((r as u32, c as u32))
    }
}
