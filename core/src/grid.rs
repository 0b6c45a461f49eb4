//! Dense tile grid and coordinate transforms.

use glam::Vec2;

use crate::{CellCoord, CornerCutting, Direction, TileType};

/// Dense row-major grid of tile classifications.
///
/// The grid is the single source of passability for every navigation
/// consumer. Neighbourhoods are resolved exclusively through
/// [`Grid::neighbors`] and [`Grid::can_step`], so the corner-cutting policy
/// stored here applies identically to field construction, point-to-point
/// search, reachability checks, and movement.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tile_size: Vec2,
    corner_cutting: CornerCutting,
    tiles: Vec<TileType>,
}

impl Grid {
    /// Creates a grid of the provided dimensions filled with [`TileType::Floor`].
    ///
    /// A tile size that is not finite and positive is kept, but
    /// [`Grid::coordinate_world_to_grid`] then rejects every point.
    #[must_use]
    pub fn new(columns: u32, rows: u32, tile_size: Vec2) -> Self {
        let capacity = cell_capacity(columns, rows);
        Self {
            columns,
            rows,
            tile_size,
            corner_cutting: CornerCutting::default(),
            tiles: vec![TileType::Floor; capacity],
        }
    }

    /// Creates a grid from row-major tiles.
    ///
    /// Returns `None` when the tile count does not match the dimensions or
    /// the tile size is not finite and positive on both axes.
    #[must_use]
    pub fn from_tiles(
        columns: u32,
        rows: u32,
        tile_size: Vec2,
        tiles: Vec<TileType>,
    ) -> Option<Self> {
        if tiles.len() != cell_capacity(columns, rows) || !valid_tile_size(tile_size) {
            return None;
        }

        Some(Self {
            columns,
            rows,
            tile_size,
            corner_cutting: CornerCutting::default(),
            tiles,
        })
    }

    /// Replaces the diagonal corner-cutting policy.
    #[must_use]
    pub fn with_corner_cutting(mut self, corner_cutting: CornerCutting) -> Self {
        self.corner_cutting = corner_cutting;
        self
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// World-space extent of a single tile.
    #[must_use]
    pub const fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// Diagonal corner-cutting policy applied to neighbourhoods.
    #[must_use]
    pub const fn corner_cutting(&self) -> CornerCutting {
        self.corner_cutting
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn inside(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Classification of the cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileType> {
        self.index(cell).map(|index| self.tiles[index])
    }

    /// Classification of a cell that callers already checked with [`Grid::inside`].
    ///
    /// Cells outside the grid read as [`TileType::Obstacle`].
    #[must_use]
    pub fn at(&self, cell: CellCoord) -> TileType {
        self.tile(cell).unwrap_or(TileType::Obstacle)
    }

    /// Reports whether the cell lies within the grid and is passable.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(TileType::passable)
    }

    /// Reclassifies a cell, returning the previous classification.
    ///
    /// Cells outside the grid are left untouched and yield `None`.
    pub fn set(&mut self, cell: CellCoord, tile: TileType) -> Option<TileType> {
        let index = self.index(cell)?;
        Some(std::mem::replace(&mut self.tiles[index], tile))
    }

    /// Row-major tile classifications.
    #[must_use]
    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn coordinate_grid_to_world(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.tile_size.x,
            (cell.row() as f32 + 0.5) * self.tile_size.y,
        )
    }

    /// Cell containing the world-space point.
    ///
    /// Coordinates are truncated toward the cell the point falls into, so a
    /// point on a shared edge belongs to the cell with the larger index.
    /// Points outside the grid, and every point on a grid whose tile size
    /// is not finite and positive, yield `None`.
    #[must_use]
    pub fn coordinate_world_to_grid(&self, point: Vec2) -> Option<CellCoord> {
        if !(point.x >= 0.0 && point.y >= 0.0) || !valid_tile_size(self.tile_size) {
            return None;
        }

        let column = (point.x / self.tile_size.x).floor();
        let row = (point.y / self.tile_size.y).floor();
        if !(column.is_finite() && row.is_finite())
            || column >= self.columns as f32
            || row >= self.rows as f32
        {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Destination of a single step from `cell`, if the step is allowed.
    ///
    /// A step is allowed when the destination is inside and passable and,
    /// for diagonals under [`CornerCutting::Forbid`], both orthogonal cells
    /// the step passes between are passable as well.
    #[must_use]
    pub fn can_step(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let destination = cell.offset(direction)?;
        if !self.is_passable(destination) {
            return None;
        }

        if self.corner_cutting == CornerCutting::Forbid {
            if let Some((vertical, horizontal)) = direction.components() {
                let clear = |component: Direction| {
                    cell.offset(component)
                        .is_some_and(|side| self.is_passable(side))
                };
                if !clear(vertical) || !clear(horizontal) {
                    return None;
                }
            }
        }

        Some(destination)
    }

    /// Allowed single-step moves out of `cell` in [`Direction::ALL`] order.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord) -> Neighbors {
        let mut neighbors = Neighbors::default();
        for direction in Direction::ALL {
            if let Some(destination) = self.can_step(cell, direction) {
                neighbors.push(direction, destination);
            }
        }
        neighbors
    }

    /// Row-major offset of the cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.inside(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }

    /// Cell located at the provided row-major offset.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.tiles.len() {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }
}

/// Fixed-capacity iterator over the allowed moves out of a cell.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<(Direction, CellCoord)>; 8],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, direction: Direction, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some((direction, cell));
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = (Direction, CellCoord);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

fn valid_tile_size(tile_size: Vec2) -> bool {
    tile_size.is_finite() && tile_size.cmpgt(Vec2::ZERO).all()
}

fn cell_capacity(columns: u32, rows: u32) -> usize {
    let capacity = u64::from(columns) * u64::from(rows);
    usize::try_from(capacity).unwrap_or(0)
}
