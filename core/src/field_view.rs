//! Read-only access to a computed direction field.

use crate::{CellCoord, Direction};

/// Read-only view into a direction field's dense per-cell arrays.
///
/// The view mirrors the grid dimensions the field was built for. Cells that
/// were impassable when the field was built read as having no direction and
/// infinite cost; so do passable cells that cannot reach any goal. Goal cells
/// have no direction and zero cost.
#[derive(Clone, Copy, Debug)]
pub struct DirectionFieldView<'a> {
    directions: &'a [Option<Direction>],
    costs: &'a [f32],
    passable: &'a [bool],
    columns: u32,
    rows: u32,
}

impl<'a> DirectionFieldView<'a> {
    /// Captures a new view backed by the provided row-major slices.
    ///
    /// All three slices must hold `columns * rows` entries.
    #[must_use]
    pub fn new(
        directions: &'a [Option<Direction>],
        costs: &'a [f32],
        passable: &'a [bool],
        columns: u32,
        rows: u32,
    ) -> Self {
        debug_assert_eq!(directions.len(), costs.len());
        debug_assert_eq!(directions.len(), passable.len());
        Self {
            directions,
            costs,
            passable,
            columns,
            rows,
        }
    }

    /// Provides the dimensions of the underlying field.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Best next-step direction out of the cell toward the nearest goal.
    ///
    /// Returns `None` for goal cells, unreachable cells, impassable cells,
    /// and cells outside the field.
    #[must_use]
    pub fn direction_of(&self, cell: CellCoord) -> Option<Direction> {
        self.index(cell)
            .and_then(|index| self.directions.get(index).copied().flatten())
    }

    /// Shortest travel cost from the cell to its nearest goal in tiles.
    ///
    /// Returns `f32::INFINITY` for unreachable, impassable, or out-of-range
    /// cells.
    #[must_use]
    pub fn cost_of(&self, cell: CellCoord) -> f32 {
        self.index(cell)
            .and_then(|index| self.costs.get(index).copied())
            .unwrap_or(f32::INFINITY)
    }

    /// Reports whether the cell was a goal when the field was built.
    #[must_use]
    pub fn is_goal(&self, cell: CellCoord) -> bool {
        self.cost_of(cell) == 0.0
    }

    /// Walks the field from `start` until a cell without direction is reached.
    ///
    /// Returns `None` when `start` is outside the field or impassable. A start
    /// without direction yields the single-element path `[start]`. The walk
    /// stops after `max_steps` steps even if it has not terminated.
    #[must_use]
    pub fn path_of(&self, start: CellCoord, max_steps: usize) -> Option<Vec<CellCoord>> {
        let index = self.index(start)?;
        if !self.passable.get(index).copied().unwrap_or(false) {
            return None;
        }

        let mut path = vec![start];
        let mut current = start;
        for _ in 0..max_steps {
            let Some(direction) = self.direction_of(current) else {
                break;
            };
            let Some(next) = current.offset(direction).filter(|next| self.contains(*next)) else {
                break;
            };
            path.push(next);
            current = next;
        }

        Some(path)
    }

    /// Iterates over every cell with its stored direction and cost in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Option<Direction>, f32)> + 'a {
        let columns = self.columns.max(1);
        self.directions
            .iter()
            .zip(self.costs.iter())
            .enumerate()
            .map(move |(index, (direction, cost))| {
                let index = u32::try_from(index).unwrap_or(u32::MAX);
                let cell = CellCoord::new(index % columns, index / columns);
                (cell, *direction, *cost)
            })
    }

    /// Row-major stored directions.
    #[must_use]
    pub fn directions(&self) -> &'a [Option<Direction>] {
        self.directions
    }

    /// Row-major stored costs.
    #[must_use]
    pub fn costs(&self) -> &'a [f32] {
        self.costs
    }

    fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}
