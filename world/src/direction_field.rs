//! Multi-source direction field builder used by the world crate.

use std::{cmp::Ordering, collections::BinaryHeap};

use glam::Vec2;
use tilenav_core::{CellCoord, Direction, DirectionFieldView, Grid, NavigationError};
use tracing::debug;

/// Dense shortest-path field seeded from the goal cells.
///
/// The field mirrors the grid dimensions it was last built for and stores,
/// for every cell, the direction an agent standing there should move to
/// approach its nearest goal together with the remaining travel cost in
/// tiles. Costs default to `f32::INFINITY` for unreachable cells so callers
/// can distinguish dead ends from goals, which carry a cost of zero.
#[derive(Clone, Debug, Default)]
pub struct DirectionField {
    columns: u32,
    rows: u32,
    goals: Vec<CellCoord>,
    directions: Vec<Option<Direction>>,
    costs: Vec<f32>,
    passable: Vec<bool>,
}

impl DirectionField {
    /// Creates an empty field that reports every cell as unreachable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes every direction and cost using a multi-source Dijkstra search.
    ///
    /// Goals outside the grid or on impassable tiles are ignored. When no
    /// goal survives that filter the build fails with
    /// [`NavigationError::InvalidGoalSet`] and the previous field is kept.
    pub fn build(&mut self, grid: &Grid, goals: &[CellCoord]) -> Result<(), NavigationError> {
        let seeds: Vec<usize> = goals
            .iter()
            .filter(|goal| grid.is_passable(**goal))
            .filter_map(|goal| grid.index(*goal))
            .collect();
        if seeds.is_empty() {
            return Err(NavigationError::InvalidGoalSet {
                supplied: goals.len(),
            });
        }

        self.goals.clear();
        self.goals.extend_from_slice(goals);
        self.columns = grid.columns();
        self.rows = grid.rows();

        let cell_count = grid.cell_count();
        self.directions.clear();
        self.directions.resize(cell_count, None);
        self.costs.clear();
        self.costs.resize(cell_count, f32::INFINITY);
        self.passable.clear();
        self.passable
            .extend(grid.tiles().iter().map(|tile| tile.passable()));

        let mut open = BinaryHeap::with_capacity(cell_count);
        for index in seeds {
            self.costs[index] = 0.0;
            open.push(OpenCell { cost: 0.0, index });
        }

        while let Some(OpenCell { cost, index }) = open.pop() {
            if cost > self.costs[index] {
                continue;
            }

            let Some(cell) = grid.cell_at(index) else {
                continue;
            };

            for (direction, neighbor) in grid.neighbors(cell) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };

                let candidate = cost + direction.step_cost();
                if candidate >= self.costs[neighbor_index] {
                    continue;
                }

                self.costs[neighbor_index] = candidate;
                self.directions[neighbor_index] = Some(direction.opposite());
                open.push(OpenCell {
                    cost: candidate,
                    index: neighbor_index,
                });
            }
        }

        debug!(
            columns = self.columns,
            rows = self.rows,
            goals = self.goals.len(),
            reachable = self.reachable_count(),
            "direction field rebuilt"
        );
        Ok(())
    }

    /// Rebuilds the field after `changed` was edited, reusing the recorded goals.
    ///
    /// The whole field is recomputed; the changed cell is only reported in
    /// the log.
    pub fn update(&mut self, grid: &Grid, changed: CellCoord) -> Result<(), NavigationError> {
        debug!(%changed, "direction field update requested");
        let goals = std::mem::take(&mut self.goals);
        let result = self.build(grid, &goals);
        if result.is_err() {
            self.goals = goals;
        }
        result
    }

    /// Goal cells supplied to the most recent successful build.
    #[must_use]
    pub fn goals(&self) -> &[CellCoord] {
        &self.goals
    }

    /// Read-only view over the per-cell arrays.
    #[must_use]
    pub fn view(&self) -> DirectionFieldView<'_> {
        DirectionFieldView::new(
            &self.directions,
            &self.costs,
            &self.passable,
            self.columns,
            self.rows,
        )
    }

    /// Best next-step direction out of the cell; see [`DirectionFieldView::direction_of`].
    #[must_use]
    pub fn direction_of(&self, cell: CellCoord) -> Option<Direction> {
        self.view().direction_of(cell)
    }

    /// Remaining travel cost from the cell; see [`DirectionFieldView::cost_of`].
    #[must_use]
    pub fn cost_of(&self, cell: CellCoord) -> f32 {
        self.view().cost_of(cell)
    }

    /// Walks the field from `start`; see [`DirectionFieldView::path_of`].
    #[must_use]
    pub fn path_of(&self, start: CellCoord, max_steps: usize) -> Option<Vec<CellCoord>> {
        self.view().path_of(start, max_steps)
    }

    /// Direction stored for the cell containing a world-space point.
    #[must_use]
    pub fn direction_at(&self, grid: &Grid, point: Vec2) -> Option<Direction> {
        grid.coordinate_world_to_grid(point)
            .and_then(|cell| self.direction_of(cell))
    }

    /// Cost stored for the cell containing a world-space point.
    #[must_use]
    pub fn cost_at(&self, grid: &Grid, point: Vec2) -> f32 {
        grid.coordinate_world_to_grid(point)
            .map_or(f32::INFINITY, |cell| self.cost_of(cell))
    }

    /// Number of cells with a finite cost, goals included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.costs.iter().filter(|cost| cost.is_finite()).count()
    }

    /// Number of cells covered by the field.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.costs.len()
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenCell {
    cost: f32,
    index: usize,
}

impl PartialEq for OpenCell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenCell {}

impl PartialOrd for OpenCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenCell {
    // Reversed so the max-heap pops the cheapest cell, lowest index first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}
