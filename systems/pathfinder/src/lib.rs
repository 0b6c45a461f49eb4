#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stateless point-to-point search over a tile grid.
//!
//! The path finder never consults a direction field. It answers two
//! questions about a caller-supplied [`Grid`]: the shortest route from a
//! start cell to the nearest of several goals ([`astar`]), and whether any
//! such route exists at all ([`is_reachable`]). Both searches expand the
//! grid's own neighbourhood so they always agree with each other and with
//! the direction field about which moves are legal.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, VecDeque},
};

use tilenav_core::{CellCoord, Grid, DIAGONAL_STEP_COST};
use tracing::trace;

/// Distance estimates available to [`astar`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Heuristic {
    /// Octile distance: exact on an open grid with √2 diagonals.
    #[default]
    Octile,
    /// Chebyshev distance: admissible, but ignores the extra diagonal cost.
    Chebyshev,
    /// Manhattan distance.
    ///
    /// Overestimates diagonal steps, so returned routes are valid but not
    /// guaranteed to be the shortest.
    Manhattan,
}

impl Heuristic {
    /// Estimated travel cost in tiles between two cells.
    #[must_use]
    pub fn estimate(self, from: CellCoord, to: CellCoord) -> f32 {
        let dx = from.column().abs_diff(to.column()) as f32;
        let dy = from.row().abs_diff(to.row()) as f32;
        match self {
            Self::Octile => dx.max(dy) + (DIAGONAL_STEP_COST - 1.0) * dx.min(dy),
            Self::Chebyshev => dx.max(dy),
            Self::Manhattan => dx + dy,
        }
    }

    fn nearest(self, from: CellCoord, goals: &[CellCoord]) -> f32 {
        goals
            .iter()
            .map(|goal| self.estimate(from, *goal))
            .fold(f32::INFINITY, f32::min)
    }
}

/// Finds the cheapest route from `start` to the nearest cell in `goals`.
///
/// Goals outside the grid or on impassable tiles are ignored. The returned
/// path includes both endpoints. Returns `None` when `start` is outside the
/// grid or impassable, when no goal remains after filtering, or when no
/// route exists.
#[must_use]
pub fn astar(
    grid: &Grid,
    start: CellCoord,
    goals: &[CellCoord],
    heuristic: Heuristic,
) -> Option<Vec<CellCoord>> {
    let start_index = passable_index(grid, start)?;
    let (goal_cells, goal_mask) = goal_set(grid, goals)?;

    let cell_count = grid.cell_count();
    let mut best = vec![f32::INFINITY; cell_count];
    let mut came_from: Vec<Option<usize>> = vec![None; cell_count];
    let mut open = BinaryHeap::new();

    best[start_index] = 0.0;
    open.push(OpenNode {
        priority: heuristic.nearest(start, &goal_cells),
        cost: 0.0,
        index: start_index,
    });

    let mut expanded = 0usize;
    while let Some(node) = open.pop() {
        if node.cost > best[node.index] {
            continue;
        }

        let Some(current) = grid.cell_at(node.index) else {
            continue;
        };
        expanded += 1;

        if goal_mask[node.index] {
            trace!(%start, goal = %current, expanded, "astar reached goal");
            return Some(reconstruct(grid, &came_from, node.index));
        }

        for (direction, neighbor) in grid.neighbors(current) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };

            let candidate = node.cost + direction.step_cost();
            if candidate >= best[neighbor_index] {
                continue;
            }

            best[neighbor_index] = candidate;
            came_from[neighbor_index] = Some(node.index);
            open.push(OpenNode {
                priority: candidate + heuristic.nearest(neighbor, &goal_cells),
                cost: candidate,
                index: neighbor_index,
            });
        }
    }

    trace!(%start, expanded, "astar exhausted open set");
    None
}

/// Single-goal convenience wrapper around [`astar`].
#[must_use]
pub fn astar_to(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    heuristic: Heuristic,
) -> Option<Vec<CellCoord>> {
    astar(grid, start, &[goal], heuristic)
}

/// Reports whether any route connects `start` to a cell in `goals`.
///
/// Equivalent to `astar(grid, start, goals, _).is_some()`, computed with a
/// breadth-first flood fill.
#[must_use]
pub fn is_reachable(grid: &Grid, start: CellCoord, goals: &[CellCoord]) -> bool {
    let Some(start_index) = passable_index(grid, start) else {
        return false;
    };
    let Some((_, goal_mask)) = goal_set(grid, goals) else {
        return false;
    };

    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();
    visited[start_index] = true;
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        let Some(index) = grid.index(cell) else {
            continue;
        };
        if goal_mask[index] {
            return true;
        }

        for (_, neighbor) in grid.neighbors(cell) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if visited[neighbor_index] {
                continue;
            }
            visited[neighbor_index] = true;
            queue.push_back(neighbor);
        }
    }

    false
}

/// Reports whether every entry can reach at least one goal.
#[must_use]
pub fn all_connected(grid: &Grid, entries: &[CellCoord], goals: &[CellCoord]) -> bool {
    entries
        .iter()
        .all(|entry| is_reachable(grid, *entry, goals))
}

fn passable_index(grid: &Grid, cell: CellCoord) -> Option<usize> {
    grid.index(cell).filter(|_| grid.is_passable(cell))
}

fn goal_set(grid: &Grid, goals: &[CellCoord]) -> Option<(Vec<CellCoord>, Vec<bool>)> {
    let mut mask = vec![false; grid.cell_count()];
    let mut cells = Vec::with_capacity(goals.len());
    for goal in goals {
        let Some(index) = passable_index(grid, *goal) else {
            continue;
        };
        if !mask[index] {
            mask[index] = true;
            cells.push(*goal);
        }
    }

    if cells.is_empty() {
        None
    } else {
        Some((cells, mask))
    }
}

fn reconstruct(grid: &Grid, came_from: &[Option<usize>], goal_index: usize) -> Vec<CellCoord> {
    let mut path = Vec::new();
    let mut cursor = Some(goal_index);
    while let Some(index) = cursor {
        if let Some(cell) = grid.cell_at(index) {
            path.push(cell);
        }
        cursor = came_from[index];
    }
    path.reverse();
    path
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    priority: f32,
    cost: f32,
    index: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // Reversed so the max-heap pops the cheapest node, lowest index first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.index.cmp(&self.index))
    }
}
