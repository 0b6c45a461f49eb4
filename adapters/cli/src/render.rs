//! Plain-text renderings of grids, direction fields, and routes.

use std::fmt::Write as _;

use tilenav_core::{CellCoord, Direction, DirectionFieldView, Grid, TileType};

fn arrow(direction: Direction) -> char {
    match direction {
        Direction::North => '↑',
        Direction::NorthEast => '↗',
        Direction::East => '→',
        Direction::SouthEast => '↘',
        Direction::South => '↓',
        Direction::SouthWest => '↙',
        Direction::West => '←',
        Direction::NorthWest => '↖',
    }
}

fn blocked_glyph(tile: TileType) -> Option<char> {
    match tile {
        TileType::Obstacle | TileType::BuildableObstacle => Some('#'),
        TileType::Occupied(_) => Some('S'),
        TileType::Floor | TileType::BuildableFloor => None,
    }
}

fn cells(grid: &Grid) -> impl Iterator<Item = (CellCoord, bool)> + '_ {
    (0..grid.rows()).flat_map(move |row| {
        (0..grid.columns()).map(move |column| {
            (CellCoord::new(column, row), column + 1 == grid.columns())
        })
    })
}

/// One glyph per cell: arrows for the flow, `G` for goals, `?` for cells that cannot reach one.
pub(crate) fn arrows(grid: &Grid, field: &DirectionFieldView<'_>) -> String {
    let mut out = String::new();
    for (cell, row_end) in cells(grid) {
        let glyph = blocked_glyph(grid.at(cell)).unwrap_or_else(|| {
            match field.direction_of(cell) {
                Some(direction) => arrow(direction),
                None if field.is_goal(cell) => 'G',
                None => '?',
            }
        });
        out.push(glyph);
        if row_end {
            out.push('\n');
        }
    }
    out
}

/// Cost-to-goal per cell, rounded to one decimal place.
pub(crate) fn costs(grid: &Grid, field: &DirectionFieldView<'_>) -> String {
    let mut out = String::new();
    for (cell, row_end) in cells(grid) {
        let cost = field.cost_of(cell);
        let _ = match blocked_glyph(grid.at(cell)) {
            Some(glyph) => write!(out, "{glyph:>6}"),
            None if cost.is_finite() => write!(out, "{cost:>6.1}"),
            None => write!(out, "{:>6}", "inf"),
        };
        if row_end {
            out.push('\n');
        }
    }
    out
}

/// Grid with the route's cells marked `*` and its endpoints `A` and `B`.
pub(crate) fn route(grid: &Grid, path: &[CellCoord]) -> String {
    let mut out = String::new();
    for (cell, row_end) in cells(grid) {
        let glyph = if path.first() == Some(&cell) {
            'A'
        } else if path.last() == Some(&cell) {
            'B'
        } else if path.contains(&cell) {
            '*'
        } else {
            blocked_glyph(grid.at(cell)).unwrap_or('.')
        };
        out.push(glyph);
        if row_end {
            out.push('\n');
        }
    }
    out
}
