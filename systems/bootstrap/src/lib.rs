#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bootstrap system that turns a TOML map description into a ready [`World`].
//!
//! Maps are written as rows of single-character tiles:
//!
//! | Symbol | Tile |
//! |--------|------|
//! | `.` | floor |
//! | `+` | buildable floor |
//! | `#` | obstacle |
//! | `%` | buildable obstacle |
//! | `E` | entry (floor) |
//! | `G` | goal (floor) |

use std::{
    fs,
    path::{Path, PathBuf},
};

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;
use tilenav_core::{CellCoord, CornerCutting, Grid, NavigationError, TileType};
use tilenav_system_pathfinder::is_reachable;
use tilenav_world::World;
use tracing::info;

/// Reasons a map description cannot be turned into a world.
#[derive(Debug, Error)]
pub enum MapError {
    /// The map file could not be read.
    #[error("failed to read map at {}", path.display())]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The contents are not a valid TOML map description.
    #[error("failed to parse map toml contents")]
    Parse(#[from] toml::de::Error),
    /// Tile dimensions must be finite and positive.
    #[error("tile size {width}x{height} must be positive")]
    InvalidTileSize {
        /// Declared tile width.
        width: f32,
        /// Declared tile height.
        height: f32,
    },
    /// The map declares no rows or an empty first row.
    #[error("map has no tiles")]
    Empty,
    /// The map is wider or taller than a grid can address.
    #[error("map dimensions exceed the addressable grid size")]
    TooLarge,
    /// A row's length differs from the first row.
    #[error("row {row} has {found} tiles; expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Width established by the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character outside the legend was found.
    #[error("unknown tile symbol `{symbol}` at {cell}")]
    UnknownTile {
        /// Offending character.
        symbol: char,
        /// Cell holding the character.
        cell: CellCoord,
    },
    /// The map declares no entry cell.
    #[error("map declares no entry (`E`) cell")]
    MissingEntry,
    /// The map declares no goal cell.
    #[error("map declares no goal (`G`) cell")]
    MissingGoal,
    /// An entry cannot reach any goal on the initial grid.
    #[error("entry {entry} cannot reach any goal")]
    DisconnectedEntry {
        /// Entry without a route.
        entry: CellCoord,
    },
    /// The direction field rejected the goal set.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapConfig {
    tile_width: f32,
    tile_height: f32,
    #[serde(default)]
    corner_cutting: CornerCutting,
    rows: Vec<String>,
}

/// Grid with its declared entry and goal cells, prior to building the world.
#[derive(Clone, Debug, PartialEq)]
pub struct MapLayout {
    /// Tile grid described by the map.
    pub grid: Grid,
    /// Entry cells in row-major order.
    pub entries: Vec<CellCoord>,
    /// Goal cells in row-major order.
    pub goals: Vec<CellCoord>,
}

impl MapLayout {
    /// Parses a TOML map description and validates its layout.
    pub fn from_toml(contents: &str) -> Result<Self, MapError> {
        let config: MapConfig = toml::from_str(contents)?;
        Self::from_config(config)
    }

    /// Builds the authoritative world for this layout.
    pub fn into_world(self) -> Result<World, MapError> {
        Ok(World::new(self.grid, self.entries, self.goals)?)
    }

    fn from_config(config: MapConfig) -> Result<Self, MapError> {
        let tile_size = Vec2::new(config.tile_width, config.tile_height);
        if !(tile_size.is_finite() && tile_size.cmpgt(Vec2::ZERO).all()) {
            return Err(MapError::InvalidTileSize {
                width: config.tile_width,
                height: config.tile_height,
            });
        }

        let width = config
            .rows
            .first()
            .map(|row| row.chars().count())
            .filter(|width| *width > 0)
            .ok_or(MapError::Empty)?;
        let columns = u32::try_from(width).map_err(|_| MapError::TooLarge)?;
        let rows = u32::try_from(config.rows.len()).map_err(|_| MapError::TooLarge)?;

        let mut tiles = Vec::with_capacity(width.saturating_mul(config.rows.len()));
        let mut entries = Vec::new();
        let mut goals = Vec::new();
        for (row, line) in (0..rows).zip(&config.rows) {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }

            for (column, symbol) in (0..columns).zip(line.chars()) {
                let cell = CellCoord::new(column, row);
                let tile = match symbol {
                    '.' => TileType::Floor,
                    '+' => TileType::BuildableFloor,
                    '#' => TileType::Obstacle,
                    '%' => TileType::BuildableObstacle,
                    'E' => {
                        entries.push(cell);
                        TileType::Floor
                    }
                    'G' => {
                        goals.push(cell);
                        TileType::Floor
                    }
                    _ => return Err(MapError::UnknownTile { symbol, cell }),
                };
                tiles.push(tile);
            }
        }

        if entries.is_empty() {
            return Err(MapError::MissingEntry);
        }
        if goals.is_empty() {
            return Err(MapError::MissingGoal);
        }

        let grid = Grid::from_tiles(columns, rows, tile_size, tiles)
            .ok_or(MapError::TooLarge)?
            .with_corner_cutting(config.corner_cutting);
        if let Some(entry) = entries
            .iter()
            .copied()
            .find(|entry| !is_reachable(&grid, *entry, &goals))
        {
            return Err(MapError::DisconnectedEntry { entry });
        }

        Ok(Self {
            grid,
            entries,
            goals,
        })
    }
}

/// Loads map descriptions into worlds.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Parses map contents and builds the world.
    pub fn world_from_str(&self, contents: &str) -> Result<World, MapError> {
        MapLayout::from_toml(contents)?.into_world()
    }

    /// Reads the map at `path` and builds the world.
    pub fn world_from_path(&self, path: impl AsRef<Path>) -> Result<World, MapError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = MapLayout::from_toml(&contents)?;
        info!(
            path = %path.display(),
            columns = layout.grid.columns(),
            rows = layout.grid.rows(),
            entries = layout.entries.len(),
            goals = layout.goals.len(),
            "map loaded"
        );
        layout.into_world()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilenav_world::query;

    fn map(rows: &[&str]) -> String {
        let rows = rows
            .iter()
            .map(|row| format!("  \"{row}\","))
            .collect::<Vec<_>>()
            .join("\n");
        format!("tile_width = 32.0\ntile_height = 16.0\nrows = [\n{rows}\n]\n")
    }

    #[test]
    fn parses_legend_into_tiles_entries_and_goals() {
        let layout = MapLayout::from_toml(&map(&["E.+#", "%..G"])).expect("valid map");

        assert_eq!(layout.grid.columns(), 4);
        assert_eq!(layout.grid.rows(), 2);
        assert_eq!(layout.grid.tile_size(), Vec2::new(32.0, 16.0));
        assert_eq!(layout.grid.corner_cutting(), CornerCutting::Forbid);
        assert_eq!(layout.entries, vec![CellCoord::new(0, 0)]);
        assert_eq!(layout.goals, vec![CellCoord::new(3, 1)]);
        assert_eq!(layout.grid.at(CellCoord::new(2, 0)), TileType::BuildableFloor);
        assert_eq!(layout.grid.at(CellCoord::new(3, 0)), TileType::Obstacle);
        assert_eq!(layout.grid.at(CellCoord::new(0, 1)), TileType::BuildableObstacle);
        assert_eq!(layout.grid.at(CellCoord::new(0, 0)), TileType::Floor);
    }

    #[test]
    fn corner_cutting_policy_is_read_from_config() {
        let contents = format!("corner_cutting = \"allow\"\n{}", map(&["E.", ".G"]));
        let layout = MapLayout::from_toml(&contents).expect("valid map");
        assert_eq!(layout.grid.corner_cutting(), CornerCutting::Allow);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = MapLayout::from_toml(&map(&["E..", "G."])).expect_err("ragged");
        assert!(matches!(
            error,
            MapError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn unknown_symbols_report_their_cell() {
        let error = MapLayout::from_toml(&map(&["E.x", "..G"])).expect_err("unknown symbol");
        assert!(matches!(
            error,
            MapError::UnknownTile { symbol: 'x', cell } if cell == CellCoord::new(2, 0)
        ));
    }

    #[test]
    fn entries_and_goals_are_required() {
        assert!(matches!(
            MapLayout::from_toml(&map(&["..G"])),
            Err(MapError::MissingEntry)
        ));
        assert!(matches!(
            MapLayout::from_toml(&map(&["E.."])),
            Err(MapError::MissingGoal)
        ));
        assert!(matches!(
            MapLayout::from_toml(&map(&[])),
            Err(MapError::Empty)
        ));
    }

    #[test]
    fn walled_off_entry_is_rejected() {
        let error = MapLayout::from_toml(&map(&["E#.", "##G"])).expect_err("disconnected");
        assert!(matches!(
            error,
            MapError::DisconnectedEntry { entry } if entry == CellCoord::new(0, 0)
        ));
    }

    #[test]
    fn diagonal_gap_only_connects_when_corner_cutting_is_allowed() {
        let rows = ["E#", "#G"];
        assert!(matches!(
            MapLayout::from_toml(&map(&rows)),
            Err(MapError::DisconnectedEntry { .. })
        ));

        let allowed = format!("corner_cutting = \"allow\"\n{}", map(&rows));
        assert!(MapLayout::from_toml(&allowed).is_ok());
    }

    #[test]
    fn non_positive_tile_size_is_rejected() {
        let contents = "tile_width = 0.0\ntile_height = 1.0\nrows = [\"EG\"]\n";
        assert!(matches!(
            MapLayout::from_toml(contents),
            Err(MapError::InvalidTileSize { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let contents = format!("speed = 3.0\n{}", map(&["EG"]));
        assert!(matches!(
            MapLayout::from_toml(&contents),
            Err(MapError::Parse(_))
        ));
    }

    #[test]
    fn loaded_world_caches_a_path_per_entry() {
        let world = Bootstrap
            .world_from_str(&map(&["E...", ".##.", "E..G"]))
            .expect("valid map");

        assert_eq!(query::entries(&world).len(), 2);
        for entry in query::entries(&world) {
            let path = query::path_cache(&world)
                .path_for(*entry)
                .expect("entry is cached");
            assert_eq!(path.last(), Some(&CellCoord::new(3, 2)));
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = Bootstrap
            .world_from_path("does/not/exist.toml")
            .expect_err("missing file");
        assert!(matches!(error, MapError::Io { .. }));
    }
}
