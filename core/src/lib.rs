#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tilenav navigation engine.
//!
//! This crate defines the tile grid model and the message surface that
//! connects adapters, the authoritative world, and pure systems. Adapters
//! submit [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values for systems to react to deterministically. Systems read the
//! [`Grid`] and the [`DirectionFieldView`] but never write them.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod field_view;
mod grid;

pub use field_view::DirectionFieldView;
pub use grid::{Grid, Neighbors};

/// Edge weight of a single orthogonal step measured in tiles.
pub const ORTHOGONAL_STEP_COST: f32 = 1.0;

/// Edge weight of a single diagonal step measured in tiles.
pub const DIAGONAL_STEP_COST: f32 = std::f32::consts::SQRT_2;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a structure be constructed on the provided cell.
    PlaceStructure {
        /// Cell the structure should occupy.
        cell: CellCoord,
    },
    /// Requests removal of an existing structure from the world.
    RemoveStructure {
        /// Identifier of the structure targeted for removal.
        structure: StructureId,
    },
    /// Privileged edit that reclassifies a single tile.
    SetTile {
        /// Cell whose classification changes.
        cell: CellCoord,
        /// Classification the cell should adopt.
        tile: TileType,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a structure was placed into the world.
    StructurePlaced {
        /// Identifier assigned to the structure by the world.
        structure: StructureId,
        /// Cell occupied by the structure.
        cell: CellCoord,
    },
    /// Confirms that a structure was removed from the world.
    StructureRemoved {
        /// Identifier of the structure that was removed.
        structure: StructureId,
        /// Cell previously occupied by the structure.
        cell: CellCoord,
    },
    /// Reports that a structure placement request was rejected.
    StructurePlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a structure removal request was rejected.
    StructureRemovalRejected {
        /// Identifier of the structure targeted for removal.
        structure: StructureId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that a privileged tile edit was committed.
    TileChanged {
        /// Cell whose classification changed.
        cell: CellCoord,
        /// Classification before the edit.
        from: TileType,
        /// Classification after the edit.
        to: TileType,
    },
    /// Reports that a privileged tile edit was rejected.
    TileChangeRejected {
        /// Cell targeted by the edit.
        cell: CellCoord,
        /// Specific reason the edit failed.
        reason: PlacementError,
    },
    /// Announces that the direction field was rebuilt after a grid mutation.
    NavigationRebuilt {
        /// Cell whose mutation triggered the rebuild.
        changed: CellCoord,
        /// Entry cells whose cached paths were recomputed.
        refreshed_entries: Vec<CellCoord>,
    },
}

/// Unique identifier assigned to a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Columns grow eastward and rows grow southward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev (king-move) distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Cell reached by a single step in `direction`, ignoring grid bounds.
    ///
    /// Returns `None` when the step would underflow or overflow the
    /// coordinate range.
    #[must_use]
    pub fn offset(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.delta();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Compass directions available to agents on the 8-connected grid.
///
/// The absence of a direction (goal or unreachable cells) is expressed as
/// `Option<Direction>::None` wherever a field value is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column and decreasing row indices.
    NorthEast,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing column and row indices.
    SouthEast,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column and increasing row indices.
    SouthWest,
    /// Movement toward decreasing column indices.
    West,
    /// Movement toward decreasing column and row indices.
    NorthWest,
}

impl Direction {
    /// Every direction, orthogonals first, in a fixed deterministic order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Column and row delta applied by a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }

    /// Reports whether the direction moves along both axes.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// Edge weight of a step in this direction measured in tiles.
    #[must_use]
    pub const fn step_cost(self) -> f32 {
        if self.is_diagonal() {
            DIAGONAL_STEP_COST
        } else {
            ORTHOGONAL_STEP_COST
        }
    }

    /// Splits a diagonal into its two orthogonal components.
    ///
    /// Orthogonal directions return `None`.
    #[must_use]
    pub const fn components(self) -> Option<(Direction, Direction)> {
        match self {
            Self::NorthEast => Some((Self::North, Self::East)),
            Self::SouthEast => Some((Self::South, Self::East)),
            Self::SouthWest => Some((Self::South, Self::West)),
            Self::NorthWest => Some((Self::North, Self::West)),
            _ => None,
        }
    }

    /// Direction of a single step between two adjacent cells.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Direction> {
        Self::ALL
            .into_iter()
            .find(|direction| from.offset(*direction) == Some(to))
    }
}

/// Classification of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    /// Open ground that cannot host structures.
    Floor,
    /// Open ground where structures may be constructed.
    BuildableFloor,
    /// Permanent blocking terrain.
    Obstacle,
    /// Blocking terrain that may be cleared or built upon by editors.
    BuildableObstacle,
    /// Tile covered by the identified structure.
    Occupied(StructureId),
}

impl TileType {
    /// Reports whether agents may traverse the tile.
    #[must_use]
    pub const fn passable(self) -> bool {
        matches!(self, Self::Floor | Self::BuildableFloor)
    }

    /// Reports whether a structure may be constructed on the tile.
    #[must_use]
    pub const fn buildable(self) -> bool {
        matches!(self, Self::BuildableFloor)
    }
}

/// Policy applied to diagonal steps that pass between two orthogonal cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerCutting {
    /// Diagonal steps are allowed only when both orthogonal cells they pass
    /// are passable, so agents never clip the corner of a blocked tile.
    #[default]
    Forbid,
    /// Diagonal steps are allowed whenever the destination is passable.
    Allow,
}

/// Reasons a structure placement or tile edit may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies beyond the configured grid bounds.
    OutOfBounds,
    /// The requested cell does not accept structures.
    NotBuildable,
    /// The requested cell is an entry or goal and must stay open.
    Reserved,
    /// Committing the change would disconnect an entry from every goal.
    WouldSeverPath,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "cell lies outside the grid"),
            Self::NotBuildable => write!(f, "cell does not accept structures"),
            Self::Reserved => write!(f, "cell is reserved for an entry or goal"),
            Self::WouldSeverPath => {
                write!(f, "change would cut an entry off from every goal")
            }
        }
    }
}

/// Reasons a structure removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No structure with the provided identifier exists.
    MissingStructure,
}

impl fmt::Display for RemovalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStructure => write!(f, "no such structure"),
        }
    }
}

/// Errors raised while building navigation data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// None of the supplied goals lies inside the grid on a passable tile.
    #[error("no valid goal cell among {supplied} supplied")]
    InvalidGoalSet {
        /// Number of goals supplied before filtering.
        supplied: usize,
    },
}
