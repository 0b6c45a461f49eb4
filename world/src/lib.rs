#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative navigation state management for tilenav.
//!
//! The [`World`] exclusively owns the tile [`Grid`], the [`DirectionField`]
//! built from the goal cells, and the [`PathCache`] derived from it. All
//! mutations flow through [`apply`]; every grid edit that could block
//! traffic is validated for entry-to-goal connectivity before it is
//! committed, then followed by a field rebuild and a targeted path refresh.
//! Everything else reads through the [`query`] module.

mod direction_field;
mod path_cache;
mod structures;

use tilenav_core::{
    CellCoord, Command, Event, Grid, NavigationError, PlacementError, RemovalError, StructureId,
    TileType,
};
use tilenav_system_pathfinder::all_connected;
use tracing::{debug, warn};

pub use direction_field::DirectionField;
pub use path_cache::{CachedPath, PathCache};
pub use structures::StructureState;

use structures::StructureRegistry;

/// Represents the authoritative navigation world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    field: DirectionField,
    paths: PathCache,
    entries: Vec<CellCoord>,
    goals: Vec<CellCoord>,
    structures: StructureRegistry,
    tick_index: u64,
}

impl World {
    /// Creates a world from a loaded grid and its entry and goal cells.
    ///
    /// Builds the direction field and caches one path per entry. Fails when
    /// no goal lies inside the grid on a passable tile.
    pub fn new(
        grid: Grid,
        entries: Vec<CellCoord>,
        goals: Vec<CellCoord>,
    ) -> Result<Self, NavigationError> {
        let mut field = DirectionField::new();
        field.build(&grid, &goals)?;

        let mut paths = PathCache::new();
        paths.rebuild_all(&entries, field.view());

        Ok(Self {
            grid,
            field,
            paths,
            entries,
            goals,
            structures: StructureRegistry::new(),
            tick_index: 0,
        })
    }

    fn is_reserved(&self, cell: CellCoord) -> bool {
        self.entries.contains(&cell) || self.goals.contains(&cell)
    }

    fn place_structure(&mut self, cell: CellCoord) -> Result<StructureId, PlacementError> {
        check_placement(&self.grid, cell, self.is_reserved(cell))?;

        let structure = self.structures.peek_id();
        let _ = commit_edit(
            &mut self.grid,
            cell,
            TileType::Occupied(structure),
            &self.entries,
            &self.goals,
        )?;
        Ok(self.structures.insert(cell))
    }

    fn remove_structure(&mut self, structure: StructureId) -> Result<CellCoord, RemovalError> {
        let state = self
            .structures
            .remove(structure)
            .ok_or(RemovalError::MissingStructure)?;
        let _ = self.grid.set(state.cell, TileType::BuildableFloor);
        Ok(state.cell)
    }

    fn set_tile(&mut self, cell: CellCoord, tile: TileType) -> Result<TileType, PlacementError> {
        let current = self.grid.tile(cell).ok_or(PlacementError::OutOfBounds)?;
        if self.is_reserved(cell) {
            return Err(PlacementError::Reserved);
        }
        if matches!(tile, TileType::Occupied(_)) || matches!(current, TileType::Occupied(_)) {
            return Err(PlacementError::NotBuildable);
        }

        commit_edit(&mut self.grid, cell, tile, &self.entries, &self.goals)
    }

    fn refresh_navigation(&mut self, changed: CellCoord, out_events: &mut Vec<Event>) {
        if let Err(error) = self.field.update(&self.grid, changed) {
            warn!(%changed, %error, "direction field rebuild failed; keeping previous field");
        }

        let refreshed_entries =
            self.paths
                .rebuild_affected(changed, &self.entries, &self.grid, self.field.view());
        out_events.push(Event::NavigationRebuilt {
            changed,
            refreshed_entries,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlaceStructure { cell } => match world.place_structure(cell) {
            Ok(structure) => {
                debug!(%cell, structure = structure.get(), "structure placed");
                out_events.push(Event::StructurePlaced { structure, cell });
                world.refresh_navigation(cell, out_events);
            }
            Err(reason) => {
                debug!(%cell, %reason, "structure placement rejected");
                out_events.push(Event::StructurePlacementRejected { cell, reason });
            }
        },
        Command::RemoveStructure { structure } => match world.remove_structure(structure) {
            Ok(cell) => {
                debug!(%cell, structure = structure.get(), "structure removed");
                out_events.push(Event::StructureRemoved { structure, cell });
                world.refresh_navigation(cell, out_events);
            }
            Err(reason) => {
                out_events.push(Event::StructureRemovalRejected { structure, reason });
            }
        },
        Command::SetTile { cell, tile } => match world.set_tile(cell, tile) {
            Ok(from) => {
                out_events.push(Event::TileChanged {
                    cell,
                    from,
                    to: tile,
                });
                world.refresh_navigation(cell, out_events);
            }
            Err(reason) => {
                debug!(%cell, %reason, "tile edit rejected");
                out_events.push(Event::TileChangeRejected { cell, reason });
            }
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{check_placement, commit_edit, CachedPath, DirectionField, PathCache, World};
    use tilenav_core::{
        CellCoord, DirectionFieldView, Grid, PlacementError, StructureId, TileType,
    };

    pub use super::StructureState;

    /// Provides read-only access to the world's tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides read-only access to the live direction field.
    #[must_use]
    pub fn direction_field(world: &World) -> &DirectionField {
        &world.field
    }

    /// Exposes a read-only view of the direction field's per-cell arrays.
    #[must_use]
    pub fn field_view(world: &World) -> DirectionFieldView<'_> {
        world.field.view()
    }

    /// Provides read-only access to the cached entry paths.
    #[must_use]
    pub fn path_cache(world: &World) -> &PathCache {
        &world.paths
    }

    /// Cached path for a single entry, if the cell is a declared entry.
    #[must_use]
    pub fn cached_path(world: &World, entry: CellCoord) -> Option<&CachedPath> {
        world.paths.iter().find(|path| path.entry() == entry)
    }

    /// Entry cells where agents are introduced.
    #[must_use]
    pub fn entries(world: &World) -> &[CellCoord] {
        &world.entries
    }

    /// Goal cells the direction field points toward.
    #[must_use]
    pub fn goals(world: &World) -> &[CellCoord] {
        &world.goals
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Structures currently standing, in identifier order.
    #[must_use]
    pub fn structures(world: &World) -> Vec<StructureState> {
        world.structures.iter().copied().collect()
    }

    /// Looks up a standing structure by identifier.
    #[must_use]
    pub fn structure(world: &World, structure: StructureId) -> Option<StructureState> {
        world.structures.get(structure).copied()
    }

    /// Identifier of the structure occupying the cell, if any.
    #[must_use]
    pub fn structure_at(world: &World, cell: CellCoord) -> Option<StructureId> {
        match world.grid.tile(cell)? {
            TileType::Occupied(structure) => Some(structure),
            _ => None,
        }
    }

    /// Reports whether a structure could be placed on the cell right now.
    ///
    /// Runs the same validation as a placement command against a scratch
    /// copy of the grid, so the world is never touched.
    pub fn placement_check(world: &World, cell: CellCoord) -> Result<(), PlacementError> {
        check_placement(&world.grid, cell, world.is_reserved(cell))?;

        let mut scratch = world.grid.clone();
        let _ = commit_edit(
            &mut scratch,
            cell,
            TileType::Occupied(world.structures.peek_id()),
            &world.entries,
            &world.goals,
        )?;
        Ok(())
    }
}

fn check_placement(grid: &Grid, cell: CellCoord, reserved: bool) -> Result<(), PlacementError> {
    let tile = grid.tile(cell).ok_or(PlacementError::OutOfBounds)?;
    if reserved {
        return Err(PlacementError::Reserved);
    }
    if !tile.buildable() {
        return Err(PlacementError::NotBuildable);
    }
    Ok(())
}

/// Writes `tile` into the grid and rolls the write back if it severs an entry.
fn commit_edit(
    grid: &mut Grid,
    cell: CellCoord,
    tile: TileType,
    entries: &[CellCoord],
    goals: &[CellCoord],
) -> Result<TileType, PlacementError> {
    let previous = grid.set(cell, tile).ok_or(PlacementError::OutOfBounds)?;
    if !tile.passable() && !all_connected(grid, entries, goals) {
        let _ = grid.set(cell, previous);
        return Err(PlacementError::WouldSeverPath);
    }
    Ok(previous)
}
