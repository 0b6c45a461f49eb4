//! Authoritative structure state management utilities.

use std::collections::BTreeMap;

use tilenav_core::{CellCoord, StructureId};

/// Snapshot of a structure stored inside the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureState {
    /// Identifier allocated by the world for the structure.
    pub id: StructureId,
    /// Cell occupied by the structure.
    pub cell: CellCoord,
}

/// Registry that stores structures and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct StructureRegistry {
    entries: BTreeMap<StructureId, StructureState>,
    next_structure_id: StructureId,
}

impl StructureRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_structure_id: StructureId::new(0),
        }
    }

    /// Reserves the next identifier without recording a structure.
    pub(crate) fn peek_id(&self) -> StructureId {
        self.next_structure_id
    }

    /// Records a structure under the next identifier and advances the counter.
    pub(crate) fn insert(&mut self, cell: CellCoord) -> StructureId {
        let id = self.next_structure_id;
        self.next_structure_id = StructureId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, StructureState { id, cell });
        id
    }

    pub(crate) fn remove(&mut self, id: StructureId) -> Option<StructureState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: StructureId) -> Option<&StructureState> {
        self.entries.get(&id)
    }

    /// Structures in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &StructureState> {
        self.entries.values()
    }
}
