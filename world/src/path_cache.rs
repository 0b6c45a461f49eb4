//! Representative entry-to-goal paths derived from the direction field.

use tilenav_core::{CellCoord, CornerCutting, Direction, DirectionFieldView, Grid};
use tracing::debug;

/// Cached walk of the direction field starting at one entry cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedPath {
    entry: CellCoord,
    cells: Vec<CellCoord>,
}

impl CachedPath {
    fn walk(entry: CellCoord, field: &DirectionFieldView<'_>) -> Self {
        let bound = field.directions().len();
        Self {
            entry,
            cells: field.path_of(entry, bound).unwrap_or_default(),
        }
    }

    /// Entry cell the path starts from.
    #[must_use]
    pub const fn entry(&self) -> CellCoord {
        self.entry
    }

    /// Cells visited from the entry to the terminal cell, inclusive.
    ///
    /// Empty when the entry itself is impassable.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Reports whether the walk passes through the cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    /// Reports whether editing `changed` can alter or invalidate the walk.
    ///
    /// Besides the cells on the walk, under [`CornerCutting::Forbid`] this
    /// includes the two side cells of every diagonal step, since blocking
    /// either one makes the step illegal.
    #[must_use]
    pub fn depends_on(&self, changed: CellCoord, corner_cutting: CornerCutting) -> bool {
        if self.contains(changed) {
            return true;
        }
        if corner_cutting == CornerCutting::Allow {
            return false;
        }

        self.cells.windows(2).any(|step| {
            Direction::between(step[0], step[1])
                .and_then(Direction::components)
                .is_some_and(|(vertical, horizontal)| {
                    step[0].offset(vertical) == Some(changed)
                        || step[0].offset(horizontal) == Some(changed)
                })
        })
    }
}

/// Ordered set of cached paths, one per declared entry cell.
#[derive(Clone, Debug, Default)]
pub struct PathCache {
    paths: Vec<CachedPath>,
}

impl PathCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the path of every entry.
    pub fn rebuild_all(&mut self, entries: &[CellCoord], field: DirectionFieldView<'_>) {
        self.paths.clear();
        self.paths
            .extend(entries.iter().map(|entry| CachedPath::walk(*entry, &field)));
        debug!(entries = self.paths.len(), "path cache rebuilt");
    }

    /// Recomputes only the paths that depend on `changed`.
    ///
    /// A path depends on a cell it passes through and, when the grid forbids
    /// corner cutting, on the side cells of its diagonal steps. Falls back to
    /// [`PathCache::rebuild_all`] when `entries` no longer matches the cached
    /// entry list. Returns the entries whose paths were recomputed.
    pub fn rebuild_affected(
        &mut self,
        changed: CellCoord,
        entries: &[CellCoord],
        grid: &Grid,
        field: DirectionFieldView<'_>,
    ) -> Vec<CellCoord> {
        let matches_entries = self.paths.len() == entries.len()
            && self
                .paths
                .iter()
                .zip(entries)
                .all(|(path, entry)| path.entry == *entry);
        if !matches_entries {
            self.rebuild_all(entries, field);
            return entries.to_vec();
        }

        let mut refreshed = Vec::new();
        for path in &mut self.paths {
            if path.depends_on(changed, grid.corner_cutting()) {
                *path = CachedPath::walk(path.entry, &field);
                refreshed.push(path.entry);
            }
        }

        debug!(%changed, refreshed = refreshed.len(), "path cache refreshed");
        refreshed
    }

    /// Cached cells for the entry, if it is part of the cache.
    #[must_use]
    pub fn path_for(&self, entry: CellCoord) -> Option<&[CellCoord]> {
        self.paths
            .iter()
            .find(|path| path.entry == entry)
            .map(CachedPath::cells)
    }

    /// Iterator over the cached paths in entry order.
    pub fn iter(&self) -> impl Iterator<Item = &CachedPath> {
        self.paths.iter()
    }

    /// Number of cached paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Reports whether the cache holds no paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
