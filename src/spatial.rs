//! Uniform-grid spatial hashing for neighbor queries.
//!
//! Positions are bucketed by `floor(p / cell_size)`. A query returns every
//! entry in the 3x3 block of cells around a point, which is a superset of all
//! entries within `cell_size` of it. Callers still distance-check the results.

use std::collections::HashMap;

use glam::Vec2;

/// Integer cell coordinates.
pub type CellKey = (i32, i32);

/// Offsets of the 3x3 neighborhood, own cell included.
const NEIGHBOR_OFFSETS: [CellKey; 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Bucketed particle indices, rebuilt every frame.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    len: usize,
}

impl SpatialGrid {
    /// `cell_size` must be at least the largest query distance callers use.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_of(&self, position: Vec2) -> CellKey {
        let cell = (position / self.cell_size).floor();
        (cell.x as i32, cell.y as i32)
    }

    /// Empty every bucket. Bucket allocations are kept for the next frame.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.len = 0;
    }

    pub fn insert(&mut self, index: usize, position: Vec2) {
        let key = self.cell_of(position);
        self.cells.entry(key).or_default().push(index);
        self.len += 1;
    }

    /// Clear, then insert every position under its slice index.
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        self.clear();
        for (index, position) in positions.into_iter().enumerate() {
            self.insert(index, position);
        }
    }

    /// Indices in the 3x3 block of cells around `position`.
    pub fn nearby(&self, position: Vec2) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_of(position);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| {
                self.cells
                    .get(&(cx.wrapping_add(dx), cy.wrapping_add(dy)))
            })
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Number of entries inserted since the last clear.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(150.0)
    }
}
