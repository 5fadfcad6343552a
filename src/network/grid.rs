use crate::network::state::SegmentId;
use glam::Vec3;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Edge length of a square cell in world units.
    pub cell_size: f32,
    /// Distance between two footprint samples along a segment's midline.
    pub sample_spacing: f32,
    /// How many of the most recently committed segments a candidate may overlap with, so that
    /// consecutive pieces can touch at their seam.
    pub seam_tolerance: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            sample_spacing: 1.0,
            seam_tolerance: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: i32,
    pub z: i32,
}

impl GridCell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// Sparse occupancy map over the XZ plane. Every claimed cell knows the segments claiming it, a cell
/// is occupied as long as at least one of them is still active.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cell_size: f32,
    cells: HashMap<GridCell, Vec<SegmentId>>,
}

impl OccupancyGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Rounds half up, so -0.5 maps to 0 and 0.5 maps to 1.
    #[inline]
    pub fn cell_at(&self, point: Vec3) -> GridCell {
        GridCell {
            x: (point.x / self.cell_size + 0.5).floor() as i32,
            z: (point.z / self.cell_size + 0.5).floor() as i32,
        }
    }

    pub fn claim(&mut self, cell: GridCell, owner: SegmentId) {
        let owners = self.cells.entry(cell).or_default();
        if !owners.contains(&owner) {
            owners.push(owner);
        }
    }

    pub fn claim_all(&mut self, cells: &[GridCell], owner: SegmentId) {
        for cell in cells {
            self.claim(*cell, owner);
        }
    }

    pub fn release(&mut self, cell: GridCell, owner: SegmentId) {
        if let Some(owners) = self.cells.get_mut(&cell) {
            owners.retain(|id| *id != owner);
            if owners.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    pub fn release_all(&mut self, cells: &[GridCell], owner: SegmentId) {
        for cell in cells {
            self.release(*cell, owner);
        }
    }

    #[inline]
    pub fn is_occupied(&self, cell: GridCell) -> bool {
        self.cells.contains_key(&cell)
    }

    pub fn owners(&self, cell: GridCell) -> &[SegmentId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
