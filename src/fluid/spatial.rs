//! Uniform grid for neighbor search.
//!
//! The grid covers the whole normalized `[-1, 1]` space with square cells whose
//! side equals the smoothing radius, so every particle that can influence another
//! lives in the 3×3 block of cells around it.
//!
//! Cell membership is a map from particle index to a presence flag. Moving a
//! particle flips two flags and never erases an entry; stale `false` entries
//! stay behind and queries skip them. Do not turn this into a removal-based
//! container: erasing on every move is the expensive part of a rebucket.

use std::collections::HashMap;

use bevy::prelude::*;

use super::params::{FluidParams, GRID_HALF_EXTENT};

/// Offsets of the 3×3 neighborhood, center included.
const NEIGHBOR_OFFSETS: [IVec2; 9] = [
    IVec2::new(-1, -1),
    IVec2::new(-1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, -1),
    IVec2::new(0, 0),
    IVec2::new(0, 1),
    IVec2::new(1, -1),
    IVec2::new(1, 0),
    IVec2::new(1, 1),
];

/// Flag-based spatial grid over the normalized domain.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    /// Side length of a cell. Equal to the smoothing radius.
    cell_size: f32,
    /// Number of cells per axis.
    resolution: usize,
    /// Row-major by x: `cells[x * resolution + y]`.
    cells: Vec<HashMap<usize, bool>>,
}

impl SpatialGrid {
    /// Create an empty grid with `resolution × resolution` cells.
    pub fn new(resolution: usize, cell_size: f32) -> Self {
        Self {
            cell_size,
            resolution,
            cells: vec![HashMap::new(); resolution * resolution],
        }
    }

    /// Create an empty grid sized for the given parameters.
    pub fn for_params(params: &FluidParams) -> Self {
        Self::new(params.grid_resolution(), params.cell_size())
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Grid cell holding `position`.
    ///
    /// # Panics
    ///
    /// Panics if the position is not finite or lies outside the grid. Callers
    /// keep particles inside the walls, so this only fires on a broken
    /// configuration.
    pub fn cell_of(&self, position: Vec2) -> UVec2 {
        if !position.is_finite() {
            panic!("position {position} is not finite and maps to no grid cell");
        }
        let cell = ((position + Vec2::splat(GRID_HALF_EXTENT)) / self.cell_size)
            .floor()
            .as_ivec2();
        match self.checked_cell(cell) {
            Some(cell) => cell,
            None => panic!(
                "position {position} maps to cell {cell}, outside the {n}x{n} grid",
                n = self.resolution
            ),
        }
    }

    /// Mark `index` as present in the cell holding `position`.
    pub fn insert(&mut self, index: usize, position: Vec2) {
        let cell = self.cell_of(position);
        self.cell_mut(cell).insert(index, true);
    }

    /// Move `index` from the cell holding `old_position` to the one holding
    /// `new_position`. `old_position` must be where the particle was bucketed
    /// before this step's displacement.
    pub fn move_particle(&mut self, index: usize, old_position: Vec2, new_position: Vec2) {
        let old_cell = self.cell_of(old_position);
        let new_cell = self.cell_of(new_position);
        self.cell_mut(old_cell).insert(index, false);
        self.cell_mut(new_cell).insert(index, true);
    }

    /// Indices of all particles flagged in the 3×3 block around `position`,
    /// except `exclude`. Order is unspecified.
    pub fn neighbors(&self, position: Vec2, exclude: usize) -> Vec<usize> {
        let center = self.cell_of(position).as_ivec2();
        let mut neighbors = Vec::new();

        for offset in NEIGHBOR_OFFSETS {
            let Some(cell) = self.checked_cell(center + offset) else {
                continue;
            };
            neighbors.extend(
                self.cell(cell)
                    .iter()
                    .filter(|&(&index, &present)| present && index != exclude)
                    .map(|(&index, _)| index),
            );
        }

        neighbors
    }

    /// Cells where `index` is currently flagged present. Exactly one for every
    /// particle that has been inserted.
    pub fn cells_containing(&self, index: usize) -> Vec<UVec2> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.get(&index).copied().unwrap_or(false))
            .map(|(flat, _)| {
                UVec2::new((flat / self.resolution) as u32, (flat % self.resolution) as u32)
            })
            .collect()
    }

    /// Number of map entries, stale ones included.
    pub fn entry_count(&self) -> usize {
        self.cells.iter().map(HashMap::len).sum()
    }

    fn checked_cell(&self, cell: IVec2) -> Option<UVec2> {
        let n = self.resolution as i32;
        (cell.x >= 0 && cell.y >= 0 && cell.x < n && cell.y < n).then(|| cell.as_uvec2())
    }

    fn cell(&self, cell: UVec2) -> &HashMap<usize, bool> {
        &self.cells[cell.x as usize * self.resolution + cell.y as usize]
    }

    fn cell_mut(&mut self, cell: UVec2) -> &mut HashMap<usize, bool> {
        &mut self.cells[cell.x as usize * self.resolution + cell.y as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SpatialGrid {
        SpatialGrid::new(40, 0.05)
    }

    #[test]
    fn test_cell_of() {
        let grid = grid();
        assert_eq!(grid.cell_of(Vec2::new(-1.0, -1.0)), UVec2::ZERO);
        assert_eq!(grid.cell_of(Vec2::new(0.01, 0.01)), UVec2::new(20, 20));
        assert_eq!(grid.cell_of(Vec2::new(0.89, -0.89)), UVec2::new(37, 2));
    }

    #[test]
    #[should_panic(expected = "outside the 40x40 grid")]
    fn test_cell_of_out_of_range_panics() {
        grid().cell_of(Vec2::new(1.2, 0.0));
    }

    #[test]
    #[should_panic(expected = "is not finite")]
    fn test_cell_of_nan_panics() {
        grid().cell_of(Vec2::new(f32::NAN, 0.0));
    }

    #[test]
    fn test_for_params_matches_smoothing_radius() {
        let grid = SpatialGrid::for_params(&FluidParams::default());
        assert_eq!(grid.resolution(), 40);
        assert_eq!(grid.cell_size(), 0.05);
    }

    #[test]
    fn test_neighbors_scan_three_by_three() {
        let mut grid = grid();
        grid.insert(0, Vec2::new(0.01, 0.01));
        grid.insert(1, Vec2::new(0.06, 0.01)); // one cell to the right
        grid.insert(2, Vec2::new(-0.04, -0.04)); // diagonal
        grid.insert(3, Vec2::new(0.12, 0.01)); // two cells away

        let mut found = grid.neighbors(Vec2::new(0.01, 0.01), 0);
        found.sort_unstable();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn test_neighbors_clip_at_grid_edge() {
        let mut grid = grid();
        grid.insert(0, Vec2::new(-0.99, -0.99));
        grid.insert(1, Vec2::new(-0.97, -0.96));
        assert_eq!(grid.neighbors(Vec2::new(-0.99, -0.99), 0), vec![1]);
    }

    #[test]
    fn test_move_flips_flags_without_erasing() {
        let mut grid = grid();
        let a = Vec2::new(0.01, 0.01);
        let b = Vec2::new(0.3, 0.3);
        grid.insert(5, a);
        grid.move_particle(5, a, b);

        assert_eq!(grid.cells_containing(5), vec![grid.cell_of(b)]);
        assert_eq!(grid.entry_count(), 2);
        assert!(grid.neighbors(a, usize::MAX).is_empty());
        assert_eq!(grid.neighbors(b, usize::MAX), vec![5]);

        // Moving back reuses the stale entry.
        grid.move_particle(5, b, a);
        assert_eq!(grid.cells_containing(5), vec![grid.cell_of(a)]);
        assert_eq!(grid.entry_count(), 2);
    }

    #[test]
    fn test_move_within_same_cell() {
        let mut grid = grid();
        let a = Vec2::new(0.01, 0.01);
        let b = Vec2::new(0.02, 0.02);
        grid.insert(3, a);
        grid.move_particle(3, a, b);
        assert_eq!(grid.cells_containing(3), vec![grid.cell_of(b)]);
    }
}
