// src/grid/value_grid.rs
//! Scalar field over the city floor.
//!
//! Cell `(i, j)` covers `[i, i + 1) x [j, j + 1)` times `cell_size`, with `i`
//! running east along x and `j` north along z. Values are noise in `[0, 1]`
//! or a plain 0/1 occupancy map.

use crate::error::{GenError, Result};
use crate::utils::util::clamp;
use crate::utils::Vec3;
use noise::{NoiseFn, Perlin};
use rand::Rng;

/// Corner bits of a marching-squares index: NE=8, NW=4, SE=2, SW=1.
pub const CORNER_SW: u8 = 1;
pub const CORNER_SE: u8 = 2;
pub const CORNER_NW: u8 = 4;
pub const CORNER_NE: u8 = 8;

/// Value written into the no-build zone.
pub const NO_BUILD_VALUE: f64 = 1.0;

/// Largest grid the generator will allocate.
pub const MAX_GRID_CELLS: usize = 1 << 22;

#[derive(Debug, Clone, PartialEq)]
pub struct ValueGrid {
    width: usize,
    depth: usize,
    cell_size: f64,
    values: Vec<f64>,
}

impl ValueGrid {
    /// A zero-filled grid.
    pub fn new(width: usize, depth: usize, cell_size: f64) -> Result<Self> {
        if width == 0 || depth == 0 {
            return Err(GenError::config(format!("value grid {}x{} has no cells", width, depth)));
        }
        if !(cell_size > 0.0) {
            return Err(GenError::config(format!("value grid cell size {} must be positive", cell_size)));
        }
        let cells = width
            .checked_mul(depth)
            .filter(|n| *n <= MAX_GRID_CELLS)
            .ok_or_else(|| {
                GenError::config(format!(
                    "value grid {}x{} exceeds {} cells",
                    width, depth, MAX_GRID_CELLS
                ))
            })?;
        Ok(ValueGrid { width, depth, cell_size, values: vec![0.0; cells] })
    }

    /// Perlin noise sampled at `scale` per cell, with a random seed and offset,
    /// remapped to `[0, 1]`.
    pub fn with_noise<R: Rng + ?Sized>(
        width: usize,
        depth: usize,
        cell_size: f64,
        scale: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let mut grid = Self::new(width, depth, cell_size)?;
        let perlin = Perlin::new(rng.random::<u32>());
        let x_offset = rng.random::<f64>();
        let z_offset = rng.random::<f64>();
        for i in 0..width {
            for j in 0..depth {
                let p = perlin.get([i as f64 * scale + x_offset, j as f64 * scale + z_offset]);
                grid.values[i * depth + j] = clamp((p + 1.0) * 0.5, 0.0, 1.0);
            }
        }
        Ok(grid)
    }

    /// Marks a centred `zone_width x zone_depth` block as no-build.
    pub fn set_no_build_zone(&mut self, zone_width: usize, zone_depth: usize) {
        let zone_width = zone_width.min(self.width);
        let zone_depth = zone_depth.min(self.depth);
        let start_i = (self.width - zone_width) / 2;
        let start_j = (self.depth - zone_depth) / 2;
        for i in start_i..start_i + zone_width {
            for j in start_j..start_j + zone_depth {
                self.values[i * self.depth + j] = NO_BUILD_VALUE;
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing a position on the grid's floor, if it is inside the grid.
    pub fn get_row_col(&self, position: Vec3) -> Option<(i64, i64)> {
        let i = (position.x / self.cell_size).floor() as i64;
        let j = (position.z / self.cell_size).floor() as i64;
        self.in_range(i, j).then_some((i, j))
    }

    pub fn in_range(&self, i: i64, j: i64) -> bool {
        i >= 0 && j >= 0 && (i as usize) < self.width && (j as usize) < self.depth
    }

    /// 0 outside the grid.
    pub fn get_cell(&self, i: i64, j: i64) -> f64 {
        if self.in_range(i, j) {
            self.values[i as usize * self.depth + j as usize]
        } else {
            0.0
        }
    }

    /// Ignored outside the grid.
    pub fn set_cell(&mut self, i: i64, j: i64, value: f64) {
        if self.in_range(i, j) {
            self.values[i as usize * self.depth + j as usize] = value;
        }
    }

    /// Value of the cell under a world position, 0 off the grid.
    pub fn sample(&self, position: Vec3) -> f64 {
        self.get_row_col(position)
            .map_or(0.0, |(i, j)| self.get_cell(i, j))
    }

    pub fn is_occupied(&self, i: i64, j: i64, iso_level: f64) -> bool {
        self.get_cell(i, j) >= iso_level
    }

    /// Bitmask of the occupied corners of the square whose south-west sample is `(i, j)`.
    pub fn marching_index(&self, i: i64, j: i64, iso_level: f64) -> u8 {
        let corners = [
            (i, j, CORNER_SW),
            (i + 1, j, CORNER_SE),
            (i, j + 1, CORNER_NW),
            (i + 1, j + 1, CORNER_NE),
        ];
        corners
            .iter()
            .filter(|(ci, cj, _)| self.is_occupied(*ci, *cj, iso_level))
            .fold(0, |mask, (_, _, bit)| mask | bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_noise_is_normalised_and_seeded() {
        let a = ValueGrid::with_noise(12, 9, 1.0, 0.1, &mut ChaCha8Rng::seed_from_u64(4)).unwrap();
        let b = ValueGrid::with_noise(12, 9, 1.0, 0.1, &mut ChaCha8Rng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
        for i in 0..12 {
            for j in 0..9 {
                let v = a.get_cell(i, j);
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_no_build_zone_is_centred() {
        let mut grid = ValueGrid::new(10, 10, 1.0).unwrap();
        grid.set_no_build_zone(4, 4);
        assert_eq!(grid.get_cell(3, 3), NO_BUILD_VALUE);
        assert_eq!(grid.get_cell(6, 6), NO_BUILD_VALUE);
        assert_eq!(grid.get_cell(2, 3), 0.0);
        assert_eq!(grid.get_cell(7, 6), 0.0);
    }

    #[test]
    fn test_oversized_zone_is_clipped() {
        let mut grid = ValueGrid::new(3, 2, 1.0).unwrap();
        grid.set_no_build_zone(8, 8);
        assert_eq!(grid.get_cell(2, 1), NO_BUILD_VALUE);
    }

    #[test]
    fn test_row_col_lookup() {
        let grid = ValueGrid::new(5, 4, 2.0).unwrap();
        assert_eq!(grid.get_row_col(Vec3::new(3.0, 7.0, 7.9)), Some((1, 3)));
        assert_eq!(grid.get_row_col(Vec3::new(10.0, 0.0, 1.0)), None);
        assert_eq!(grid.get_row_col(Vec3::new(-0.5, 0.0, 1.0)), None);
    }

    #[test]
    fn test_out_of_range_reads_zero_and_writes_nothing() {
        let mut grid = ValueGrid::new(2, 2, 1.0).unwrap();
        grid.set_cell(5, 0, 1.0);
        grid.set_cell(-1, 0, 1.0);
        assert_eq!(grid.get_cell(5, 0), 0.0);
        assert!(!grid.in_range(2, 0));
        assert!(grid.in_range(1, 1));
    }

    #[test]
    fn test_marching_index_extremes() {
        let mut grid = ValueGrid::new(2, 2, 1.0).unwrap();
        assert_eq!(grid.marching_index(0, 0, 0.5), 0);
        for (i, j) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            grid.set_cell(i, j, 1.0);
        }
        assert_eq!(grid.marching_index(0, 0, 0.5), 15);
    }

    #[test]
    fn test_marching_index_bits() {
        let mut grid = ValueGrid::new(2, 2, 1.0).unwrap();
        grid.set_cell(1, 0, 1.0);
        assert_eq!(grid.marching_index(0, 0, 0.5), CORNER_SE);
        grid.set_cell(0, 1, 1.0);
        assert_eq!(grid.marching_index(0, 0, 0.5), CORNER_SE | CORNER_NW);
    }

    #[test]
    fn test_oversized_grid_is_configuration_error() {
        assert!(matches!(
            ValueGrid::new(usize::MAX, 2, 1.0),
            Err(GenError::Configuration(_))
        ));
        assert!(ValueGrid::new(MAX_GRID_CELLS + 1, 1, 1.0).is_err());
        assert!(ValueGrid::new(MAX_GRID_CELLS, 1, 1.0).is_ok());
    }

    #[test]
    fn test_empty_grid_is_configuration_error() {
        assert!(ValueGrid::new(0, 4, 1.0).is_err());
        assert!(ValueGrid::new(4, 4, 0.0).is_err());
    }
}
