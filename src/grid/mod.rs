// src/grid/mod.rs
pub mod marching;
pub mod value_grid;

pub use marching::{classify, overlay, rotate_mask, CornerSet, MarchingTile, TileClass, MARCHING_TABLE};
pub use value_grid::{ValueGrid, MAX_GRID_CELLS};
