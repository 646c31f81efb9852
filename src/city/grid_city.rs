// src/city/grid_city.rs

use crate::bsp::{Plot, PlotKind};
use crate::config::LayoutConfig;
use crate::utils::Rect;
use rand::Rng;

/// Regular rows x columns of plots, each nudged by up to half a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCity {
    pub rows: u32,
    pub columns: u32,
    pub row_width: f64,
    pub column_width: f64,
}

impl GridCity {
    pub fn from_layout(layout: &LayoutConfig) -> Option<Self> {
        match *layout {
            LayoutConfig::Grid { rows, columns, row_width, column_width } => {
                Some(GridCity { rows, columns, row_width, column_width })
            }
            LayoutConfig::Bsp => None,
        }
    }

    /// Largest footprint, in units of `unit_size`, that fits one cell.
    pub fn fit(&self, unit_size: f64) -> u32 {
        (self.row_width.min(self.column_width) / unit_size).floor().max(0.0) as u32
    }

    /// One plot per cell, row by row. Plots are centred on the jittered cell origin.
    pub fn plots<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Plot> {
        let half_col = self.column_width * 0.5;
        let half_row = self.row_width * 0.5;
        let mut plots = Vec::with_capacity((self.rows as usize).saturating_mul(self.columns as usize));
        for row in 0..self.rows {
            for col in 0..self.columns {
                let offset_x = rng.random_range(-half_col..half_col);
                let offset_z = rng.random_range(-half_row..half_row);
                let cx = f64::from(col) * self.column_width + offset_x;
                let cz = f64::from(row) * self.row_width + offset_z;
                plots.push(Plot {
                    rect: Rect::new(cx - half_col, cz - half_row, self.column_width, self.row_width),
                    kind: PlotKind::Building,
                    cell: (i64::from(col), i64::from(row)),
                });
            }
        }
        plots
    }
}
