// src/config/mod.rs
//! Generator configuration.
//!
//! Everything here is plain serde data with defaults matching the classic
//! demo scenes. `validate()` turns it into the checked form the generator
//! runs on; nothing downstream re-validates.

mod style;

pub use style::{
    BalconyPlacement, BuildingConfig, BuildingStyle, Palette, RoofStyle, StyleConfig, UnitId,
    WallSelection,
};

use crate::error::{GenError, Result};
use crate::grid::marching::CornerSet;
use crate::grid::MAX_GRID_CELLS;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

/// How the city extent is cut into plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutConfig {
    /// Recursive binary split with road corridors.
    Bsp,
    /// Regular rows x columns with per-plot jitter.
    Grid {
        rows: u32,
        columns: u32,
        row_width: f64,
        column_width: f64,
    },
}

/// Where the grammar's random draws come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngMode {
    /// One stream for the whole pass, drawn in a fixed order.
    Shared,
    /// One stream per plot, seeded from the plot coordinates. Allows parallel population.
    PerPlot,
}

/// Unit ids for the six marching-squares corner classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarchingConfig {
    /// Usually nothing is placed where no corner is occupied.
    pub empty: Option<String>,
    pub one_corner: String,
    pub two_adjacent: String,
    pub two_opposite: String,
    pub three_corners: String,
    pub full: String,
    /// Sample values at or above this count as occupied.
    pub iso_level: f64,
}

impl Default for MarchingConfig {
    fn default() -> Self {
        MarchingConfig {
            empty: None,
            one_corner: "block_corner_outer".into(),
            two_adjacent: "block_edge".into(),
            two_opposite: "block_diagonal".into(),
            three_corners: "block_corner_inner".into(),
            full: "block_fill".into(),
            iso_level: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    pub width: f64,
    pub depth: f64,
    pub layout: LayoutConfig,
    /// Recursion limit of the partitioner.
    pub partition_depth: u32,
    /// No partition leaf is cut below this size along either axis.
    pub min_cell_size: f64,
    /// Size of one building plot inside a leaf.
    pub cell_size: f64,
    pub min_road_width: f64,
    pub max_road_width: f64,
    /// Side of the centred central zone as a fraction of the extent. 0 disables it.
    pub central_zone_fraction: f64,
    /// Centred no-build area of the value grid, in cells.
    pub no_build_zone: Option<(u32, u32)>,
    pub noise_scale: f64,
    /// Value-grid samples at or above this are no-build.
    pub no_build_threshold: f64,
    /// Delay between a Stock/Roof step and the step it schedules.
    pub build_delay_ms: u64,
    pub rng_mode: RngMode,
    /// Root unit placed for every building plot; grammar output is parented to it.
    pub building_units: Vec<String>,
    /// World size of one grammar module (one wall unit).
    pub unit_size: f64,
    pub marching: Option<MarchingConfig>,
}

impl Default for CityConfig {
    fn default() -> Self {
        CityConfig {
            width: 100.0,
            depth: 100.0,
            layout: LayoutConfig::Bsp,
            partition_depth: 4,
            min_cell_size: 10.0,
            cell_size: 8.0,
            min_road_width: 2.0,
            max_road_width: 4.0,
            central_zone_fraction: 0.4,
            no_build_zone: Some((2, 2)),
            noise_scale: 0.1,
            no_build_threshold: 1.0,
            build_delay_ms: 0,
            rng_mode: RngMode::Shared,
            building_units: vec!["building_root".into()],
            unit_size: 1.0,
            marching: None,
        }
    }
}

impl CityConfig {
    pub fn build_delay(&self) -> Duration {
        Duration::from_millis(self.build_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.depth > 0.0) {
            return Err(GenError::config(format!(
                "city extent must be positive, got {}x{}",
                self.width, self.depth
            )));
        }
        if !(self.min_cell_size > 0.0 && self.cell_size > 0.0 && self.unit_size > 0.0) {
            return Err(GenError::config("cell sizes and unit_size must be positive"));
        }
        if self.min_road_width < 0.0 || self.min_road_width > self.max_road_width {
            return Err(GenError::config(format!(
                "road width range {}..{} is invalid",
                self.min_road_width, self.max_road_width
            )));
        }
        if !(0.0..=1.0).contains(&self.central_zone_fraction) {
            return Err(GenError::config("central_zone_fraction must be in [0, 1]"));
        }
        if !(self.noise_scale > 0.0) {
            return Err(GenError::config("noise_scale must be positive"));
        }
        match &self.layout {
            LayoutConfig::Grid { rows, columns, row_width, column_width } => {
                if *rows == 0 || *columns == 0 || !(*row_width > 0.0 && *column_width > 0.0) {
                    return Err(GenError::config("grid layout needs positive rows, columns and widths"));
                }
                if u64::from(*rows) * u64::from(*columns) > MAX_GRID_CELLS as u64 {
                    return Err(GenError::config(format!(
                        "grid layout {}x{} exceeds {} plots",
                        rows, columns, MAX_GRID_CELLS
                    )));
                }
            }
            LayoutConfig::Bsp => {
                let cells = (self.width / self.cell_size).ceil() * (self.depth / self.cell_size).ceil();
                if !(cells <= MAX_GRID_CELLS as f64) {
                    return Err(GenError::config(format!(
                        "extent {}x{} at cell size {} exceeds {} cells",
                        self.width, self.depth, self.cell_size, MAX_GRID_CELLS
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Top-level configuration for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub city: CityConfig,
    /// Grammar for ordinary building plots.
    pub residential: BuildingConfig,
    /// Grammar for plots inside the central zone.
    pub central: BuildingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            seed: 42,
            city: CityConfig::default(),
            residential: BuildingConfig::default(),
            central: BuildingConfig {
                min_height: 4,
                max_height: 12,
                stock_continue_chance: 0.7,
                balcony_chance: 0.0,
                doors: false,
                wall_selection: WallSelection::Aligned,
                roof_style: RoofStyle::Skyscraper,
                roof_resumes_stock: false,
                ..BuildingConfig::default()
            },
        }
    }
}

/// Checked configuration. Only obtainable through `GeneratorConfig::validate`.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub seed: u64,
    pub city: CityConfig,
    pub residential: BuildingStyle,
    pub central: BuildingStyle,
    pub building_units: Palette,
    pub corners: Option<CornerSet>,
}

impl GeneratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates everything up front so a bad palette never reaches mid-tree.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        self.city.validate()?;
        let residential = self.residential.validate()?;
        let central = self.central.validate()?;
        let building_units = Palette::new("building", &self.city.building_units)?;
        let corners = match &self.city.marching {
            Some(marching) => Some(CornerSet::from_config(marching)?),
            None => None,
        };
        Ok(ValidatedConfig {
            seed: self.seed,
            city: self.city.clone(),
            residential,
            central,
            building_units,
            corners,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let validated = GeneratorConfig::default().validate().unwrap();
        assert_eq!(validated.seed, 42);
        assert!(validated.central.doors.is_none());
        assert!(validated.corners.is_none());
    }

    #[test]
    fn test_zero_extent_rejected() {
        let mut config = GeneratorConfig::default();
        config.city.width = 0.0;
        assert!(matches!(config.validate(), Err(GenError::Configuration(_))));
    }

    #[test]
    fn test_oversized_extent_rejected() {
        let mut config = GeneratorConfig::default();
        config.city.width = 1e10;
        config.city.depth = 1e10;
        assert!(matches!(config.validate(), Err(GenError::Configuration(_))));

        config.city.width = f64::INFINITY;
        config.city.depth = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_grid_layout_rejected() {
        let mut config = GeneratorConfig::default();
        config.city.layout = LayoutConfig::Grid {
            rows: u32::MAX,
            columns: u32::MAX,
            row_width: 1.0,
            column_width: 1.0,
        };
        assert!(matches!(config.validate(), Err(GenError::Configuration(_))));
    }

    #[test]
    fn test_inverted_road_widths_rejected() {
        let mut config = GeneratorConfig::default();
        config.city.min_road_width = 5.0;
        config.city.max_road_width = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grid_layout_from_json() {
        let json = r#"{
            "seed": 7,
            "city": {
                "layout": { "kind": "grid", "rows": 3, "columns": 4, "row_width": 10.0, "column_width": 12.0 },
                "rng_mode": "per_plot"
            },
            "residential": { "roof_style": "skyscraper", "wall_selection": "aligned" }
        }"#;
        let config = GeneratorConfig::from_json_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.city.rng_mode, RngMode::PerPlot);
        assert!(matches!(config.city.layout, LayoutConfig::Grid { rows: 3, columns: 4, .. }));
        assert_eq!(config.residential.roof_style, RoofStyle::Skyscraper);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_keeps_defaults() {
        let config = GeneratorConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GeneratorConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            GeneratorConfig::from_json_str("{ seed: }"),
            Err(GenError::Parse(_))
        ));
    }

    #[test]
    fn test_marching_overlay_requires_units() {
        let mut config = GeneratorConfig::default();
        config.city.marching = Some(MarchingConfig {
            full: String::new(),
            ..MarchingConfig::default()
        });
        assert!(config.validate().is_err());
    }
}
