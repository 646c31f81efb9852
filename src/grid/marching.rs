// src/grid/marching.rs
//! Marching-squares corner tiles.
//!
//! Each square between four grid samples gets a 4-bit index (see
//! `ValueGrid::marching_index`: NE=8, NW=4, SE=2, SW=1). The index maps to one
//! of six tile classes plus the quarter turns that bring the class's canonical
//! tile onto the actual corner pattern.

use crate::config::{MarchingConfig, UnitId};
use crate::error::{GenError, Result};
use crate::grid::value_grid::{ValueGrid, CORNER_NE, CORNER_NW, CORNER_SE, CORNER_SW};
use crate::utils::{QuarterTurns, Vec3};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TileClass {
    Empty,
    /// Canonical: SW only.
    OneCorner,
    /// Canonical: SW and SE.
    TwoAdjacent,
    /// Canonical: SW and NE.
    TwoOpposite,
    /// Canonical: everything but NW.
    ThreeCorners,
    Full,
}

impl TileClass {
    pub const ALL: [TileClass; 6] = [
        TileClass::Empty,
        TileClass::OneCorner,
        TileClass::TwoAdjacent,
        TileClass::TwoOpposite,
        TileClass::ThreeCorners,
        TileClass::Full,
    ];

    /// Mask of the unrotated tile.
    pub fn canonical_mask(self) -> u8 {
        match self {
            TileClass::Empty => 0,
            TileClass::OneCorner => CORNER_SW,
            TileClass::TwoAdjacent => CORNER_SW | CORNER_SE,
            TileClass::TwoOpposite => CORNER_SW | CORNER_NE,
            TileClass::ThreeCorners => CORNER_SW | CORNER_SE | CORNER_NE,
            TileClass::Full => 15,
        }
    }

    fn slot(self) -> usize {
        match self {
            TileClass::Empty => 0,
            TileClass::OneCorner => 1,
            TileClass::TwoAdjacent => 2,
            TileClass::TwoOpposite => 3,
            TileClass::ThreeCorners => 4,
            TileClass::Full => 5,
        }
    }
}

/// Index -> (class, quarter turns).
pub const MARCHING_TABLE: [(TileClass, u8); 16] = [
    (TileClass::Empty, 0),
    (TileClass::OneCorner, 0),
    (TileClass::OneCorner, 3),
    (TileClass::TwoAdjacent, 0),
    (TileClass::OneCorner, 1),
    (TileClass::TwoAdjacent, 1),
    (TileClass::TwoOpposite, 1),
    (TileClass::ThreeCorners, 1),
    (TileClass::OneCorner, 2),
    (TileClass::TwoOpposite, 0),
    (TileClass::TwoAdjacent, 3),
    (TileClass::ThreeCorners, 0),
    (TileClass::TwoAdjacent, 2),
    (TileClass::ThreeCorners, 2),
    (TileClass::ThreeCorners, 3),
    (TileClass::Full, 0),
];

/// Corners in clockwise order seen from above; one quarter turn moves each
/// corner to the next slot.
const CLOCKWISE: [u8; 4] = [CORNER_SW, CORNER_NW, CORNER_NE, CORNER_SE];

/// Rotates a corner mask by whole quarter turns.
pub fn rotate_mask(mask: u8, turns: QuarterTurns) -> u8 {
    let shift = usize::from(turns.turns());
    CLOCKWISE
        .iter()
        .enumerate()
        .filter(|(_, bit)| mask & **bit != 0)
        .fold(0, |out, (k, _)| out | CLOCKWISE[(k + shift) % 4])
}

pub fn classify(mask: u8) -> (TileClass, QuarterTurns) {
    let (class, turns) = MARCHING_TABLE[usize::from(mask & 0x0f)];
    (class, QuarterTurns::new(i32::from(turns)))
}

/// Units for the six tile classes. `Empty` may be left unset.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerSet {
    units: [Option<UnitId>; 6],
    pub iso_level: f64,
}

impl CornerSet {
    pub fn from_config(config: &MarchingConfig) -> Result<Self> {
        let required = |name: &str, id: &str| -> Result<Option<UnitId>> {
            if id.trim().is_empty() {
                return Err(GenError::config(format!("marching squares: no unit for {}", name)));
            }
            Ok(Some(UnitId::new(id)))
        };
        let empty = match &config.empty {
            Some(id) if id.trim().is_empty() => {
                return Err(GenError::config("marching squares: empty unit id is blank"));
            }
            Some(id) => Some(UnitId::new(id.as_str())),
            None => None,
        };
        if !(0.0..=1.0).contains(&config.iso_level) {
            return Err(GenError::config(format!(
                "marching squares: iso level {} outside [0, 1]",
                config.iso_level
            )));
        }
        Ok(CornerSet {
            units: [
                empty,
                required("one corner", &config.one_corner)?,
                required("two adjacent corners", &config.two_adjacent)?,
                required("two opposite corners", &config.two_opposite)?,
                required("three corners", &config.three_corners)?,
                required("four corners", &config.full)?,
            ],
            iso_level: config.iso_level,
        })
    }

    pub fn unit_for(&self, class: TileClass) -> Option<&UnitId> {
        self.units[class.slot()].as_ref()
    }
}

/// One tile to place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarchingTile {
    pub i: i64,
    pub j: i64,
    pub mask: u8,
    pub class: TileClass,
    pub rotation: QuarterTurns,
    pub unit: UnitId,
    /// Centre of the square, in grid-local world units.
    pub position: Vec3,
}

/// Tiles for every square between samples. Classes without a unit are skipped.
pub fn overlay(grid: &ValueGrid, corners: &CornerSet) -> Vec<MarchingTile> {
    let mut tiles = Vec::new();
    for i in 0..grid.width().saturating_sub(1) as i64 {
        for j in 0..grid.depth().saturating_sub(1) as i64 {
            let mask = grid.marching_index(i, j, corners.iso_level);
            let (class, rotation) = classify(mask);
            if let Some(unit) = corners.unit_for(class) {
                tiles.push(MarchingTile {
                    i,
                    j,
                    mask,
                    class,
                    rotation,
                    unit: unit.clone(),
                    position: Vec3::new(i as f64 + 0.5, 0.0, j as f64 + 0.5) * grid.cell_size(),
                });
            }
        }
    }
    tiles
}
