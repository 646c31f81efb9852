// src/grammar/stock.rs

use crate::config::{BalconyPlacement, BuildingStyle, WallSelection};
use crate::error::{GenError, Result};
use crate::grammar::production::{emit_row, PendingStep, Production};
use crate::grammar::roof::RoofRule;
use crate::grammar::row::{PaletteRole, RowRule};
use crate::grammar::symbol::{Building, SymbolId};
use crate::utils::{QuarterTurns, Transform, Vec3};
use rand::Rng;

/// Wall indices in the order they are emitted.
pub const WALL_LEFT: usize = 0;
pub const WALL_BACK: usize = 1;
pub const WALL_RIGHT: usize = 2;
pub const WALL_FRONT: usize = 3;

/// One floor of a building: four walls, then either another floor or a roof.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRule {
    pub width: u32,
    pub depth: u32,
    pub height_index: u32,
    /// Only ever set on the ground floor.
    pub door_wall: Option<usize>,
}

impl StockRule {
    /// Prepares a floor. The door wall is drawn here, once, for floor 0.
    pub fn initialize<R: Rng + ?Sized>(
        width: u32,
        depth: u32,
        height_index: u32,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Self {
        let door_wall = if height_index == 0 && style.doors.is_some() {
            Some(rng.random_range(0..4))
        } else {
            None
        };
        StockRule { width, depth, height_index, door_wall }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.width == 0 || self.depth == 0 {
            return Err(GenError::geometry(format!(
                "stock footprint {}x{} at height {}",
                self.width, self.depth, self.height_index
            )));
        }
        Ok(())
    }

    /// Where wall `index` sits and which way it faces, relative to the floor centre.
    pub fn wall_transform(&self, index: usize) -> Transform {
        let half_w = (f64::from(self.width) - 1.0) * 0.5;
        let half_d = (f64::from(self.depth) - 1.0) * 0.5;
        let position = match index {
            WALL_LEFT => Vec3::new(-half_w, 0.0, 0.0),
            WALL_BACK => Vec3::new(0.0, 0.0, half_d),
            WALL_RIGHT => Vec3::new(half_w, 0.0, 0.0),
            _ => Vec3::new(0.0, 0.0, -half_d),
        };
        Transform::new(position, QuarterTurns::new(index as i32))
    }

    /// Back and front walls span the width, left and right the depth.
    pub fn wall_length(&self, index: usize) -> u32 {
        if index % 2 == 1 {
            self.width
        } else {
            self.depth
        }
    }

    fn balcony_wall<R: Rng + ?Sized>(&self, style: &BuildingStyle, rng: &mut R) -> Option<usize> {
        if self.height_index <= style.balcony_min_height || style.balconies.is_none() {
            return None;
        }
        if !rng.random_bool(style.balcony_chance) {
            return None;
        }
        match style.balcony_placement {
            BalconyPlacement::Front => Some(WALL_FRONT).filter(|w| Some(*w) != self.door_wall),
            BalconyPlacement::AnyFreeWall => {
                let free: Vec<usize> = (0..4).filter(|w| Some(*w) != self.door_wall).collect();
                Some(free[rng.random_range(0..free.len())])
            }
        }
    }

    pub(crate) fn produce<R: Rng + ?Sized>(
        self,
        symbol: SymbolId,
        building: &mut Building,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Result<Vec<PendingStep>> {
        let balcony_wall = self.balcony_wall(style, rng);

        for wall in 0..4 {
            let start = match style.wall_selection {
                WallSelection::Aligned => wall,
                WallSelection::Random => 0,
            };
            let mut row = RowRule::new(self.wall_length(wall), PaletteRole::Walls, style.wall_selection)
                .named("wall")
                .starting_at(start);
            if Some(wall) == self.door_wall {
                if let Some(doors) = &style.doors {
                    row = row.named("wallWithDoor").with_accent(Some(doors.choose(rng).clone()));
                }
            } else if Some(wall) == balcony_wall {
                if let Some(balconies) = &style.balconies {
                    row = row.named("wallWithBalcony").with_accent(Some(balconies.choose(rng).clone()));
                }
            }
            emit_row(symbol, self.wall_transform(wall), row, building, style, rng)?;
        }

        let next = self.height_index + 1;
        let up = Transform::from_position(Vec3::new(0.0, style.floor_height, 0.0));
        let forced = next < style.min_height;
        let production = if next < style.max_height
            && (forced || rng.random::<f64>() < style.stock_continue_chance)
        {
            Production::Stock(StockRule::initialize(self.width, self.depth, next, style, rng))
        } else {
            Production::Roof(RoofRule::start(self.width, self.depth, next))
        };
        Ok(vec![PendingStep::child(symbol, up, production)])
    }
}
