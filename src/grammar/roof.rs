// src/grammar/roof.rs

use crate::config::{BuildingStyle, RoofStyle, WallSelection};
use crate::error::{GenError, Result};
use crate::grammar::production::{emit_row, PendingStep, Production};
use crate::grammar::row::{PaletteRole, RowRule};
use crate::grammar::stock::StockRule;
use crate::grammar::symbol::{Building, SymbolId};
use crate::utils::{Transform, Vec3};
use rand::Rng;

/// Which edges a stepped roof strips off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoofAxis {
    /// Strips on the left and right edges; the width shrinks.
    Width,
    /// Strips on the front and back edges; the depth shrinks.
    Depth,
}

/// A roof step. `axis` is drawn when the roof chain starts and inherited by
/// every continuing step.
#[derive(Debug, Clone, PartialEq)]
pub struct RoofRule {
    pub width: u32,
    pub depth: u32,
    pub height_index: u32,
    pub axis: Option<RoofAxis>,
}

impl RoofRule {
    pub fn start(width: u32, depth: u32, height_index: u32) -> Self {
        RoofRule { width, depth, height_index, axis: None }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.width == 0 || self.depth == 0 {
            return Err(GenError::geometry(format!(
                "roof footprint {}x{} at height {}",
                self.width, self.depth, self.height_index
            )));
        }
        Ok(())
    }

    pub(crate) fn produce<R: Rng + ?Sized>(
        self,
        symbol: SymbolId,
        building: &mut Building,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Result<Vec<PendingStep>> {
        match style.roof_style {
            RoofStyle::Skyscraper => {
                self.skyscraper_cap(symbol, building, style, rng)?;
                Ok(Vec::new())
            }
            RoofStyle::Stepped => self.stepped(symbol, building, style, rng),
        }
    }

    fn strip(&self, count: u32, direction: Vec3, style: &BuildingStyle) -> RowRule {
        let start = match style.wall_selection {
            WallSelection::Aligned => self.height_index as usize,
            WallSelection::Random => 0,
        };
        RowRule::new(count, PaletteRole::Roofs, style.wall_selection)
            .named("roofStrip")
            .starting_at(start)
            .along(direction)
    }

    /// One strip as long as the longer side, and nothing after it.
    fn skyscraper_cap<R: Rng + ?Sized>(
        &self,
        symbol: SymbolId,
        building: &mut Building,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Result<()> {
        let row = self.strip(self.width.max(self.depth), Vec3::Z, style).named("skyscraperCap");
        emit_row(symbol, Transform::IDENTITY, row, building, style, rng)
    }

    fn stepped<R: Rng + ?Sized>(
        self,
        symbol: SymbolId,
        building: &mut Building,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Result<Vec<PendingStep>> {
        let axis = match self.axis {
            Some(axis) => axis,
            None if rng.random_range(0..2) == 0 => RoofAxis::Width,
            None => RoofAxis::Depth,
        };

        let (extent, count, direction) = match axis {
            RoofAxis::Width => (self.width, self.depth, Vec3::Z),
            RoofAxis::Depth => (self.depth, self.width, Vec3::X),
        };
        let half = (f64::from(extent) - 1.0) * 0.5;
        let edges = if extent == 1 { vec![0.0] } else { vec![-half, half] };
        for edge in edges {
            let position = match axis {
                RoofAxis::Width => Vec3::new(edge, 0.0, 0.0),
                RoofAxis::Depth => Vec3::new(0.0, 0.0, edge),
            };
            let row = self.strip(count, direction, style);
            emit_row(symbol, Transform::from_position(position), row, building, style, rng)?;
        }

        let (new_width, new_depth) = match axis {
            RoofAxis::Width => (self.width.saturating_sub(2), self.depth),
            RoofAxis::Depth => (self.width, self.depth.saturating_sub(2)),
        };
        if new_width == 0 || new_depth == 0 {
            return Ok(Vec::new());
        }

        let h = self.height_index;
        if h > style.balcony_min_height
            && style.balconies.is_some()
            && rng.random_bool(style.balcony_chance)
        {
            let row = RowRule::new(new_width, PaletteRole::Balconies, WallSelection::Random)
                .named("balcony")
                .along(Vec3::X);
            emit_row(symbol, Transform::IDENTITY, row, building, style, rng)?;
            return Ok(Vec::new());
        }

        if rng.random::<f64>() < style.roof_continue_chance {
            let next = RoofRule { width: new_width, depth: new_depth, height_index: h, axis: Some(axis) };
            return Ok(vec![PendingStep::child(symbol, Transform::IDENTITY, Production::Roof(next))]);
        }

        if style.roof_resumes_stock && h < style.max_height {
            let stock = StockRule::initialize(new_width, new_depth, h, style, rng);
            return Ok(vec![PendingStep::child(symbol, Transform::IDENTITY, Production::Stock(stock))]);
        }

        self.flat_cap(symbol, new_width, new_depth, building, style, rng)?;
        Ok(Vec::new())
    }

    /// Closes the residual footprint: one roof row per remaining line along z.
    fn flat_cap<R: Rng + ?Sized>(
        &self,
        symbol: SymbolId,
        width: u32,
        depth: u32,
        building: &mut Building,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Result<()> {
        for i in 0..width {
            let x = f64::from(i) - (f64::from(width) - 1.0) * 0.5;
            let row = self.strip(depth, Vec3::Z, style).named("roofCap");
            emit_row(symbol, Transform::from_position(Vec3::new(x, 0.0, 0.0)), row, building, style, rng)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildingConfig;
    use crate::grammar::symbol::SymbolKind;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn run_roof(rule: RoofRule, config: BuildingConfig, seed: u64) -> (Building, Vec<PendingStep>) {
        let style = config.validate().unwrap();
        let mut building = Building::new(Transform::IDENTITY);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let next = Production::Roof(rule)
            .execute(None, Transform::IDENTITY, &mut building, &style, &mut rng)
            .unwrap();
        (building, next)
    }

    fn strips(building: &Building) -> Vec<&crate::grammar::symbol::Symbol> {
        building.symbols().iter().filter(|s| s.name == "roofStrip").collect()
    }

    #[test]
    fn test_width_axis_strips_sit_on_side_edges() {
        let rule = RoofRule { width: 4, depth: 3, height_index: 1, axis: Some(RoofAxis::Width) };
        let config = BuildingConfig { roof_continue_chance: 1.0, balcony_chance: 0.0, ..BuildingConfig::default() };
        let (building, next) = run_roof(rule, config, 1);
        let strips = strips(&building);
        assert_eq!(strips.len(), 2);
        assert_approx_eq!(strips[0].local.position.x, -1.5);
        assert_approx_eq!(strips[1].local.position.x, 1.5);
        assert!(strips.iter().all(|s| s.width == 3));

        match &next[0].production {
            Production::Roof(r) => {
                assert_eq!((r.width, r.depth), (2, 3));
                assert_eq!(r.axis, Some(RoofAxis::Width));
            }
            other => panic!("expected a roof, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_extent_gets_one_strip() {
        let rule = RoofRule { width: 5, depth: 1, height_index: 1, axis: Some(RoofAxis::Depth) };
        let (building, next) = run_roof(rule, BuildingConfig::default(), 2);
        let strips = strips(&building);
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].local.position, Vec3::ZERO);
        assert_eq!(building.placements().len(), 5);
        assert!(next.is_empty());
    }

    #[test]
    fn test_flat_cap_covers_residual_footprint() {
        let rule = RoofRule { width: 5, depth: 4, height_index: 1, axis: Some(RoofAxis::Width) };
        let config = BuildingConfig {
            roof_continue_chance: 0.0,
            roof_resumes_stock: false,
            balcony_chance: 0.0,
            ..BuildingConfig::default()
        };
        let (building, next) = run_roof(rule, config, 3);
        assert!(next.is_empty());
        let caps = building.symbols().iter().filter(|s| s.name == "roofCap").count();
        assert_eq!(caps, 3);
        assert_eq!(building.placements().len(), 2 * 4 + 3 * 4);
    }

    #[test]
    fn test_resumes_setback_stock() {
        let rule = RoofRule { width: 6, depth: 6, height_index: 2, axis: Some(RoofAxis::Depth) };
        let config = BuildingConfig { roof_continue_chance: 0.0, balcony_chance: 0.0, ..BuildingConfig::default() };
        let (_, next) = run_roof(rule, config, 4);
        match &next[0].production {
            Production::Stock(s) => {
                assert_eq!((s.width, s.depth, s.height_index), (6, 4, 2));
                assert_eq!(s.door_wall, None);
            }
            other => panic!("expected a stock, got {:?}", other),
        }
    }

    #[test]
    fn test_balcony_terrace_ends_chain() {
        let rule = RoofRule { width: 5, depth: 5, height_index: 4, axis: Some(RoofAxis::Width) };
        let config = BuildingConfig {
            balcony_chance: 1.0,
            balcony_min_height: 2,
            roof_continue_chance: 1.0,
            ..BuildingConfig::default()
        };
        let (building, next) = run_roof(rule, config, 5);
        assert!(next.is_empty());
        let balconies = building.placements().iter().filter(|p| p.unit.as_str() == "balcony").count();
        assert_eq!(balconies, 3);
    }

    #[test]
    fn test_skyscraper_spans_longer_side() {
        let rule = RoofRule::start(2, 7, 5);
        let config = BuildingConfig { roof_style: RoofStyle::Skyscraper, ..BuildingConfig::default() };
        let (building, next) = run_roof(rule, config, 6);
        assert!(next.is_empty());
        assert_eq!(building.count(SymbolKind::Row), 1);
        assert_eq!(building.placements().len(), 7);
    }

    #[test]
    fn test_zero_depth_roof_is_rejected() {
        assert!(RoofRule::start(3, 0, 1).check().is_err());
    }
}
