// src/grammar/row.rs

use crate::config::{BuildingStyle, Palette, UnitId, WallSelection};
use crate::error::{GenError, Result};
use crate::grammar::symbol::{Building, SymbolId};
use crate::utils::{Transform, Vec3};
use rand::Rng;

/// Which style palette a row draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteRole {
    Walls,
    Roofs,
    Balconies,
}

impl PaletteRole {
    pub fn resolve<'s>(&self, style: &'s BuildingStyle) -> Option<&'s Palette> {
        match self {
            PaletteRole::Walls => Some(&style.walls),
            PaletteRole::Roofs => Some(&style.roofs),
            PaletteRole::Balconies => style.balconies.as_ref(),
        }
    }
}

/// Leaf production: `count` units evenly spaced along `direction`, centred on the symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRule {
    pub name: &'static str,
    pub count: u32,
    pub role: PaletteRole,
    /// First index for aligned selection; stacked rows with the same start line up.
    pub start_index: usize,
    pub direction: Vec3,
    pub selection: WallSelection,
    /// Replaces the centre unit (a door or a balcony).
    pub accent: Option<UnitId>,
}

impl RowRule {
    pub fn new(count: u32, role: PaletteRole, selection: WallSelection) -> Self {
        RowRule {
            name: "row",
            count,
            role,
            start_index: 0,
            direction: Vec3::Z,
            selection,
            accent: None,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn starting_at(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn along(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_accent(mut self, accent: Option<UnitId>) -> Self {
        self.accent = accent;
        self
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.count == 0 {
            return Err(GenError::geometry("row with zero units"));
        }
        Ok(())
    }

    /// Offset of unit `i`, centred so a single unit sits on the symbol origin.
    pub fn offset(&self, i: u32) -> Vec3 {
        self.direction * f64::from(i) - self.direction * (f64::from(self.count) - 1.0) * 0.5
    }

    pub(crate) fn produce<R: Rng + ?Sized>(
        self,
        symbol: SymbolId,
        building: &mut Building,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Result<()> {
        let palette = self.role.resolve(style).ok_or_else(|| {
            GenError::geometry(format!("no {:?} palette configured for this building", self.role))
        })?;
        let accent_slot = self.count.saturating_sub(1) / 2;

        for i in 0..self.count {
            let unit = match (&self.accent, self.selection) {
                (Some(accent), _) if i == accent_slot => accent.clone(),
                (_, WallSelection::Aligned) => palette.rotating(self.start_index + i as usize).clone(),
                (_, WallSelection::Random) => palette.choose(rng).clone(),
            };
            building.place(symbol, unit, Transform::from_position(self.offset(i)));
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

    fn aligned_style() -> BuildingStyle {
        let mut config = BuildingConfig::default();
        config.style.walls = vec!["a".into(), "b".into(), "c".into()];
        config.wall_selection = WallSelection::Aligned;
        config.validate().unwrap()
    }

    fn run_row(rule: RowRule, style: &BuildingStyle) -> Building {
        let mut building = Building::new(Transform::IDENTITY);
        let symbol = building.spawn(None, SymbolKind::Row, "row", Transform::IDENTITY, rule.count, 1, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        rule.produce(symbol, &mut building, style, &mut rng).unwrap();
        building
    }

    #[test]
    fn test_row_is_centred() {
        let style = aligned_style();
        let building = run_row(RowRule::new(4, PaletteRole::Walls, WallSelection::Aligned), &style);
        let zs: Vec<f64> = building.placements().iter().map(|p| p.transform.position.z).collect();
        assert_eq!(zs.len(), 4);
        assert_approx_eq!(zs[0], -1.5);
        assert_approx_eq!(zs[3], 1.5);
    }

    #[test]
    fn test_single_unit_sits_on_centre() {
        let style = aligned_style();
        let building = run_row(RowRule::new(1, PaletteRole::Walls, WallSelection::Aligned), &style);
        assert_eq!(building.placements()[0].transform.position, Vec3::ZERO);
    }

    #[test]
    fn test_aligned_rows_rotate_from_start() {
        let style = aligned_style();
        let rule = RowRule::new(4, PaletteRole::Walls, WallSelection::Aligned).starting_at(2);
        let building = run_row(rule, &style);
        let units: Vec<&str> = building.placements().iter().map(|p| p.unit.as_str()).collect();
        assert_eq!(units, vec!["c", "a", "b", "c"]);
    }

    #[test]
    fn test_accent_replaces_centre_unit() {
        let style = aligned_style();
        let rule = RowRule::new(5, PaletteRole::Walls, WallSelection::Aligned)
            .with_accent(Some(UnitId::new("door")));
        let building = run_row(rule, &style);
        assert_eq!(building.placements()[2].unit.as_str(), "door");
        assert_eq!(building.placements().iter().filter(|p| p.unit.as_str() == "door").count(), 1);
    }

    #[test]
    fn test_direction_is_respected() {
        let style = aligned_style();
        let rule = RowRule::new(3, PaletteRole::Roofs, WallSelection::Aligned).along(Vec3::X);
        let building = run_row(rule, &style);
        assert_eq!(building.placements()[0].transform.position, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_zero_count_is_degenerate() {
        assert!(RowRule::new(0, PaletteRole::Walls, WallSelection::Random).check().is_err());
    }
}
