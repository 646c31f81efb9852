// src/config/style.rs

use crate::error::{GenError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a placeable unit (a prefab, mesh or tile name on the host side).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        UnitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        UnitId::new(id)
    }
}

/// A validated, non-empty list of unit ids for one role.
///
/// Construction is the only place a palette is checked, so productions can
/// index into it without further guards.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    units: Vec<UnitId>,
}

impl Palette {
    pub fn new(role: &str, units: &[String]) -> Result<Self> {
        if units.is_empty() {
            return Err(GenError::config(format!("{} palette is empty", role)));
        }
        if let Some(pos) = units.iter().position(|u| u.trim().is_empty()) {
            return Err(GenError::config(format!(
                "{} palette has an empty unit id at index {}",
                role, pos
            )));
        }
        Ok(Palette {
            units: units.iter().map(|u| UnitId::new(u.clone())).collect(),
        })
    }

    pub fn single(unit: UnitId) -> Self {
        Palette { units: vec![unit] }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Rotating pick; keeps columns aligned when stacked rows share a start index.
    pub fn rotating(&self, index: usize) -> &UnitId {
        &self.units[index % self.units.len()]
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &UnitId {
        &self.units[rng.random_range(0..self.units.len())]
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }
}

/// Raw style palettes as they come from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub walls: Vec<String>,
    pub doors: Vec<String>,
    pub roofs: Vec<String>,
    pub balconies: Vec<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        StyleConfig {
            walls: vec!["wall_plain".into(), "wall_window".into()],
            doors: vec!["door".into()],
            roofs: vec!["roof_flat".into()],
            balconies: vec!["balcony".into()],
        }
    }
}

/// Which wall a balcony may be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalconyPlacement {
    /// Only the front wall (index 3).
    Front,
    /// Any wall the door does not already use.
    AnyFreeWall,
}

/// How a row picks its units from the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallSelection {
    /// Uniform random pick per unit.
    Random,
    /// Rotating index from a start index, so stacked rows line up.
    Aligned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofStyle {
    /// Two edge strips per step, shrinking inwards until capped.
    Stepped,
    /// One strip of length `max(width, depth)`; always terminal.
    Skyscraper,
}

/// Parameters of one building family (one parameterised Stock/Roof/Row grammar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub style: StyleConfig,
    pub min_height: u32,
    pub max_height: u32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_depth: u32,
    pub max_depth: u32,
    pub stock_continue_chance: f64,
    pub roof_continue_chance: f64,
    pub balcony_chance: f64,
    /// Balconies are only tried strictly above this height index.
    pub balcony_min_height: u32,
    pub balcony_placement: BalconyPlacement,
    pub wall_selection: WallSelection,
    pub roof_style: RoofStyle,
    /// Whether a stepped roof may hand over to a narrower Stock.
    pub roof_resumes_stock: bool,
    pub doors: bool,
    pub floor_height: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig {
            style: StyleConfig::default(),
            min_height: 1,
            max_height: 10,
            min_width: 2,
            max_width: 6,
            min_depth: 2,
            max_depth: 6,
            stock_continue_chance: 0.5,
            roof_continue_chance: 0.5,
            balcony_chance: 0.3,
            balcony_min_height: 2,
            balcony_placement: BalconyPlacement::AnyFreeWall,
            wall_selection: WallSelection::Random,
            roof_style: RoofStyle::Stepped,
            roof_resumes_stock: true,
            doors: true,
            floor_height: 1.0,
        }
    }
}

impl BuildingConfig {
    /// Checks every rule and builds the immutable style the grammar runs on.
    pub fn validate(&self) -> Result<BuildingStyle> {
        if self.min_height > self.max_height {
            return Err(GenError::config(format!(
                "min_height {} exceeds max_height {}",
                self.min_height, self.max_height
            )));
        }
        if self.max_height == 0 {
            return Err(GenError::config("max_height must be at least 1"));
        }
        if self.min_width > self.max_width || self.min_depth > self.max_depth {
            return Err(GenError::config(format!(
                "footprint bounds are inverted (width {}..{}, depth {}..{})",
                self.min_width, self.max_width, self.min_depth, self.max_depth
            )));
        }
        for (name, p) in [
            ("stock_continue_chance", self.stock_continue_chance),
            ("roof_continue_chance", self.roof_continue_chance),
            ("balcony_chance", self.balcony_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GenError::config(format!("{} must be in [0, 1], got {}", name, p)));
            }
        }
        if !(self.floor_height > 0.0) {
            return Err(GenError::config("floor_height must be positive"));
        }

        let walls = Palette::new("wall", &self.style.walls)?;
        let roofs = Palette::new("roof", &self.style.roofs)?;
        let doors = if self.doors {
            Some(Palette::new("door", &self.style.doors)?)
        } else {
            None
        };
        let balconies = if self.balcony_chance > 0.0 {
            Some(Palette::new("balcony", &self.style.balconies)?)
        } else {
            None
        };

        Ok(BuildingStyle {
            walls,
            doors,
            roofs,
            balconies,
            min_height: self.min_height,
            max_height: self.max_height,
            width_range: (self.min_width, self.max_width),
            depth_range: (self.min_depth, self.max_depth),
            stock_continue_chance: self.stock_continue_chance,
            roof_continue_chance: self.roof_continue_chance,
            balcony_chance: self.balcony_chance,
            balcony_min_height: self.balcony_min_height,
            balcony_placement: self.balcony_placement,
            wall_selection: self.wall_selection,
            roof_style: self.roof_style,
            roof_resumes_stock: self.roof_resumes_stock,
            floor_height: self.floor_height,
        })
    }
}

/// Validated building parameters shared by every production of a building.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingStyle {
    pub walls: Palette,
    pub doors: Option<Palette>,
    pub roofs: Palette,
    pub balconies: Option<Palette>,
    pub min_height: u32,
    pub max_height: u32,
    pub width_range: (u32, u32),
    pub depth_range: (u32, u32),
    pub stock_continue_chance: f64,
    pub roof_continue_chance: f64,
    pub balcony_chance: f64,
    pub balcony_min_height: u32,
    pub balcony_placement: BalconyPlacement,
    pub wall_selection: WallSelection,
    pub roof_style: RoofStyle,
    pub roof_resumes_stock: bool,
    pub floor_height: f64,
}

impl BuildingStyle {
    /// Draws a footprint within the configured bounds, never wider than `fit` units.
    pub fn random_footprint<R: Rng + ?Sized>(&self, rng: &mut R, fit: u32) -> (u32, u32) {
        let pick = |rng: &mut R, (lo, hi): (u32, u32)| {
            let hi = hi.min(fit);
            let lo = lo.min(hi);
            rng.random_range(lo..=hi)
        };
        let width = pick(rng, self.width_range);
        let depth = pick(rng, self.depth_range);
        (width, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_config_validates() {
        let style = BuildingConfig::default().validate().unwrap();
        assert_eq!(style.walls.len(), 2);
        assert!(style.doors.is_some());
        assert!(style.balconies.is_some());
    }

    #[test]
    fn test_empty_palette_rejected() {
        let mut config = BuildingConfig::default();
        config.style.walls.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GenError::Configuration(ref m) if m.contains("wall")));
    }

    #[test]
    fn test_blank_unit_id_rejected() {
        let mut config = BuildingConfig::default();
        config.style.roofs = vec!["roof_a".into(), "  ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_heights_rejected() {
        let config = BuildingConfig {
            min_height: 5,
            max_height: 2,
            ..BuildingConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenError::Configuration(_))));
    }

    #[test]
    fn test_balcony_palette_only_needed_when_used() {
        let mut config = BuildingConfig::default();
        config.style.balconies.clear();
        assert!(config.validate().is_err());
        config.balcony_chance = 0.0;
        assert!(config.validate().unwrap().balconies.is_none());
    }

    #[test]
    fn test_probability_range_checked() {
        let config = BuildingConfig {
            roof_continue_chance: 1.5,
            ..BuildingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rotating_pick_wraps() {
        let palette = Palette::new("wall", &["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(palette.rotating(4).as_str(), "b");
    }

    #[test]
    fn test_random_footprint_respects_fit() {
        let style = BuildingConfig::default().validate().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let (w, d) = style.random_footprint(&mut rng, 4);
            assert!((2..=4).contains(&w));
            assert!((2..=4).contains(&d));
        }
    }

    #[test]
    fn test_style_config_from_json() {
        let json = r#"{ "walls": ["w"], "roofs": ["r"] }"#;
        let style: StyleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(style.walls, vec!["w".to_string()]);
        assert_eq!(style.doors, vec!["door".to_string()]);
    }
}
