// src/grammar/lod.rs

use crate::grammar::symbol::Placement;
use crate::utils::Aabb;
use log::warn;

/// Screen-relative height below which LOD 0 hands over, for new groups.
pub const DEFAULT_LOD_THRESHOLD: f64 = 0.5;

/// One detail level: visible while the building covers at least
/// `screen_relative_height` of the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct LodLevel {
    pub screen_relative_height: f64,
    /// Indices into the building's placement list.
    pub members: Vec<usize>,
}

/// Buckets a building's placements into detail levels.
#[derive(Debug, Clone, PartialEq)]
pub struct LodGroup {
    levels: Vec<LodLevel>,
    bounds: Aabb,
}

impl Default for LodGroup {
    fn default() -> Self {
        LodGroup::new(&[DEFAULT_LOD_THRESHOLD])
    }
}

impl LodGroup {
    /// Thresholds are sorted so level 0 is the most detailed.
    pub fn new(thresholds: &[f64]) -> Self {
        let mut sorted = thresholds.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        LodGroup {
            levels: sorted
                .into_iter()
                .map(|t| LodLevel { screen_relative_height: t, members: Vec::new() })
                .collect(),
            bounds: Aabb::new_empty(),
        }
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn add_to_primary(&mut self, placement: usize) {
        match self.levels.first_mut() {
            Some(level) => level.members.push(placement),
            None => warn!("LOD group has no levels; placement {} is not tracked", placement),
        }
    }

    /// Merges every level into a single one at `threshold`.
    pub fn collapse(&mut self, threshold: f64) {
        let members: Vec<usize> = self.levels.drain(..).flat_map(|l| l.members).collect();
        self.levels.push(LodLevel { screen_relative_height: threshold, members });
    }

    /// The level shown at this screen coverage; `None` means culled.
    pub fn level_for(&self, screen_relative_height: f64) -> Option<usize> {
        self.levels
            .iter()
            .position(|l| screen_relative_height >= l.screen_relative_height)
    }

    pub fn recalculate_bounds(&mut self, placements: &[Placement]) {
        let mut bounds = Aabb::new_empty();
        for index in self.levels.iter().flat_map(|l| l.members.iter()) {
            if let Some(p) = placements.get(*index) {
                bounds.expand_point(p.transform.position);
            }
        }
        self.bounds = bounds;
    }

    pub fn member_count(&self) -> usize {
        self.levels.iter().map(|l| l.members.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitId;
    use crate::grammar::symbol::SymbolId;
    use crate::utils::{Transform, Vec3};

    fn placement_at(x: f64, y: f64, z: f64) -> Placement {
        Placement {
            symbol: SymbolId(0),
            unit: UnitId::new("u"),
            transform: Transform::from_position(Vec3::new(x, y, z)),
        }
    }

    #[test]
    fn test_levels_sorted_most_detailed_first() {
        let group = LodGroup::new(&[0.1, 0.6, 0.3]);
        let thresholds: Vec<f64> = group.levels().iter().map(|l| l.screen_relative_height).collect();
        assert_eq!(thresholds, vec![0.6, 0.3, 0.1]);
        assert_eq!(group.level_for(0.7), Some(0));
        assert_eq!(group.level_for(0.2), Some(2));
        assert_eq!(group.level_for(0.05), None);
    }

    #[test]
    fn test_collapse_keeps_members() {
        let mut group = LodGroup::new(&[0.6, 0.3]);
        group.add_to_primary(0);
        group.add_to_primary(1);
        group.collapse(DEFAULT_LOD_THRESHOLD);
        assert_eq!(group.levels().len(), 1);
        assert_eq!(group.member_count(), 2);
    }

    #[test]
    fn test_bounds_cover_members() {
        let placements = vec![placement_at(-1.0, 0.0, 0.0), placement_at(2.0, 3.0, 1.0)];
        let mut group = LodGroup::default();
        group.add_to_primary(0);
        group.add_to_primary(1);
        group.recalculate_bounds(&placements);
        assert_eq!(group.bounds().size(), Vec3::new(3.0, 3.0, 1.0));
    }

    #[test]
    fn test_empty_group_ignores_placements() {
        let mut group = LodGroup::new(&[]);
        group.add_to_primary(3);
        assert_eq!(group.member_count(), 0);
    }
}
