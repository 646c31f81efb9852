// src/bsp/bsp_procedural.rs

use crate::bsp::bsp_util::EPSILON;
use crate::bsp::PartitionTree;
use crate::config::CityConfig;
use crate::grid::ValueGrid;
use crate::placement::OccupancyQuery;
use crate::utils::{Rect, Vec3};
use log::{debug, info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlotKind {
    Building,
    /// Blocked by a road or an external obstacle.
    Road,
    NoBuildZone,
    /// Buildable, but uses the central building profile.
    CentralZone,
}

/// One cell-sized slot inside a partition leaf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plot {
    pub rect: Rect,
    pub kind: PlotKind,
    /// Integer cell coordinates, unique per plot; used to derive per-plot seeds.
    pub cell: (i64, i64),
}

impl Plot {
    pub fn is_buildable(&self) -> bool {
        matches!(self.kind, PlotKind::Building | PlotKind::CentralZone)
    }

    /// Plan-view centre lifted onto the ground plane (plan `y` becomes world `z`).
    pub fn center(&self) -> Vec3 {
        let (x, y) = self.rect.center();
        Vec3::new(x, 0.0, y)
    }
}

/// Cuts leaves into plots and decides what each plot is for.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotClassifier {
    pub cell_size: f64,
    pub central_zone: Option<Rect>,
    pub no_build_threshold: f64,
}

impl PlotClassifier {
    pub fn from_config(config: &CityConfig) -> Self {
        let central_zone = (config.central_zone_fraction > 0.0).then(|| {
            let w = config.width * config.central_zone_fraction;
            let d = config.depth * config.central_zone_fraction;
            Rect::new((config.width - w) * 0.5, (config.depth - d) * 0.5, w, d)
        });
        PlotClassifier {
            cell_size: config.cell_size,
            central_zone,
            no_build_threshold: config.no_build_threshold,
        }
    }

    /// Centres a grid of whole cells inside `leaf` and classifies every cell.
    /// A leaf too small for a single cell yields nothing.
    pub fn classify_leaf(
        &self,
        leaf: &Rect,
        roads: &dyn OccupancyQuery,
        obstacles: &dyn OccupancyQuery,
        grid: Option<&ValueGrid>,
    ) -> Vec<Plot> {
        let cs = self.cell_size;
        let columns = (leaf.width / cs).floor().max(0.0) as usize;
        let rows = (leaf.height / cs).floor().max(0.0) as usize;
        if columns == 0 || rows == 0 {
            debug!("leaf {}x{} fits no {} cell", leaf.width, leaf.height, cs);
            return Vec::new();
        }
        let offset_x = (leaf.width - columns as f64 * cs) * 0.5;
        let offset_y = (leaf.height - rows as f64 * cs) * 0.5;

        let mut plots = Vec::with_capacity(columns * rows);
        for a in 0..columns {
            for b in 0..rows {
                let rect = Rect::new(
                    leaf.x + offset_x + a as f64 * cs,
                    leaf.y + offset_y + b as f64 * cs,
                    cs,
                    cs,
                );
                let cell = ((rect.x / cs).floor() as i64, (rect.y / cs).floor() as i64);
                plots.push(Plot { rect, kind: self.classify(&rect, roads, obstacles, grid), cell });
            }
        }
        plots
    }

    fn classify(
        &self,
        rect: &Rect,
        roads: &dyn OccupancyQuery,
        obstacles: &dyn OccupancyQuery,
        grid: Option<&ValueGrid>,
    ) -> PlotKind {
        let probe = rect.inset(EPSILON);
        if roads.query_occupancy(&probe) || obstacles.query_occupancy(&probe) {
            return PlotKind::Road;
        }
        let (cx, cy) = rect.center();
        if let Some(grid) = grid {
            if grid.sample(Vec3::new(cx, 0.0, cy)) >= self.no_build_threshold {
                return PlotKind::NoBuildZone;
            }
        }
        match &self.central_zone {
            Some(zone) if zone.contains_point(cx, cy) => PlotKind::CentralZone,
            _ => PlotKind::Building,
        }
    }

    /// Classifies every leaf of a partition, in leaf order.
    pub fn classify_tree(
        &self,
        tree: &PartitionTree,
        obstacles: &dyn OccupancyQuery,
        grid: Option<&ValueGrid>,
    ) -> Vec<Plot> {
        let plots: Vec<Plot> = tree
            .leaves()
            .into_iter()
            .flat_map(|leaf| self.classify_leaf(&leaf.rect, &tree.roads, obstacles, grid))
            .collect();
        let buildable = plots.iter().filter(|p| p.is_buildable()).count();
        if buildable == 0 {
            warn!("no buildable plot in {} leaves", tree.leaves().len());
        } else {
            info!("classified {} plots, {} buildable", plots.len(), buildable);
        }
        plots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::Partitioner;
    use crate::placement::NoObstacles;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn classifier(cell_size: f64) -> PlotClassifier {
        PlotClassifier { cell_size, central_zone: None, no_build_threshold: 1.0 }
    }

    #[test]
    fn test_cells_are_centred_in_leaf() {
        let plots = classifier(4.0).classify_leaf(&Rect::new(10.0, 0.0, 10.0, 4.0), &NoObstacles, &NoObstacles, None);
        assert_eq!(plots.len(), 2);
        assert_approx_eq!(plots[0].rect.x, 11.0);
        assert_approx_eq!(plots[1].rect.max_x(), 19.0);
        assert!(plots.iter().all(|p| p.kind == PlotKind::Building));
    }

    #[test]
    fn test_small_leaf_is_silent_no_op() {
        let plots = classifier(8.0).classify_leaf(&Rect::new(0.0, 0.0, 7.5, 20.0), &NoObstacles, &NoObstacles, None);
        assert!(plots.is_empty());
    }

    #[test]
    fn test_obstacles_mark_road() {
        let obstacles = vec![Rect::new(0.0, 0.0, 2.0, 2.0)];
        let plots = classifier(4.0).classify_leaf(&Rect::new(0.0, 0.0, 8.0, 4.0), &NoObstacles, &obstacles, None);
        assert_eq!(plots[0].kind, PlotKind::Road);
        assert_eq!(plots[1].kind, PlotKind::Building);
    }

    #[test]
    fn test_value_grid_marks_no_build() {
        let mut grid = ValueGrid::new(4, 4, 4.0).unwrap();
        grid.set_cell(1, 0, 1.0);
        let plots = classifier(4.0).classify_leaf(&Rect::new(0.0, 0.0, 8.0, 4.0), &NoObstacles, &NoObstacles, Some(&grid));
        assert_eq!(plots[0].kind, PlotKind::Building);
        assert_eq!(plots[1].kind, PlotKind::NoBuildZone);
    }

    #[test]
    fn test_central_zone_from_config() {
        let config = CityConfig { central_zone_fraction: 0.5, ..CityConfig::default() };
        let classifier = PlotClassifier::from_config(&config);
        let zone = classifier.central_zone.unwrap();
        assert_approx_eq!(zone.x, 25.0);
        assert_approx_eq!(zone.width, 50.0);
        let plots = classifier.classify_leaf(&Rect::new(40.0, 40.0, 8.0, 8.0), &NoObstacles, &NoObstacles, None);
        assert_eq!(plots[0].kind, PlotKind::CentralZone);
    }

    #[test]
    fn test_tree_plots_are_disjoint_with_unique_cells() {
        let config = CityConfig::default();
        let tree = Partitioner::from_config(&config).build(&mut ChaCha8Rng::seed_from_u64(2)).unwrap();
        let plots = PlotClassifier::from_config(&config).classify_tree(&tree, &NoObstacles, None);
        assert!(!plots.is_empty());
        for (n, a) in plots.iter().enumerate() {
            for b in &plots[n + 1..] {
                assert!(!a.rect.inset(EPSILON).intersects(&b.rect));
                assert_ne!(a.cell, b.cell);
            }
        }
    }
}
