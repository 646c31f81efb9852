// src/bsp/bsp_level.rs

use crate::bsp::bsp_util::{is_splittable, road_width, RoadNetwork};
use crate::bsp::{PartitionNode, Split, SplitAxis};
use crate::config::CityConfig;
use crate::error::{GenError, Result};
use crate::utils::Rect;
use log::{info, trace};
use rand::Rng;

/// Output of one partition pass: the tree plus every corridor it carved.
#[derive(Debug, Clone)]
pub struct PartitionTree {
    pub root: PartitionNode,
    pub roads: RoadNetwork,
}

impl PartitionTree {
    pub fn leaves(&self) -> Vec<&PartitionNode> {
        self.root.leaves()
    }
}

/// Recursive binary splitter for the city extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Partitioner {
    pub extent: Rect,
    pub depth_limit: u32,
    pub min_cell_size: f64,
    pub min_road_width: f64,
    pub max_road_width: f64,
}

impl Partitioner {
    pub fn from_config(config: &CityConfig) -> Self {
        Partitioner {
            extent: Rect::new(0.0, 0.0, config.width, config.depth),
            depth_limit: config.partition_depth,
            min_cell_size: config.min_cell_size,
            min_road_width: config.min_road_width,
            max_road_width: config.max_road_width,
        }
    }

    /// Partitions the whole extent.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PartitionTree> {
        let mut roads = RoadNetwork::new();
        let root = self.partition(self.extent, self.depth_limit, rng, &mut roads)?;
        info!(
            "partition finished: {} leaves, {} roads",
            root.leaves().len(),
            roads.len()
        );
        Ok(PartitionTree { root, roads })
    }

    /// Splits `rect` recursively; `depth` counts down to zero.
    pub fn partition<R: Rng + ?Sized>(
        &self,
        rect: Rect,
        depth: u32,
        rng: &mut R,
        roads: &mut RoadNetwork,
    ) -> Result<PartitionNode> {
        if rect.is_degenerate() {
            return Err(GenError::geometry(format!(
                "partition node {}x{} at ({}, {})",
                rect.width, rect.height, rect.x, rect.y
            )));
        }

        let min = self.min_cell_size;
        if depth == 0 || (rect.width < 2.0 * min && rect.height < 2.0 * min) {
            return Ok(PartitionNode::create_leaf(rect));
        }

        let road = road_width(&rect, &self.extent, self.min_road_width, self.max_road_width);
        let preferred = if rect.width < rect.height || rng.random_bool(0.5) {
            SplitAxis::Horizontal
        } else {
            SplitAxis::Vertical
        };
        let axis = if is_splittable(preferred.extent_of(&rect), min, road) {
            preferred
        } else if is_splittable(preferred.other().extent_of(&rect), min, road) {
            preferred.other()
        } else {
            trace!("leaf {}x{}: no axis fits a {} road", rect.width, rect.height, road);
            return Ok(PartitionNode::create_leaf(rect));
        };

        let (front_rect, corridor, back_rect) = self.split_rect(&rect, axis, road, rng);
        trace!("split {:?} at depth {} with corridor {:?}", axis, depth, corridor);
        roads.add(corridor);

        let front = self.partition(front_rect, depth - 1, rng, roads)?;
        let back = self.partition(back_rect, depth - 1, rng, roads)?;
        Ok(PartitionNode::create_node(rect, Split { axis, corridor }, front, back))
    }

    /// Cuts `rect` at a random position that leaves both sides at least
    /// `min_cell_size` once the corridor is removed.
    fn split_rect<R: Rng + ?Sized>(
        &self,
        rect: &Rect,
        axis: SplitAxis,
        road: f64,
        rng: &mut R,
    ) -> (Rect, Rect, Rect) {
        let dimension = axis.extent_of(rect);
        let half_road = road * 0.5;
        let lo = self.min_cell_size + half_road;
        let hi = dimension - self.min_cell_size - half_road;
        let at = if hi > lo { rng.random_range(lo..hi) } else { lo };

        let near = at - half_road;
        let far = dimension - at - half_road;
        match axis {
            SplitAxis::Vertical => (
                Rect::new(rect.x, rect.y, near, rect.height),
                Rect::new(rect.x + near, rect.y, road, rect.height),
                Rect::new(rect.x + near + road, rect.y, far, rect.height),
            ),
            SplitAxis::Horizontal => (
                Rect::new(rect.x, rect.y, rect.width, near),
                Rect::new(rect.x, rect.y + near, rect.width, road),
                Rect::new(rect.x, rect.y + near + road, rect.width, far),
            ),
        }
    }
}
