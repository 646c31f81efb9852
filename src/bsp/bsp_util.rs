// src/bsp/bsp_util.rs
// Road geometry helpers for the partitioner.

use crate::placement::OccupancyQuery;
use crate::utils::util::lerp;
use crate::utils::Rect;

/// Tolerance for area and containment checks.
pub const EPSILON: f64 = 1e-6;

/// Corridor width for a node: wider roads between larger blocks.
/// Interpolates on the node's longer side relative to the extent's longer side.
pub fn road_width(node: &Rect, extent: &Rect, min_road: f64, max_road: f64) -> f64 {
    let extent_size = extent.width.max(extent.height);
    if extent_size <= 0.0 {
        return min_road;
    }
    lerp(min_road, max_road, node.width.max(node.height) / extent_size)
}

/// Whether a dimension can take a cut that leaves both sides at least `min_cell`.
pub fn is_splittable(dimension: f64, min_cell: f64, road: f64) -> bool {
    dimension + EPSILON >= 2.0 * min_cell + road
}

/// All corridors carved during one partition pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadNetwork {
    roads: Vec<Rect>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, road: Rect) {
        self.roads.push(road);
    }

    pub fn roads(&self) -> &[Rect] {
        &self.roads
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn total_area(&self) -> f64 {
        self.roads.iter().map(Rect::area).sum()
    }
}

impl OccupancyQuery for RoadNetwork {
    fn query_occupancy(&self, region: &Rect) -> bool {
        self.roads.query_occupancy(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_road_width_scales_with_node_size() {
        let extent = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_approx_eq!(road_width(&extent, &extent, 2.0, 4.0), 4.0);
        let half = Rect::new(0.0, 0.0, 50.0, 20.0);
        assert_approx_eq!(road_width(&half, &extent, 2.0, 4.0), 3.0);
    }

    #[test]
    fn test_splittable_needs_room_for_both_sides() {
        assert!(is_splittable(24.0, 10.0, 4.0));
        assert!(!is_splittable(23.0, 10.0, 4.0));
        assert!(is_splittable(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_network_occupancy() {
        let mut roads = RoadNetwork::new();
        roads.add(Rect::new(48.0, 0.0, 4.0, 100.0));
        assert!(roads.query_occupancy(&Rect::new(45.0, 10.0, 5.0, 5.0)));
        assert!(!roads.query_occupancy(&Rect::new(40.0, 10.0, 8.0, 5.0)));
        assert_approx_eq!(roads.total_area(), 400.0);
        assert_eq!(roads.len(), 1);
    }
}
