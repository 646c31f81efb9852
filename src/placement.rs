// src/placement.rs
//! The seam between the generator and whatever hosts the scene.
//!
//! The generator never owns renderable resources. It asks a `PlacementSink` to
//! put units down and, optionally, asks an `OccupancyQuery` whether a region is
//! already taken.

use crate::config::UnitId;
use crate::utils::{QuarterTurns, Rect, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle the host returns for a placed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementHandle(pub u64);

/// Receives placement requests.
pub trait PlacementSink {
    /// Places `unit` at `offset` (relative to `parent`, or to the world when `None`).
    fn place_unit(
        &mut self,
        unit: &UnitId,
        offset: Vec3,
        rotation: QuarterTurns,
        parent: Option<PlacementHandle>,
    ) -> PlacementHandle;

    /// Called when a rebuild tears down the previous pass.
    fn clear(&mut self) {}
}

/// Answers "is anything already here?" for plot classification.
pub trait OccupancyQuery {
    fn query_occupancy(&self, region: &Rect) -> bool;
}

/// Never occupied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObstacles;

impl OccupancyQuery for NoObstacles {
    fn query_occupancy(&self, _region: &Rect) -> bool {
        false
    }
}

impl OccupancyQuery for [Rect] {
    fn query_occupancy(&self, region: &Rect) -> bool {
        self.iter().any(|r| r.intersects(region))
    }
}

impl OccupancyQuery for Vec<Rect> {
    fn query_occupancy(&self, region: &Rect) -> bool {
        self.as_slice().query_occupancy(region)
    }
}

/// One recorded placement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedUnit {
    pub handle: PlacementHandle,
    pub unit: UnitId,
    pub offset: Vec3,
    pub rotation: QuarterTurns,
    pub parent: Option<PlacementHandle>,
}

/// A sink that just remembers every request; used by the CLI and tests.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RecordingSink {
    pub placed: Vec<PlacedUnit>,
    next_handle: u64,
    pub clears: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Units whose parent is `parent`.
    pub fn children_of(&self, parent: PlacementHandle) -> impl Iterator<Item = &PlacedUnit> {
        self.placed.iter().filter(move |p| p.parent == Some(parent))
    }

    /// Units placed directly in the world (building roots, overlay tiles).
    pub fn roots(&self) -> impl Iterator<Item = &PlacedUnit> {
        self.placed.iter().filter(|p| p.parent.is_none())
    }
}

impl PlacementSink for RecordingSink {
    fn place_unit(
        &mut self,
        unit: &UnitId,
        offset: Vec3,
        rotation: QuarterTurns,
        parent: Option<PlacementHandle>,
    ) -> PlacementHandle {
        let handle = PlacementHandle(self.next_handle);
        self.next_handle += 1;
        self.placed.push(PlacedUnit {
            handle,
            unit: unit.clone(),
            offset,
            rotation,
            parent,
        });
        handle
    }

    fn clear(&mut self) {
        self.placed.clear();
        self.clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_hands_out_fresh_handles() {
        let mut sink = RecordingSink::new();
        let root = sink.place_unit(&UnitId::new("root"), Vec3::ZERO, QuarterTurns::IDENTITY, None);
        let child = sink.place_unit(&UnitId::new("wall"), Vec3::X, QuarterTurns::new(1), Some(root));
        assert_ne!(root, child);
        assert_eq!(sink.children_of(root).count(), 1);
        assert_eq!(sink.roots().count(), 1);

        sink.clear();
        assert!(sink.is_empty());
        assert_eq!(sink.clears, 1);
        let after = sink.place_unit(&UnitId::new("root"), Vec3::ZERO, QuarterTurns::IDENTITY, None);
        assert_ne!(after, root);
    }

    #[test]
    fn test_rect_list_occupancy() {
        let roads = vec![Rect::new(0.0, 0.0, 100.0, 4.0)];
        assert!(roads.query_occupancy(&Rect::new(10.0, 2.0, 5.0, 5.0)));
        assert!(!roads.query_occupancy(&Rect::new(10.0, 4.0, 5.0, 5.0)));
        assert!(!NoObstacles.query_occupancy(&Rect::new(0.0, 0.0, 1.0, 1.0)));
    }
}
