// src/bsp/mod.rs
pub mod bsp_level;
pub mod bsp_node;
pub mod bsp_procedural;
pub mod bsp_util;

pub use bsp_level::{PartitionTree, Partitioner};
pub use bsp_node::{PartitionNode, Split, SplitAxis};
pub use bsp_procedural::{Plot, PlotClassifier, PlotKind};
pub use bsp_util::{road_width, RoadNetwork, EPSILON};
