// src/lib.rs
//! Procedural city generation.
//!
//! A city extent is cut into plots by a binary partitioner with road
//! corridors (or a regular grid), each buildable plot gets a building grown
//! by a small shape grammar (floors, roofs, rows of units), and an optional
//! marching-squares overlay is laid over the occupied cells. Output goes to a
//! host-provided `PlacementSink`.

pub mod bsp;
pub mod city;
pub mod config;
pub mod error;
pub mod grammar;
pub mod grid;
pub mod placement;
pub mod schedule;
pub mod utils;

pub use city::{CityGenerator, PassStats, Profile};
pub use config::{BuildingConfig, CityConfig, GeneratorConfig, LayoutConfig, RngMode, ValidatedConfig};
pub use error::{GenError, Result};
pub use placement::{NoObstacles, OccupancyQuery, PlacedUnit, PlacementHandle, PlacementSink, RecordingSink};
pub use schedule::{ProductionQueue, QueueHandle};
