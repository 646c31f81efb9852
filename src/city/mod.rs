// src/city/mod.rs
//! City generation driver.
//!
//! A pass is always `cancel pending -> partition -> populate`. Populating
//! places one root unit per buildable plot and schedules that building's
//! ground floor; the grammar then runs either through the production queue
//! (`tick` / `run_to_completion`) or, for per-plot randomness without a build
//! delay, straight away and in parallel.

pub mod grid_city;

pub use grid_city::GridCity;

use crate::bsp::{PartitionTree, Partitioner, Plot, PlotClassifier, PlotKind};
use crate::config::{BuildingStyle, GeneratorConfig, RngMode, ValidatedConfig};
use crate::error::Result;
use crate::grammar::{expand_to_completion, run_step, Building, PendingStep, Production, StockRule};
use crate::grid::{marching, ValueGrid};
use crate::placement::{NoObstacles, OccupancyQuery, PlacementHandle, PlacementSink};
use crate::schedule::{ProductionQueue, QueueHandle, ScheduledStep};
use crate::utils::util::mix_seed;
use crate::utils::{QuarterTurns, Transform};
use log::{debug, info, trace, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::Instant;

/// Which building grammar a plot gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Profile {
    Residential,
    Central,
}

/// One building of the current pass.
struct BuildingSlot {
    plot: Plot,
    profile: Profile,
    handle: PlacementHandle,
    building: Building,
    /// Set in per-plot mode; otherwise the pass's shared stream is used.
    rng: Option<ChaCha8Rng>,
}

/// Counts for the last pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub epoch: u64,
    pub plots: usize,
    pub buildings: usize,
    pub roads: usize,
    pub placements: usize,
    pub overlay_tiles: usize,
}

pub struct CityGenerator {
    config: ValidatedConfig,
    queue: ProductionQueue,
    rng: ChaCha8Rng,
    epoch: u64,
    obstacles: Box<dyn OccupancyQuery>,
    tree: Option<PartitionTree>,
    value_grid: Option<ValueGrid>,
    plots: Vec<Plot>,
    buildings: Vec<BuildingSlot>,
    overlay_tiles: Option<usize>,
}

fn style_for(config: &ValidatedConfig, profile: Profile) -> &BuildingStyle {
    match profile {
        Profile::Residential => &config.residential,
        Profile::Central => &config.central,
    }
}

fn expand_slot(config: &ValidatedConfig, slot: &mut BuildingSlot, root: Production) -> Result<()> {
    let style = style_for(config, slot.profile);
    match slot.rng.as_mut() {
        Some(rng) => expand_to_completion(&mut slot.building, root, style, rng),
        None => {
            warn!("building at cell {:?} has no stream of its own; skipped", slot.plot.cell);
            Ok(())
        }
    }
}

#[cfg(feature = "parallel")]
fn expand_slots(config: &ValidatedConfig, slots: &mut [BuildingSlot], roots: Vec<Production>) -> Result<()> {
    use rayon::prelude::*;
    let results: Vec<Result<()>> = slots
        .par_iter_mut()
        .zip(roots)
        .map(|(slot, root)| expand_slot(config, slot, root))
        .collect();
    results.into_iter().collect()
}

#[cfg(not(feature = "parallel"))]
fn expand_slots(config: &ValidatedConfig, slots: &mut [BuildingSlot], roots: Vec<Production>) -> Result<()> {
    slots
        .iter_mut()
        .zip(roots)
        .try_for_each(|(slot, root)| expand_slot(config, slot, root))
}

/// Streams a building's new placements to the sink, scaled to world units.
fn flush<S: PlacementSink + ?Sized>(slot: &mut BuildingSlot, unit_size: f64, sink: &mut S) {
    let parent = slot.handle;
    for p in slot.building.take_unemitted() {
        sink.place_unit(&p.unit, p.transform.position * unit_size, p.transform.rotation, Some(parent));
    }
}

impl CityGenerator {
    /// Validates the configuration; a bad one never starts a pass.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let config = config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(CityGenerator {
            config,
            queue: ProductionQueue::new(),
            rng,
            epoch: 0,
            obstacles: Box::new(NoObstacles),
            tree: None,
            value_grid: None,
            plots: Vec::new(),
            buildings: Vec::new(),
            overlay_tiles: None,
        })
    }

    /// Existing scene geometry that plots must avoid.
    pub fn with_obstacles(mut self, obstacles: impl OccupancyQuery + 'static) -> Self {
        self.obstacles = Box::new(obstacles);
        self
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn handle(&self) -> QueueHandle {
        self.queue.handle()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    pub fn partition_tree(&self) -> Option<&PartitionTree> {
        self.tree.as_ref()
    }

    pub fn value_grid(&self) -> Option<&ValueGrid> {
        self.value_grid.as_ref()
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter().map(|slot| &slot.building)
    }

    pub fn stats(&self) -> PassStats {
        PassStats {
            epoch: self.epoch,
            plots: self.plots.len(),
            buildings: self.buildings.len(),
            roads: self.tree.as_ref().map_or(0, |t| t.roads.len()),
            placements: self.buildings.iter().map(|s| s.building.placements().len()).sum(),
            overlay_tiles: self.overlay_tiles.unwrap_or(0),
        }
    }

    /// One full pass, drained synchronously.
    pub fn generate<S: PlacementSink + ?Sized>(&mut self, sink: &mut S) -> Result<PassStats> {
        self.rebuild(sink, Instant::now())?;
        self.run_to_completion(sink)?;
        Ok(self.stats())
    }

    /// Cancels pending work, tears the previous pass down and starts a new one.
    pub fn rebuild<S: PlacementSink + ?Sized>(&mut self, sink: &mut S, now: Instant) -> Result<()> {
        let dropped = self.queue.cancel_pending();
        sink.clear();
        self.buildings.clear();
        self.plots.clear();
        self.tree = None;
        self.value_grid = None;
        self.overlay_tiles = None;

        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.epoch = self.queue.begin_pass();
        info!(
            "rebuild: epoch {}, seed {}, {} pending steps dropped",
            self.epoch, self.config.seed, dropped
        );

        self.partition()?;
        self.populate(sink, now)
    }

    /// Splits the extent into plots. Must run before `populate`.
    pub fn partition(&mut self) -> Result<()> {
        let city = &self.config.city;
        match GridCity::from_layout(&city.layout) {
            Some(grid) => {
                self.plots = grid.plots(&mut self.rng);
            }
            None => {
                let tree = match Partitioner::from_config(city).build(&mut self.rng) {
                    Ok(tree) => tree,
                    Err(e) if e.is_recoverable() => {
                        warn!("partition produced nothing: {}", e);
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                };
                let cs = city.cell_size;
                let mut grid = ValueGrid::with_noise(
                    (city.width / cs).ceil() as usize,
                    (city.depth / cs).ceil() as usize,
                    cs,
                    city.noise_scale,
                    &mut self.rng,
                )?;
                if let Some((w, d)) = city.no_build_zone {
                    grid.set_no_build_zone(w as usize, d as usize);
                }
                let classifier = PlotClassifier::from_config(city);
                self.plots = classifier.classify_tree(&tree, self.obstacles.as_ref(), Some(&grid));
                self.tree = Some(tree);
                self.value_grid = Some(grid);
            }
        }
        Ok(())
    }

    fn footprint_fit(&self) -> u32 {
        let city = &self.config.city;
        match GridCity::from_layout(&city.layout) {
            Some(grid) => grid.fit(city.unit_size),
            None => (city.cell_size / city.unit_size).floor().max(0.0) as u32,
        }
    }

    /// Places a root unit per buildable plot and schedules its ground floor.
    pub fn populate<S: PlacementSink + ?Sized>(&mut self, sink: &mut S, now: Instant) -> Result<()> {
        let fit = self.footprint_fit();
        let per_plot = self.config.city.rng_mode == RngMode::PerPlot;
        let immediate = self.expands_immediately();
        let first = self.buildings.len();
        let mut roots = Vec::new();
        let plots: Vec<Plot> = self.plots.iter().copied().filter(Plot::is_buildable).collect();

        for plot in plots {
            let profile = match plot.kind {
                PlotKind::CentralZone => Profile::Central,
                _ => Profile::Residential,
            };
            let mut own_rng = per_plot
                .then(|| ChaCha8Rng::seed_from_u64(mix_seed(self.config.seed, plot.cell.0, plot.cell.1)));
            let rng = match own_rng.as_mut() {
                Some(r) => r,
                None => &mut self.rng,
            };
            let style = style_for(&self.config, profile);

            let unit = self.config.building_units.choose(rng).clone();
            let (width, depth) = style.random_footprint(rng, fit);
            let root = Production::Stock(StockRule::initialize(width, depth, 0, style, rng));
            let origin = Transform::from_position(plot.center());
            let handle = sink.place_unit(&unit, origin.position, QuarterTurns::IDENTITY, None);
            debug!(
                "{:?} building {}x{} at cell {:?} under {:?}",
                profile, width, depth, plot.cell, handle
            );

            let index = self.buildings.len();
            self.buildings.push(BuildingSlot {
                plot,
                profile,
                handle,
                building: Building::new(origin),
                rng: own_rng,
            });
            if immediate {
                roots.push(root);
            } else {
                let item = ScheduledStep { building: index, step: PendingStep::root(root) };
                self.queue.push(self.epoch, now, item);
            }
        }
        info!("populate finished: {} buildings", self.buildings.len() - first);

        if immediate {
            self.expand_now(first, roots)?;
            let unit_size = self.config.city.unit_size;
            for slot in &mut self.buildings[first..] {
                flush(slot, unit_size, sink);
            }
            self.finish_pass(sink);
        }
        Ok(())
    }

    /// Per-plot streams without a delay need no queue: buildings are independent.
    fn expands_immediately(&self) -> bool {
        self.config.city.rng_mode == RngMode::PerPlot && self.config.city.build_delay_ms == 0
    }

    /// Expands `roots[k]` into building `first + k`. Placements are streamed
    /// afterwards, in plot order.
    fn expand_now(&mut self, first: usize, roots: Vec<Production>) -> Result<()> {
        expand_slots(&self.config, &mut self.buildings[first..], roots)
    }

    /// Runs due steps and streams their placements. Handles rebuild requests
    /// from a `QueueHandle` first. Returns the number of steps run.
    pub fn tick<S: PlacementSink + ?Sized>(&mut self, sink: &mut S, now: Instant) -> Result<usize> {
        if self.queue.take_rebuild_request() {
            self.rebuild(sink, now)?;
        }
        let mut ran = 0;
        while let Some((epoch, item)) = self.queue.pop_due(now) {
            self.run_scheduled(epoch, item, sink, now)?;
            ran += 1;
        }
        if self.queue.is_empty() {
            self.finish_pass(sink);
        }
        Ok(ran)
    }

    /// Runs every pending step, ignoring due times.
    pub fn run_to_completion<S: PlacementSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize> {
        let mut ran = 0;
        while let Some((epoch, item)) = self.queue.pop_next() {
            self.run_scheduled(epoch, item, sink, Instant::now())?;
            ran += 1;
        }
        self.finish_pass(sink);
        Ok(ran)
    }

    fn run_scheduled<S: PlacementSink + ?Sized>(
        &mut self,
        epoch: u64,
        item: ScheduledStep,
        sink: &mut S,
        now: Instant,
    ) -> Result<()> {
        if let Err(e) = self.queue.check_epoch(epoch) {
            trace!("skipping step: {}", e);
            return Ok(());
        }
        let Some(slot) = self.buildings.get_mut(item.building) else {
            trace!("skipping step for unknown building {}", item.building);
            return Ok(());
        };
        let style = style_for(&self.config, slot.profile);
        let rng = match slot.rng.as_mut() {
            Some(r) => r,
            None => &mut self.rng,
        };
        let next = run_step(item.step, &mut slot.building, style, rng)?;
        flush(slot, self.config.city.unit_size, sink);

        let due = now + self.config.city.build_delay();
        for step in next {
            self.queue.push(epoch, due, ScheduledStep { building: item.building, step });
        }
        Ok(())
    }

    /// Refreshes LOD bounds and lays the marching-squares overlay once per pass.
    /// A pass cancelled through a `QueueHandle` is never finished.
    fn finish_pass<S: PlacementSink + ?Sized>(&mut self, sink: &mut S) {
        if self.overlay_tiles.is_some() {
            return;
        }
        let current = self.queue.epoch();
        if current != self.epoch {
            trace!("not finishing pass {}: epoch is now {}", self.epoch, current);
            return;
        }
        for slot in &mut self.buildings {
            slot.building.refresh_lod();
        }
        let mut tiles = match &self.config.corners {
            Some(corners) => match self.occupancy_grid() {
                Some(grid) => marching::overlay(&grid, corners),
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        // The grid layout raster uses the column width on both axes.
        if let Some(grid) = GridCity::from_layout(&self.config.city.layout) {
            let stretch = grid.row_width / grid.column_width;
            for tile in &mut tiles {
                tile.position.z *= stretch;
            }
        }
        for tile in &tiles {
            sink.place_unit(&tile.unit, tile.position, tile.rotation, None);
        }
        self.overlay_tiles = Some(tiles.len());
        info!("pass {} complete: {:?}", self.epoch, self.stats());
    }

    /// 0/1 grid of the plots that received a building. A grid layout gets
    /// one cell per layout cell, indexed by the plot's column and row.
    pub fn occupancy_grid(&self) -> Option<ValueGrid> {
        let city = &self.config.city;
        if let Some(layout) = GridCity::from_layout(&city.layout) {
            let mut grid =
                ValueGrid::new(layout.columns as usize, layout.rows as usize, layout.column_width).ok()?;
            for slot in &self.buildings {
                grid.set_cell(slot.plot.cell.0, slot.plot.cell.1, 1.0);
            }
            return Some(grid);
        }

        let cs = city.cell_size;
        let mut grid = ValueGrid::new(
            (city.width / cs).ceil() as usize,
            (city.depth / cs).ceil() as usize,
            cs,
        )
        .ok()?;
        for slot in &self.buildings {
            if let Some((i, j)) = grid.get_row_col(slot.plot.center()) {
                grid.set_cell(i, j, 1.0);
            }
        }
        Some(grid)
    }
}
