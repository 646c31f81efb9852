// src/grammar/production.rs

use crate::config::BuildingStyle;
use crate::error::Result;
use crate::grammar::roof::RoofRule;
use crate::grammar::row::RowRule;
use crate::grammar::stock::StockRule;
use crate::grammar::symbol::{Building, SymbolId, SymbolKind};
use crate::utils::Transform;
use log::{debug, trace};
use rand::Rng;
use std::collections::VecDeque;

/// A production rule waiting to fire. Consumed by `execute`, so it runs once.
#[derive(Debug, Clone, PartialEq)]
pub enum Production {
    Stock(StockRule),
    Roof(RoofRule),
    Row(RowRule),
}

/// A production together with where its symbol will hang in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingStep {
    pub parent: Option<SymbolId>,
    pub local: Transform,
    pub production: Production,
}

impl PendingStep {
    pub fn root(production: Production) -> Self {
        PendingStep { parent: None, local: Transform::IDENTITY, production }
    }

    pub fn child(parent: SymbolId, local: Transform, production: Production) -> Self {
        PendingStep { parent: Some(parent), local, production }
    }
}

impl Production {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Production::Stock(_) => SymbolKind::Stock,
            Production::Roof(_) => SymbolKind::Roof,
            Production::Row(_) => SymbolKind::Row,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Production::Stock(_) => "stock",
            Production::Roof(_) => "roof",
            Production::Row(row) => row.name,
        }
    }

    /// (width, depth, height index) of the symbol this production creates.
    pub fn footprint(&self) -> (u32, u32, u32) {
        match self {
            Production::Stock(s) => (s.width, s.depth, s.height_index),
            Production::Roof(r) => (r.width, r.depth, r.height_index),
            Production::Row(r) => (r.count, 1, 0),
        }
    }

    /// Creates this production's symbol, emits its content and returns the
    /// steps it schedules. A degenerate footprint fails before any symbol exists.
    pub fn execute<R: Rng + ?Sized>(
        self,
        parent: Option<SymbolId>,
        local: Transform,
        building: &mut Building,
        style: &BuildingStyle,
        rng: &mut R,
    ) -> Result<Vec<PendingStep>> {
        match &self {
            Production::Stock(s) => s.check()?,
            Production::Roof(r) => r.check()?,
            Production::Row(r) => r.check()?,
        }
        let (width, depth, height) = self.footprint();
        let symbol = building.spawn(parent, self.kind(), self.name(), local, width, depth, height);
        trace!("{:?} {} {}x{} at h{}", symbol, self.name(), width, depth, height);

        match self {
            Production::Stock(stock) => stock.produce(symbol, building, style, rng),
            Production::Roof(roof) => roof.produce(symbol, building, style, rng),
            Production::Row(row) => {
                row.produce(symbol, building, style, rng)?;
                Ok(Vec::new())
            }
        }
    }
}

/// Runs one step. Geometry failures end that branch with an empty production.
pub fn run_step<R: Rng + ?Sized>(
    step: PendingStep,
    building: &mut Building,
    style: &BuildingStyle,
    rng: &mut R,
) -> Result<Vec<PendingStep>> {
    let PendingStep { parent, local, production } = step;
    match production.execute(parent, local, building, style, rng) {
        Ok(next) => Ok(next),
        Err(e) if e.is_recoverable() => {
            debug!("production ended early: {}", e);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Emits a row under `parent` immediately. Rows never schedule anything.
pub(crate) fn emit_row<R: Rng + ?Sized>(
    parent: SymbolId,
    local: Transform,
    row: RowRule,
    building: &mut Building,
    style: &BuildingStyle,
    rng: &mut R,
) -> Result<()> {
    run_step(PendingStep::child(parent, local, Production::Row(row)), building, style, rng)?;
    Ok(())
}

/// Expands a building synchronously, breadth first, until nothing is pending.
pub fn expand_to_completion<R: Rng + ?Sized>(
    building: &mut Building,
    root: Production,
    style: &BuildingStyle,
    rng: &mut R,
) -> Result<()> {
    let mut pending = VecDeque::from([PendingStep::root(root)]);
    while let Some(step) = pending.pop_front() {
        pending.extend(run_step(step, building, style, rng)?);
    }
    building.refresh_lod();
    Ok(())
}
