// src/grammar/symbol.rs

use crate::config::UnitId;
use crate::grammar::lod::LodGroup;
use crate::utils::Transform;
use serde::Serialize;

/// Index of a symbol inside its building's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Stock,
    Roof,
    Row,
}

/// One executed production. Inert once created: nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub parent: Option<SymbolId>,
    pub kind: SymbolKind,
    pub name: &'static str,
    /// Transform relative to the parent symbol.
    pub local: Transform,
    /// Transform relative to the building root, resolved at creation.
    pub resolved: Transform,
    pub width: u32,
    pub depth: u32,
    pub height_index: u32,
}

/// A unit a Row asked to have placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub symbol: SymbolId,
    pub unit: UnitId,
    /// Relative to the building root.
    pub transform: Transform,
}

/// Arena holding every symbol and placement of one building.
#[derive(Debug, Clone, Serialize)]
pub struct Building {
    /// Where the building root sits in the city.
    pub origin: Transform,
    symbols: Vec<Symbol>,
    placements: Vec<Placement>,
    #[serde(skip)]
    lod: LodGroup,
    #[serde(skip)]
    emitted: usize,
}

impl Building {
    pub fn new(origin: Transform) -> Self {
        Building {
            origin,
            symbols: Vec::new(),
            placements: Vec::new(),
            lod: LodGroup::default(),
            emitted: 0,
        }
    }

    /// Creates a symbol, composing its transform with the parent's once.
    pub fn spawn(
        &mut self,
        parent: Option<SymbolId>,
        kind: SymbolKind,
        name: &'static str,
        local: Transform,
        width: u32,
        depth: u32,
        height_index: u32,
    ) -> SymbolId {
        let resolved = match parent.and_then(|p| self.symbols.get(p.0)) {
            Some(p) => p.resolved.compose(&local),
            None => local,
        };
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            id,
            parent,
            kind,
            name,
            local,
            resolved,
            width,
            depth,
            height_index,
        });
        id
    }

    /// Records a unit placement under `symbol`, registering it with LOD 0.
    pub fn place(&mut self, symbol: SymbolId, unit: UnitId, local: Transform) -> usize {
        let transform = self.symbols[symbol.0].resolved.compose(&local);
        let index = self.placements.len();
        self.placements.push(Placement { symbol, unit, transform });
        self.lod.add_to_primary(index);
        index
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn count(&self, kind: SymbolKind) -> usize {
        self.symbols.iter().filter(|s| s.kind == kind).count()
    }

    /// Placements created since the last call, for streaming to a sink.
    pub fn take_unemitted(&mut self) -> &[Placement] {
        let start = self.emitted;
        self.emitted = self.placements.len();
        &self.placements[start..]
    }

    pub fn lod(&self) -> &LodGroup {
        &self.lod
    }

    /// Recalculates LOD bounds over all placements so far.
    pub fn refresh_lod(&mut self) {
        self.lod.recalculate_bounds(&self.placements);
    }

    pub fn lod_mut(&mut self) -> &mut LodGroup {
        &mut self.lod
    }

    /// Chain of ancestors from `id` up to the root, `id` first.
    pub fn lineage(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            chain.push(c);
            current = self.symbols.get(c.0).and_then(|s| s.parent);
        }
        chain
    }
}
