// src/grammar/mod.rs
//! Building shape grammar.
//!
//! A building is expanded from a root `Stock` production. Each production
//! creates one symbol in the building's arena, emits rows of units and hands
//! back the steps it wants run next. Steps can run inline (see
//! `expand_to_completion`) or through the city's production queue.

pub mod lod;
pub mod production;
pub mod roof;
pub mod row;
pub mod stock;
pub mod symbol;

pub use lod::{LodGroup, LodLevel, DEFAULT_LOD_THRESHOLD};
pub use production::{expand_to_completion, run_step, PendingStep, Production};
pub use roof::{RoofAxis, RoofRule};
pub use row::{PaletteRole, RowRule};
pub use stock::StockRule;
pub use symbol::{Building, Placement, Symbol, SymbolId, SymbolKind};
