//! Core domain types for Gambit.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the engine.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod events;
mod ids;
mod rarity;
mod traits;
mod unit;

pub use events::{
    CaptureEvent, CaptureResolvedEvent, ConflictMerge, EvolutionAppliedEvent, EvolutionSkipCause,
    EvolutionSkippedEvent, SkipReason, SkippedTrait,
};
pub use ids::{CaptureId, MatchId, PieceId, UnitId};
pub use rarity::RarityTier;
pub use traits::{Trait, TraitName, TraitSet, UnknownTraitName};
pub use unit::{Position, Side, Unit, UnitKind};

use serde::{Deserialize, Serialize};

/// Which budget a cost is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    /// Lifetime ceiling on a unit's total trait cost.
    Complexity,
    /// Per-match, per-player allowance spent on accepting traits.
    Gas,
}

impl BudgetKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BudgetKind::Complexity => "complexity",
            BudgetKind::Gas => "gas",
        }
    }
}
