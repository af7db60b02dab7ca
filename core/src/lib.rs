//! Core evolution logic for Gambit.
//!
//! This crate holds the pure parts of capture-triggered inheritance: the static
//! trait catalog, budget accounts, the splice reducer, genetic profiles and
//! rarity classification. Nothing here performs IO or blocks.

pub mod budget;
pub mod catalog;
pub mod ledger;
mod profile;
pub mod rarity;
pub mod splicer;

pub use budget::{
    BudgetAccount, BudgetOverflowPolicy, ComplexityBudget, DecayRule, GasAccount,
    InsufficientBudget,
};
pub use catalog::{MergeRule, TraitCatalog};
pub use ledger::{AccountLedger, LedgerError, VersionedAccount};
pub use profile::{Extraction, GeneticProfile};
pub use rarity::classify;
pub use splicer::{CostModel, HeldTraits, SpliceResult, splice, total_complexity};
