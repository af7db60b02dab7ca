//! Genetic profile of a single unit.

use std::iter;

use serde::{Deserialize, Serialize};

use gambit_types::{SkipReason, SkippedTrait, TraitName, TraitSet, UnitId, UnitKind};

use crate::catalog::TraitCatalog;
use crate::splicer::{HeldTraits, SpliceResult, total_complexity};

/// Traits a unit has inherited, plus the audit trail of how it got them.
///
/// Created at spawn with no inherited traits and generation 1. Only the capture
/// resolver and the decision gate are expected to mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneticProfile {
    owner: UnitId,
    kind: UnitKind,
    inherited: TraitSet,
    /// Hidden traits (own or inherited) that have been revealed on the board.
    revealed: TraitSet,
    generation: u32,
    lineage: Vec<UnitId>,
    captures_made: u32,
    last_splice_turn: u32,
}

/// What a defender can pass on when captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub candidates: Vec<TraitName>,
    pub withheld: Vec<SkippedTrait>,
}

impl GeneticProfile {
    #[must_use]
    pub fn spawn(owner: UnitId, kind: UnitKind, turn: u32) -> Self {
        Self {
            owner,
            kind,
            inherited: TraitSet::new(),
            revealed: TraitSet::new(),
            generation: 1,
            lineage: Vec::new(),
            captures_made: 0,
            last_splice_turn: turn,
        }
    }

    /// Rebuild a profile from a persisted trait snapshot.
    ///
    /// Lineage is match-local and starts empty; generation counts the evolutions
    /// the piece already went through.
    #[must_use]
    pub fn rehydrate(
        owner: UnitId,
        kind: UnitKind,
        inherited: TraitSet,
        evolution_count: u32,
        turn: u32,
    ) -> Self {
        Self {
            inherited,
            generation: 1 + evolution_count,
            ..Self::spawn(owner, kind, turn)
        }
    }

    #[must_use]
    pub const fn owner(&self) -> UnitId {
        self.owner
    }

    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    #[must_use]
    pub const fn base_trait(&self) -> TraitName {
        TraitCatalog::base_trait(self.kind).name
    }

    #[must_use]
    pub fn inherited(&self) -> &TraitSet {
        &self.inherited
    }

    #[must_use]
    pub fn held(&self) -> HeldTraits {
        HeldTraits::new(self.base_trait(), self.inherited.clone())
    }

    /// Recomputed from the catalog on every call.
    #[must_use]
    pub fn complexity_cost(&self) -> u32 {
        total_complexity(self.base_trait(), &self.inherited)
    }

    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Successful splices so far.
    #[must_use]
    pub const fn evolution_count(&self) -> u32 {
        self.generation - 1
    }

    #[must_use]
    pub fn lineage(&self) -> &[UnitId] {
        &self.lineage
    }

    #[must_use]
    pub const fn captures_made(&self) -> u32 {
        self.captures_made
    }

    #[must_use]
    pub const fn idle_turns(&self, turn: u32) -> u32 {
        turn.saturating_sub(self.last_splice_turn)
    }

    pub fn reveal(&mut self, name: TraitName) {
        if TraitCatalog::trait_of(name).hidden {
            self.revealed.insert(name);
        }
    }

    #[must_use]
    pub fn is_revealed(&self, name: TraitName) -> bool {
        !TraitCatalog::trait_of(name).hidden || self.revealed.contains(name)
    }

    /// Base trait plus inherited traits, minus anything non-inheritable or still hidden.
    #[must_use]
    pub fn extract_inheritable(&self) -> Extraction {
        let mut extraction = Extraction::default();
        let base = TraitCatalog::base_trait(self.kind);
        for name in iter::once(base.name).chain(self.inherited.iter()) {
            let entry = TraitCatalog::trait_of(name);
            if !entry.inheritable {
                extraction.withheld.push(SkippedTrait {
                    name,
                    reason: SkipReason::NotInheritable,
                });
            } else if !self.is_revealed(name) {
                extraction.withheld.push(SkippedTrait {
                    name,
                    reason: SkipReason::HiddenUnrevealed,
                });
            } else {
                extraction.candidates.push(name);
            }
        }
        extraction
    }

    /// Record a capture and, if the splice gained anything, commit it.
    ///
    /// Generation moves by exactly one per committing splice. Returns whether the
    /// profile's traits changed.
    pub fn commit_capture(&mut self, defender: UnitId, splice: &SpliceResult, turn: u32) -> bool {
        self.lineage.push(defender);
        self.captures_made += 1;
        if !splice.gained_anything() {
            return false;
        }
        self.inherited = splice.new_traits.clone();
        self.revealed = self
            .revealed
            .iter()
            .filter(|&name| self.inherited.contains(name) || name == self.base_trait())
            .collect();
        self.generation += 1;
        self.last_splice_turn = turn;
        true
    }

    /// Count a decided-but-empty evolution as a generation.
    pub fn bump_generation(&mut self) {
        self.generation += 1;
    }
}
