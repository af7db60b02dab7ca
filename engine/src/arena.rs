//! Per-match state: the unit arena, one genetic profile per unit, and the
//! budget ledgers.
//!
//! Units and profiles live in parallel vectors indexed by [`UnitId`]. Ids are
//! handed out in spawn order and never reused within a match, so a dead unit's
//! profile stays readable for lineage and end-of-match projection.

use std::collections::HashMap;

use thiserror::Error;

use gambit_core::{
    AccountLedger, BudgetAccount, ComplexityBudget, GasAccount, GeneticProfile, InsufficientBudget,
    LedgerError, VersionedAccount,
};
use gambit_types::{CaptureId, MatchId, Position, Side, TraitName, Unit, UnitId, UnitKind};

use crate::config::MatchRules;
use crate::resolver::EvolutionOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("profile belongs to unit {found}, next unit id is {expected}")]
    OwnerMismatch { expected: UnitId, found: UnitId },
    #[error("profile does not fit the unit's complexity budget: {0}")]
    OverBudget(#[from] InsufficientBudget),
}

#[derive(Debug)]
pub struct MatchState {
    id: MatchId,
    rules: MatchRules,
    units: Vec<Unit>,
    profiles: Vec<GeneticProfile>,
    complexity: AccountLedger<UnitId>,
    gas: AccountLedger<Side>,
    resolved: HashMap<CaptureId, EvolutionOutcome>,
    last_decay_turn: Option<u32>,
}

impl MatchState {
    #[must_use]
    pub fn new(id: MatchId, rules: MatchRules) -> Self {
        let mut gas = AccountLedger::new();
        for side in [Side::White, Side::Black] {
            gas.open(side, BudgetAccount::Gas(GasAccount::new(rules.starting_gas)));
        }
        Self {
            id,
            rules,
            units: Vec::new(),
            profiles: Vec::new(),
            complexity: AccountLedger::new(),
            gas,
            resolved: HashMap::new(),
            last_decay_turn: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> MatchId {
        self.id
    }

    #[must_use]
    pub const fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// Id the next spawned unit will get.
    #[must_use]
    pub fn next_unit_id(&self) -> UnitId {
        UnitId::new(u32::try_from(self.units.len()).unwrap_or(u32::MAX))
    }

    /// Spawn a fresh unit: no inherited traits, generation 1.
    pub fn spawn(
        &mut self,
        kind: UnitKind,
        side: Side,
        position: Position,
        turn: u32,
    ) -> Result<UnitId, SpawnError> {
        let profile = GeneticProfile::spawn(self.next_unit_id(), kind, turn);
        self.spawn_profile(side, position, profile)
    }

    /// Spawn a unit around an existing profile, e.g. one deployed from inventory.
    ///
    /// The profile must already be owned by [`Self::next_unit_id`].
    pub fn spawn_profile(
        &mut self,
        side: Side,
        position: Position,
        profile: GeneticProfile,
    ) -> Result<UnitId, SpawnError> {
        let id = self.next_unit_id();
        if profile.owner() != id {
            return Err(SpawnError::OwnerMismatch {
                expected: id,
                found: profile.owner(),
            });
        }
        let budget = ComplexityBudget::with_spent(profile.complexity_cost(), self.rules.max_complexity)?;

        self.complexity.open(id, BudgetAccount::Complexity(budget));
        self.units.push(Unit {
            id,
            kind: profile.kind(),
            side,
            position,
            alive: true,
        });
        self.profiles.push(profile);
        tracing::debug!(unit = %id, %side, "Unit spawned");
        Ok(id)
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    #[must_use]
    pub fn profile(&self, id: UnitId) -> Option<&GeneticProfile> {
        self.profiles.get(id.index())
    }

    pub(crate) fn profile_mut(&mut self, id: UnitId) -> Option<&mut GeneticProfile> {
        self.profiles.get_mut(id.index())
    }

    /// Reveal a hidden trait a unit has shown on the board.
    pub fn reveal(&mut self, id: UnitId, name: TraitName) -> bool {
        let Some(profile) = self.profile_mut(id) else {
            return false;
        };
        profile.reveal(name);
        profile.is_revealed(name)
    }

    pub fn complexity_account(&self, id: UnitId) -> Result<VersionedAccount, LedgerError> {
        self.complexity.snapshot(id)
    }

    pub fn gas_account(&self, side: Side) -> Result<VersionedAccount, LedgerError> {
        self.gas.snapshot(side)
    }

    pub(crate) fn complexity_ledger(&self) -> &AccountLedger<UnitId> {
        &self.complexity
    }

    pub(crate) fn gas_ledger(&self) -> &AccountLedger<Side> {
        &self.gas
    }

    #[must_use]
    pub fn outcome(&self, capture: CaptureId) -> Option<&EvolutionOutcome> {
        self.resolved.get(&capture)
    }

    #[must_use]
    pub fn is_resolved(&self, capture: CaptureId) -> bool {
        self.resolved.contains_key(&capture)
    }

    /// Apply the board side of a capture: the defender leaves, the attacker takes its square.
    pub(crate) fn move_capture(&mut self, attacker: UnitId, defender: UnitId) -> Option<Position> {
        let target = self.units.get(defender.index())?.position;
        if let Some(unit) = self.units.get_mut(defender.index()) {
            unit.alive = false;
        }
        if let Some(unit) = self.units.get_mut(attacker.index()) {
            unit.position = target;
        }
        Some(target)
    }

    pub(crate) fn record(&mut self, outcome: EvolutionOutcome) {
        self.resolved.insert(outcome.capture_id, outcome);
    }

    /// Per-turn decay of spent complexity for every living unit.
    ///
    /// Each account is read, decayed and committed with a version check; an
    /// account that changed in between keeps its value and decays on a later
    /// tick. A turn at or before the last ticked one is ignored. Returns how
    /// many accounts decayed.
    pub fn tick_decay(&mut self, turn: u32) -> usize {
        let Some(rule) = self.rules.decay else {
            return 0;
        };
        if self.last_decay_turn.is_some_and(|last| turn <= last) {
            tracing::debug!(turn, "Decay already ticked");
            return 0;
        }
        self.last_decay_turn = Some(turn);
        let mut decayed = 0;
        for unit in self.units.iter().filter(|unit| unit.alive) {
            let Some(profile) = self.profiles.get(unit.id.index()) else {
                continue;
            };
            let Ok(read) = self.complexity.snapshot(unit.id) else {
                continue;
            };
            let Some(budget) = read.account.as_complexity() else {
                continue;
            };
            let next = budget.tick_decay(profile.idle_turns(turn), &rule);
            if next == budget {
                continue;
            }
            match self
                .complexity
                .compare_and_swap(unit.id, read.version, BudgetAccount::Complexity(next))
            {
                Ok(_) => decayed += 1,
                Err(err) => tracing::warn!(unit = %unit.id, "Decay skipped: {err}"),
            }
        }
        decayed
    }
}
