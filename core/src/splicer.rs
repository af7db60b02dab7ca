//! Trait splicing: a pure reducer from (held traits, candidates, budget) to a new trait set.
//!
//! # Algorithm
//!
//! 1. Drop candidates the attacker already holds, candidates covered by a held or
//!    incoming merged trait, and repeated candidates.
//! 2. Fold every declared conflicting pair that is fully present across the
//!    attacker's base trait, its inherited traits and the remaining candidates
//!    into one merge unit. A merge unit adds the catalog's merged trait, removes
//!    any inherited constituent and releases a constituent base; it is accepted
//!    or rejected as a whole.
//! 3. Order units by charge ascending, then trait name, and let the overflow
//!    policy decide which fit under the budget.
//!
//! Nothing here mutates caller state. Identical inputs always give identical
//! outputs, independent of candidate order.

use std::collections::BTreeSet;

use gambit_types::{ConflictMerge, SkipReason, SkippedTrait, Trait, TraitName, TraitSet};

use crate::budget::BudgetOverflowPolicy;
use crate::catalog::TraitCatalog;

/// Which cost column a splice is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostModel {
    Complexity,
    Gas,
}

impl CostModel {
    #[must_use]
    pub const fn cost_of(self, t: &Trait) -> u32 {
        match self {
            CostModel::Complexity => t.cost,
            CostModel::Gas => t.gas_cost,
        }
    }

    fn cost_of_name(self, name: TraitName) -> u32 {
        self.cost_of(&TraitCatalog::trait_of(name))
    }
}

/// The attacker's current traits.
///
/// The base trait is counted as held for dedup and takes part in conflict
/// merges, but it is never removed. Once an inherited merged trait covers it,
/// its cost is no longer charged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldTraits {
    pub base: TraitName,
    pub inherited: TraitSet,
}

impl HeldTraits {
    #[must_use]
    pub fn new(base: TraitName, inherited: TraitSet) -> Self {
        Self { base, inherited }
    }

    #[must_use]
    pub fn holds(&self, name: TraitName) -> bool {
        self.base == name || self.inherited.contains(name)
    }

    /// An inherited merged trait already stands in for the base trait.
    fn base_covered(&self) -> bool {
        base_covered(self.base, &self.inherited)
    }

    fn covers(&self, name: TraitName) -> bool {
        TraitCatalog::subsumes(self.base, name)
            || self
                .inherited
                .iter()
                .any(|held| TraitCatalog::subsumes(held, name))
    }

    /// Base cost plus the catalog cost of every inherited trait. A base covered
    /// by an inherited merged trait costs nothing.
    #[must_use]
    pub fn complexity_cost(&self) -> u32 {
        total_complexity(self.base, &self.inherited)
    }
}

fn base_covered(base: TraitName, inherited: &TraitSet) -> bool {
    inherited
        .iter()
        .any(|held| TraitCatalog::subsumes(held, base))
}

#[must_use]
pub fn total_complexity(base: TraitName, inherited: &TraitSet) -> u32 {
    let base_cost = if base_covered(base, inherited) {
        0
    } else {
        TraitCatalog::trait_of(base).cost
    };
    base_cost
        + inherited
            .iter()
            .map(|name| TraitCatalog::trait_of(name).cost)
            .sum::<u32>()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceResult {
    /// Traits added to the inherited set, in acceptance order.
    pub applied: Vec<TraitName>,
    /// Candidates that were not applied, sorted by name.
    pub skipped: Vec<SkippedTrait>,
    pub conflicts_resolved: Vec<ConflictMerge>,
    /// Previously held traits dropped by a merge or evicted by `ReplaceTrait`.
    pub removed: Vec<TraitName>,
    pub new_traits: TraitSet,
    /// Charge against the budget, in the request's cost model.
    pub debit: u32,
    /// Refund from evicted traits, in the request's cost model.
    pub credit: u32,
    /// Charge of everything turned away for lack of budget.
    pub rejected_charge: u32,
    /// Complexity of the resulting profile, base trait included.
    pub new_cost: u32,
    /// `BlockCapture` rejected the whole gain.
    pub blocked: bool,
}

impl SpliceResult {
    #[must_use]
    pub fn gained_anything(&self) -> bool {
        !self.applied.is_empty()
    }
}

#[derive(Debug, Clone)]
struct SpliceUnit {
    adds: TraitName,
    sources: Vec<TraitName>,
    removes: Vec<TraitName>,
    merge: Option<ConflictMerge>,
    charge: u32,
}

impl SpliceUnit {
    fn new(
        adds: TraitName,
        sources: Vec<TraitName>,
        merge: Option<ConflictMerge>,
        held: &HeldTraits,
        model: CostModel,
    ) -> Self {
        let removes: Vec<TraitName> = held
            .inherited
            .iter()
            .filter(|&name| TraitCatalog::subsumes(adds, name))
            .collect();
        let mut released: u32 = removes.iter().map(|&name| model.cost_of_name(name)).sum();
        if TraitCatalog::subsumes(adds, held.base) && !held.base_covered() {
            released += model.cost_of_name(held.base);
        }
        let charge = model.cost_of_name(adds).saturating_sub(released);
        Self {
            adds,
            sources,
            removes,
            merge,
            charge,
        }
    }

    fn skip_entries(&self, reason: SkipReason) -> impl Iterator<Item = SkippedTrait> + '_ {
        self.sources
            .iter()
            .map(move |&name| SkippedTrait { name, reason })
    }
}

/// Merge `candidates` into `held` under `budget_remaining` and `policy`.
#[must_use]
pub fn splice(
    held: &HeldTraits,
    candidates: &[TraitName],
    budget_remaining: u32,
    policy: BudgetOverflowPolicy,
    model: CostModel,
) -> SpliceResult {
    let mut skipped = Vec::new();

    // Step 1: dedup against holdings, incoming merged traits, and each other.
    let incoming: BTreeSet<TraitName> = candidates.iter().copied().collect();
    let mut pool = BTreeSet::new();
    for &name in candidates {
        if held.holds(name) {
            skipped.push(SkippedTrait {
                name,
                reason: SkipReason::DuplicateTraitIgnored,
            });
        } else if held.covers(name)
            || incoming
                .iter()
                .any(|&other| TraitCatalog::subsumes(other, name))
        {
            skipped.push(SkippedTrait {
                name,
                reason: SkipReason::Subsumed,
            });
        } else if !pool.insert(name) {
            skipped.push(SkippedTrait {
                name,
                reason: SkipReason::DuplicateTraitIgnored,
            });
        }
    }

    // Step 2: conflict merges, before any budget filtering.
    let mut units = Vec::new();
    for rule in TraitCatalog::merge_rules() {
        let left_incoming = pool.contains(&rule.left);
        let right_incoming = pool.contains(&rule.right);
        let left_present = left_incoming || held.holds(rule.left);
        let right_present = right_incoming || held.holds(rule.right);
        if !(left_present && right_present && (left_incoming || right_incoming)) {
            continue;
        }
        let sources: Vec<TraitName> = [rule.left, rule.right]
            .into_iter()
            .filter(|name| pool.remove(name))
            .collect();
        let merge = ConflictMerge {
            left: rule.left,
            right: rule.right,
            merged: rule.merged,
        };
        tracing::debug!(
            left = %rule.left,
            right = %rule.right,
            merged = %rule.merged,
            "Conflict merge"
        );
        units.push(SpliceUnit::new(
            rule.merged,
            sources,
            Some(merge),
            held,
            model,
        ));
    }
    units.extend(
        pool.into_iter()
            .map(|name| SpliceUnit::new(name, vec![name], None, held, model)),
    );
    units.sort_by_key(|unit| (unit.charge, unit.adds.as_str()));

    // Step 3: policy.
    let total: u32 = units.iter().map(|unit| unit.charge).sum();
    let mut accepted: Vec<SpliceUnit> = Vec::new();
    let mut evicted: Vec<TraitName> = Vec::new();
    let mut blocked = false;
    let mut credit = 0;
    let mut rejected_charge = 0;

    match policy {
        BudgetOverflowPolicy::BlockCapture | BudgetOverflowPolicy::SkipTrait => {
            if total <= budget_remaining {
                accepted = units;
            } else {
                blocked = policy == BudgetOverflowPolicy::BlockCapture;
                rejected_charge = total;
                for unit in &units {
                    skipped.extend(unit.skip_entries(SkipReason::InsufficientBudget));
                }
            }
        }
        BudgetOverflowPolicy::PartialCapture | BudgetOverflowPolicy::ReplaceTrait => {
            let mut remaining = budget_remaining;
            let mut rejected = Vec::new();
            for unit in units {
                if unit.charge <= remaining {
                    remaining -= unit.charge;
                    accepted.push(unit);
                } else {
                    rejected.push(unit);
                }
            }

            for unit in rejected {
                let victim = (policy == BudgetOverflowPolicy::ReplaceTrait)
                    .then(|| replacement_victim(held, &accepted, &evicted, &unit, remaining, model))
                    .flatten();
                match victim {
                    Some((victim, refund)) => {
                        tracing::debug!(
                            evicted = %victim,
                            incoming = %unit.adds,
                            "Replacing lower-value trait"
                        );
                        remaining = remaining + refund - unit.charge;
                        credit += refund;
                        evicted.push(victim);
                        accepted.push(unit);
                    }
                    None => {
                        rejected_charge += unit.charge;
                        skipped.extend(unit.skip_entries(SkipReason::InsufficientBudget));
                    }
                }
            }
        }
    }

    let mut new_traits = held.inherited.clone();
    let mut applied = Vec::with_capacity(accepted.len());
    let mut removed = Vec::new();
    let mut conflicts_resolved = Vec::new();
    let mut debit = 0;
    for unit in &accepted {
        for &name in &unit.removes {
            if new_traits.remove(name) {
                removed.push(name);
            }
        }
        new_traits.insert(unit.adds);
        applied.push(unit.adds);
        conflicts_resolved.extend(unit.merge);
        debit += unit.charge;
    }
    for &name in &evicted {
        if new_traits.remove(name) {
            removed.push(name);
        }
    }
    removed.sort_unstable();
    skipped.sort_by_key(|entry| (entry.name.as_str(), entry.reason as u8));

    SpliceResult {
        applied,
        skipped,
        conflicts_resolved,
        removed,
        new_cost: total_complexity(held.base, &new_traits),
        new_traits,
        debit,
        credit,
        rejected_charge,
        blocked,
    }
}

/// Cheapest held inherited trait whose eviction makes room for `unit` and that is
/// worth strictly less than what comes in.
fn replacement_victim(
    held: &HeldTraits,
    accepted: &[SpliceUnit],
    evicted: &[TraitName],
    unit: &SpliceUnit,
    remaining: u32,
    model: CostModel,
) -> Option<(TraitName, u32)> {
    held.inherited
        .iter()
        .filter(|name| !evicted.contains(name) && !unit.removes.contains(name))
        .filter(|name| accepted.iter().all(|a| !a.removes.contains(name)))
        .map(|name| (name, model.cost_of_name(name)))
        .filter(|&(_, cost)| cost < unit.charge && remaining + cost >= unit.charge)
        .min_by_key(|&(name, cost)| (cost, name.as_str()))
}
