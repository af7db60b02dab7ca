//! Budget accounts.
//!
//! Both variants are small `Copy` values. A debit never mutates in place: it
//! returns the new state, so a failed debit leaves the caller's account exactly
//! as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gambit_types::BudgetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("insufficient {} budget: cost {cost} exceeds remaining {remaining}", .kind.as_str())]
pub struct InsufficientBudget {
    pub kind: BudgetKind,
    pub cost: u32,
    pub remaining: u32,
}

/// Lifetime complexity budget of a single unit.
///
/// # Invariants
///
/// - `current <= max` at all times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityBudget {
    current: u32,
    max: u32,
}

/// Decay of a unit's spent complexity while it sits idle.
///
/// Applied only through [`ComplexityBudget::tick_decay`]; nothing decays implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayRule {
    pub every_idle_turns: u32,
    pub amount: u32,
    pub floor: u32,
}

impl ComplexityBudget {
    pub const DEFAULT_MAX: u32 = 100;

    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: 0, max }
    }

    /// Budget that has already spent `current`, e.g. a unit's base trait cost at spawn.
    pub fn with_spent(current: u32, max: u32) -> Result<Self, InsufficientBudget> {
        Self::new(max).debit(current)
    }

    #[must_use]
    pub const fn current(self) -> u32 {
        self.current
    }

    #[must_use]
    pub const fn max(self) -> u32 {
        self.max
    }

    #[must_use]
    pub const fn remaining(self) -> u32 {
        self.max - self.current
    }

    #[must_use]
    pub const fn can_afford(self, cost: u32) -> bool {
        cost <= self.remaining()
    }

    pub fn debit(self, cost: u32) -> Result<Self, InsufficientBudget> {
        if !self.can_afford(cost) {
            return Err(InsufficientBudget {
                kind: BudgetKind::Complexity,
                cost,
                remaining: self.remaining(),
            });
        }
        Ok(Self {
            current: self.current + cost,
            max: self.max,
        })
    }

    /// Release `cost` back to the budget, e.g. when a held trait is replaced.
    #[must_use]
    pub const fn credit(self, cost: u32) -> Self {
        Self {
            current: self.current.saturating_sub(cost),
            max: self.max,
        }
    }

    /// External per-turn tick. Decays once every `rule.every_idle_turns` idle turns,
    /// never below `rule.floor` and never upward.
    #[must_use]
    pub fn tick_decay(self, idle_turns: u32, rule: &DecayRule) -> Self {
        if rule.every_idle_turns == 0
            || idle_turns == 0
            || idle_turns % rule.every_idle_turns != 0
            || self.current <= rule.floor
        {
            return self;
        }
        let decayed = self.current.saturating_sub(rule.amount).max(rule.floor);
        tracing::debug!(
            from = self.current,
            to = decayed,
            idle_turns,
            "Complexity decayed"
        );
        Self {
            current: decayed,
            max: self.max,
        }
    }
}

impl Default for ComplexityBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX)
    }
}

/// Per-player, per-match gas allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasAccount {
    remaining: u32,
    starting: u32,
}

impl GasAccount {
    pub const DEFAULT_STARTING: u32 = 10;

    #[must_use]
    pub const fn new(starting: u32) -> Self {
        Self {
            remaining: starting,
            starting,
        }
    }

    #[must_use]
    pub const fn remaining(self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub const fn starting(self) -> u32 {
        self.starting
    }

    #[must_use]
    pub const fn can_afford(self, cost: u32) -> bool {
        cost <= self.remaining
    }

    pub fn debit(self, cost: u32) -> Result<Self, InsufficientBudget> {
        if !self.can_afford(cost) {
            return Err(InsufficientBudget {
                kind: BudgetKind::Gas,
                cost,
                remaining: self.remaining,
            });
        }
        Ok(Self {
            remaining: self.remaining - cost,
            starting: self.starting,
        })
    }

    /// Refund gas, capped at the starting allowance.
    #[must_use]
    pub fn credit(self, cost: u32) -> Self {
        Self {
            remaining: self.remaining.saturating_add(cost).min(self.starting),
            starting: self.starting,
        }
    }
}

impl Default for GasAccount {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STARTING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetAccount {
    Complexity(ComplexityBudget),
    Gas(GasAccount),
}

impl BudgetAccount {
    #[must_use]
    pub const fn kind(self) -> BudgetKind {
        match self {
            BudgetAccount::Complexity(_) => BudgetKind::Complexity,
            BudgetAccount::Gas(_) => BudgetKind::Gas,
        }
    }

    #[must_use]
    pub const fn remaining(self) -> u32 {
        match self {
            BudgetAccount::Complexity(budget) => budget.remaining(),
            BudgetAccount::Gas(account) => account.remaining(),
        }
    }

    #[must_use]
    pub const fn can_afford(self, cost: u32) -> bool {
        cost <= self.remaining()
    }

    pub fn debit(self, cost: u32) -> Result<Self, InsufficientBudget> {
        match self {
            BudgetAccount::Complexity(budget) => budget.debit(cost).map(BudgetAccount::Complexity),
            BudgetAccount::Gas(account) => account.debit(cost).map(BudgetAccount::Gas),
        }
    }

    #[must_use]
    pub fn credit(self, cost: u32) -> Self {
        match self {
            BudgetAccount::Complexity(budget) => BudgetAccount::Complexity(budget.credit(cost)),
            BudgetAccount::Gas(account) => BudgetAccount::Gas(account.credit(cost)),
        }
    }

    #[must_use]
    pub const fn as_complexity(self) -> Option<ComplexityBudget> {
        match self {
            BudgetAccount::Complexity(budget) => Some(budget),
            BudgetAccount::Gas(_) => None,
        }
    }

    #[must_use]
    pub const fn as_gas(self) -> Option<GasAccount> {
        match self {
            BudgetAccount::Gas(account) => Some(account),
            BudgetAccount::Complexity(_) => None,
        }
    }
}

/// What happens when the incoming traits of a capture don't fit the budget.
///
/// Selected once per match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetOverflowPolicy {
    /// Reject the whole trait gain. The board capture still happens.
    BlockCapture,
    /// Accept the capture and silently gain nothing.
    SkipTrait,
    /// Greedily accept what fits, cheapest first.
    #[default]
    PartialCapture,
    /// Evict a cheaper inherited trait when that makes room for a costlier one.
    ReplaceTrait,
}

impl BudgetOverflowPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BudgetOverflowPolicy::BlockCapture => "block_capture",
            BudgetOverflowPolicy::SkipTrait => "skip_trait",
            BudgetOverflowPolicy::PartialCapture => "partial_capture",
            BudgetOverflowPolicy::ReplaceTrait => "replace_trait",
        }
    }
}
