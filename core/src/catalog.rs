//! Static trait catalog.
//!
//! Every lookup here is a total `match` over a closed enum, so adding a trait or a
//! unit kind without catalog data is a compile error rather than a runtime gap.

use gambit_types::{Trait, TraitName, UnitKind};

/// A declared conflict between two traits and the trait that replaces them.
///
/// The merged trait keeps its own catalog cost. It is never derived from the
/// constituents' costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRule {
    pub left: TraitName,
    pub right: TraitName,
    pub merged: TraitName,
}

const MERGE_RULES: [MergeRule; 2] = [
    MergeRule {
        left: TraitName::Diagonal,
        right: TraitName::Straight,
        merged: TraitName::Combined,
    },
    MergeRule {
        left: TraitName::Leap,
        right: TraitName::ExtendedRange,
        merged: TraitName::PhantomLeap,
    },
];

/// Stateless lookup table for trait data, base traits and conflict merges.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraitCatalog;

impl TraitCatalog {
    #[must_use]
    pub const fn trait_of(name: TraitName) -> Trait {
        let (cost, gas_cost, stackable, hidden, inheritable) = match name {
            TraitName::ForwardStep => (5, 1, false, false, true),
            TraitName::Leap => (15, 3, false, false, true),
            TraitName::Diagonal | TraitName::Straight => (25, 3, false, false, true),
            TraitName::Combined => (40, 5, false, false, true),
            TraitName::Adjacent => (10, 1, false, false, false),
            TraitName::ExtendedRange => (30, 4, true, false, true),
            TraitName::PhantomLeap => (35, 5, false, false, true),
            TraitName::DoubleMove => (45, 6, false, false, true),
            TraitName::Teleport => (50, 8, false, false, true),
            TraitName::HiddenAbility => (20, 2, false, true, true),
            TraitName::Ethereal => (40, 5, false, true, true),
            TraitName::AutonomousAi => (60, 11, false, false, true),
        };
        Trait {
            name,
            cost,
            gas_cost,
            stackable,
            hidden,
            inheritable,
        }
    }

    /// The movement trait every unit of `kind` is born with.
    ///
    /// The king's `Adjacent` trait is marked non-inheritable; callers must check
    /// `inheritable` before offering it to a capturer.
    #[must_use]
    pub const fn base_trait(kind: UnitKind) -> Trait {
        Self::trait_of(match kind {
            UnitKind::Pawn => TraitName::ForwardStep,
            UnitKind::Knight => TraitName::Leap,
            UnitKind::Bishop => TraitName::Diagonal,
            UnitKind::Rook => TraitName::Straight,
            UnitKind::Queen => TraitName::Combined,
            UnitKind::King => TraitName::Adjacent,
        })
    }

    /// Merged trait for a known conflicting pair, in either order.
    ///
    /// Returns `None` for anything that isn't exactly one declared pair.
    #[must_use]
    pub fn conflict_resolution(names: &[TraitName]) -> Option<Trait> {
        let [a, b] = names else {
            return None;
        };
        MERGE_RULES
            .iter()
            .find(|rule| {
                (rule.left == *a && rule.right == *b) || (rule.left == *b && rule.right == *a)
            })
            .map(|rule| Self::trait_of(rule.merged))
    }

    #[must_use]
    pub fn merge_rules() -> &'static [MergeRule] {
        &MERGE_RULES
    }

    /// The pair a merged trait was built from, if it is a merge product.
    #[must_use]
    pub fn constituents(merged: TraitName) -> Option<(TraitName, TraitName)> {
        MERGE_RULES
            .iter()
            .find(|rule| rule.merged == merged)
            .map(|rule| (rule.left, rule.right))
    }

    /// True when `held` is a merged trait that already covers `name`.
    #[must_use]
    pub fn subsumes(held: TraitName, name: TraitName) -> bool {
        Self::constituents(held).is_some_and(|(left, right)| left == name || right == name)
    }
}
