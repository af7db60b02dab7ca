//! Movement traits and trait sets.

use std::collections::{BTreeSet, btree_set};
use std::fmt;
use std::iter::Copied;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of movement traits a unit can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraitName {
    ForwardStep,
    Leap,
    Diagonal,
    Straight,
    Combined,
    Adjacent,
    ExtendedRange,
    PhantomLeap,
    DoubleMove,
    Teleport,
    HiddenAbility,
    Ethereal,
    AutonomousAi,
}

impl TraitName {
    pub const ALL: [TraitName; 13] = [
        TraitName::ForwardStep,
        TraitName::Leap,
        TraitName::Diagonal,
        TraitName::Straight,
        TraitName::Combined,
        TraitName::Adjacent,
        TraitName::ExtendedRange,
        TraitName::PhantomLeap,
        TraitName::DoubleMove,
        TraitName::Teleport,
        TraitName::HiddenAbility,
        TraitName::Ethereal,
        TraitName::AutonomousAi,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TraitName::ForwardStep => "FORWARD_STEP",
            TraitName::Leap => "LEAP",
            TraitName::Diagonal => "DIAGONAL",
            TraitName::Straight => "STRAIGHT",
            TraitName::Combined => "COMBINED",
            TraitName::Adjacent => "ADJACENT",
            TraitName::ExtendedRange => "EXTENDED_RANGE",
            TraitName::PhantomLeap => "PHANTOM_LEAP",
            TraitName::DoubleMove => "DOUBLE_MOVE",
            TraitName::Teleport => "TELEPORT",
            TraitName::HiddenAbility => "HIDDEN_ABILITY",
            TraitName::Ethereal => "ETHEREAL",
            TraitName::AutonomousAi => "AUTONOMOUS_AI",
        }
    }
}

impl fmt::Display for TraitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown trait name: {0}")]
pub struct UnknownTraitName(pub String);

impl FromStr for TraitName {
    type Err = UnknownTraitName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        TraitName::ALL
            .into_iter()
            .find(|name| name.as_str() == normalized)
            .ok_or_else(|| UnknownTraitName(s.to_string()))
    }
}

/// Catalog data for a single trait.
///
/// `cost` is the lifetime complexity a holder pays; `gas_cost` is what a player
/// spends from the per-match allowance to accept the trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trait {
    pub name: TraitName,
    pub cost: u32,
    pub gas_cost: u32,
    pub stackable: bool,
    pub hidden: bool,
    pub inheritable: bool,
}

/// A set of traits, unique by name, iterated in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitSet(BTreeSet<TraitName>);

impl TraitSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a trait. Returns `false` if the name was already present.
    pub fn insert(&mut self, name: TraitName) -> bool {
        self.0.insert(name)
    }

    pub fn remove(&mut self, name: TraitName) -> bool {
        self.0.remove(&name)
    }

    #[must_use]
    pub fn contains(&self, name: TraitName) -> bool {
        self.0.contains(&name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TraitName> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<TraitName> for TraitSet {
    fn from_iter<I: IntoIterator<Item = TraitName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TraitSet {
    type Item = TraitName;
    type IntoIter = Copied<btree_set::Iter<'a, TraitName>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
