//! Capture events and the telemetry events emitted once a capture resolves.

use serde::{Deserialize, Serialize};

use crate::{CaptureId, TraitName, UnitId};

/// Issued by the board once a capture has been validated. Immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub capture_id: CaptureId,
    pub attacker: UnitId,
    pub defender: UnitId,
    pub turn: u32,
}

/// Why a candidate trait did not end up in the attacker's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Already held by the attacker.
    DuplicateTraitIgnored,
    /// Covered by a merged trait the attacker holds or is gaining.
    Subsumed,
    /// Hidden on the defender and never revealed.
    HiddenUnrevealed,
    NotInheritable,
    InsufficientBudget,
    /// Offered to the player but left out of their selection.
    NotSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkippedTrait {
    pub name: TraitName,
    pub reason: SkipReason,
}

/// Two held-or-incoming traits folded into their catalog merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictMerge {
    pub left: TraitName,
    pub right: TraitName,
    pub merged: TraitName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionSkipCause {
    /// The defender contributed nothing inheritable.
    NoCandidates,
    /// Every candidate was dropped by budget or dedup rules.
    NothingAffordable,
    /// `BlockCapture` rejected the trait gain.
    Blocked,
    PlayerSkipped,
    DecisionTimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResolvedEvent {
    pub capture_id: CaptureId,
    pub attacker: UnitId,
    pub defender: UnitId,
    pub turn: u32,
    pub generation: u32,
    pub complexity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionAppliedEvent {
    pub capture_id: CaptureId,
    pub unit: UnitId,
    pub applied: Vec<TraitName>,
    pub removed: Vec<TraitName>,
    pub conflicts_resolved: Vec<ConflictMerge>,
    pub generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionSkippedEvent {
    pub capture_id: CaptureId,
    pub unit: UnitId,
    pub cause: EvolutionSkipCause,
    pub skipped: Vec<SkippedTrait>,
}
