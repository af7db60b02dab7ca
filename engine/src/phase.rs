//! Capture resolution transition graph.
//!
//! Single encoding point for which `ResolutionPhase` may follow which. The
//! resolver records every step it takes as a [`TransitionReceipt`] so a
//! resolved capture carries its own audit trail.

use std::iter;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPhase {
    Idle,
    CaptureDetected,
    TraitsExtracted,
    BudgetChecked,
    Spliced,
    Blocked,
    PartiallySpliced,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionEdge {
    Detect,
    Extract,
    CheckBudget,
    Splice,
    Block,
    SplicePartially,
    Finalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionReceipt {
    from: ResolutionPhase,
    edge: ResolutionEdge,
    to: ResolutionPhase,
}

impl TransitionReceipt {
    #[must_use]
    pub const fn from(self) -> ResolutionPhase {
        self.from
    }

    #[must_use]
    pub const fn edge(self) -> ResolutionEdge {
        self.edge
    }

    #[must_use]
    pub const fn to(self) -> ResolutionPhase {
        self.to
    }
}

#[must_use]
pub fn transition_edge(from: ResolutionPhase, to: ResolutionPhase) -> Option<ResolutionEdge> {
    use ResolutionEdge::{Block, CheckBudget, Detect, Extract, Finalize, Splice, SplicePartially};
    use ResolutionPhase::{
        BudgetChecked, CaptureDetected, Idle, PartiallySpliced, Resolved, Spliced, TraitsExtracted,
    };

    match (from, to) {
        (Idle, CaptureDetected) => Some(Detect),
        (CaptureDetected, TraitsExtracted) => Some(Extract),
        (TraitsExtracted, BudgetChecked) => Some(CheckBudget),
        (BudgetChecked, Spliced) => Some(Splice),
        (BudgetChecked, ResolutionPhase::Blocked) => Some(Block),
        (BudgetChecked, PartiallySpliced) => Some(SplicePartially),
        (Spliced | ResolutionPhase::Blocked | PartiallySpliced, Resolved) => Some(Finalize),
        _ => None,
    }
}

#[must_use]
pub fn is_legal_transition(from: ResolutionPhase, edge: ResolutionEdge, to: ResolutionPhase) -> bool {
    transition_edge(from, to) == Some(edge)
}

/// Phases walked by one capture, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTrail {
    current: ResolutionPhase,
    receipts: Vec<TransitionReceipt>,
}

impl Default for PhaseTrail {
    fn default() -> Self {
        Self {
            current: ResolutionPhase::Idle,
            receipts: Vec::new(),
        }
    }
}

impl PhaseTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current(&self) -> ResolutionPhase {
        self.current
    }

    #[must_use]
    pub fn receipts(&self) -> &[TransitionReceipt] {
        &self.receipts
    }

    /// Every phase visited, starting from `Idle`.
    pub fn phases(&self) -> impl Iterator<Item = ResolutionPhase> + '_ {
        iter::once(ResolutionPhase::Idle).chain(self.receipts.iter().map(|r| r.to))
    }

    /// The branch taken after the budget check, if the capture got that far.
    #[must_use]
    pub fn branch(&self) -> Option<ResolutionPhase> {
        self.receipts
            .iter()
            .map(|r| r.to)
            .find(|phase| {
                matches!(
                    phase,
                    ResolutionPhase::Spliced
                        | ResolutionPhase::Blocked
                        | ResolutionPhase::PartiallySpliced
                )
            })
    }

    /// Step to `to`. Returns `false` and stays put when the graph has no such edge.
    pub fn advance(&mut self, to: ResolutionPhase) -> bool {
        let Some(edge) = transition_edge(self.current, to) else {
            tracing::error!(from = ?self.current, ?to, "Illegal resolution transition");
            return false;
        };
        self.receipts.push(TransitionReceipt {
            from: self.current,
            edge,
            to,
        });
        self.current = to;
        true
    }
}
