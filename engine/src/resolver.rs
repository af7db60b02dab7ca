//! Capture resolution under the complexity economy.
//!
//! A capture walks `CaptureDetected → TraitsExtracted → BudgetChecked →
//! {Spliced | Blocked | PartiallySpliced} → Resolved`. Validation failures stop
//! the walk before anything is mutated. Once the budget check has run, the
//! capture always finishes on the board, even when the trait gain is rejected.

use serde::Serialize;
use thiserror::Error;

use gambit_core::{
    BudgetAccount, CostModel, InsufficientBudget, LedgerError, SpliceResult, splice,
};
use gambit_types::{
    BudgetKind, CaptureEvent, CaptureId, CaptureResolvedEvent, ConflictMerge,
    EvolutionAppliedEvent, EvolutionSkipCause, EvolutionSkippedEvent, Side, SkippedTrait,
    TraitName, UnitId,
};

use crate::arena::MatchState;
use crate::collaborators::{BoardCollaborator, TelemetryCollaborator};
use crate::phase::{PhaseTrail, ResolutionPhase};

/// Everything a resolved capture changed, plus how it got there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvolutionOutcome {
    pub capture_id: CaptureId,
    pub attacker: UnitId,
    pub defender: UnitId,
    pub applied: Vec<TraitName>,
    /// Withheld and rejected candidates, sorted by name.
    pub skipped: Vec<SkippedTrait>,
    pub conflicts_resolved: Vec<ConflictMerge>,
    pub removed: Vec<TraitName>,
    /// State of the charged account after the capture.
    pub budget: BudgetAccount,
    pub generation: u32,
    pub complexity: u32,
    /// Set when the attacker gained nothing.
    pub skip_cause: Option<EvolutionSkipCause>,
    pub trail: PhaseTrail,
}

impl EvolutionOutcome {
    #[must_use]
    pub fn evolved(&self) -> bool {
        !self.applied.is_empty()
    }

    #[must_use]
    pub fn branch(&self) -> Option<ResolutionPhase> {
        self.trail.branch()
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture {0} was already resolved")]
    AlreadyResolved(CaptureId),
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    #[error("unit {0} is no longer on the board")]
    UnitNotAlive(UnitId),
    #[error("unit {attacker} cannot capture {defender}: both play {side}")]
    InvalidCaptureSameSide {
        attacker: UnitId,
        defender: UnitId,
        side: Side,
    },
    /// The board capture went through; the trait gain did not.
    #[error("capture {} finalized without trait gain: {budget}", .outcome.capture_id)]
    InsufficientBudget {
        budget: InsufficientBudget,
        outcome: Box<EvolutionOutcome>,
    },
    /// The attacker's account could not take the splice's charge. Nothing changed.
    #[error("budget for capture {capture_id} rejected the splice: {source}")]
    BudgetConflict {
        capture_id: CaptureId,
        source: InsufficientBudget,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// What a settled splice hands to [`CaptureResolver::finalize`].
#[derive(Debug)]
pub(crate) struct Settlement {
    pub result: SpliceResult,
    pub skipped: Vec<SkippedTrait>,
    pub budget: BudgetAccount,
    /// Reported when the splice gained nothing.
    pub cause: EvolutionSkipCause,
    pub count_empty_generation: bool,
}

#[derive(Debug)]
pub struct CaptureResolver<B, T> {
    board: B,
    telemetry: T,
}

impl<B, T> CaptureResolver<B, T>
where
    B: BoardCollaborator,
    T: TelemetryCollaborator,
{
    pub fn new(board: B, telemetry: T) -> Self {
        Self { board, telemetry }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn into_parts(self) -> (B, T) {
        (self.board, self.telemetry)
    }

    /// Resolve a capture, charging the attacker's complexity budget under the
    /// match's overflow policy.
    pub fn resolve(
        &mut self,
        game: &mut MatchState,
        event: CaptureEvent,
    ) -> Result<EvolutionOutcome, CaptureError> {
        let mut trail = PhaseTrail::new();
        detect(game, &event)?;
        trail.advance(ResolutionPhase::CaptureDetected);

        let extraction = game
            .profile(event.defender)
            .ok_or(CaptureError::UnknownUnit(event.defender))?
            .extract_inheritable();
        let held = game
            .profile(event.attacker)
            .ok_or(CaptureError::UnknownUnit(event.attacker))?
            .held();
        trail.advance(ResolutionPhase::TraitsExtracted);

        let policy = game.rules().overflow_policy;
        let (result, budget, remaining) =
            game.complexity_ledger()
                .transact(event.attacker, |account| -> Result<_, CaptureError> {
                    let remaining = account.remaining();
                    let result = splice(
                        &held,
                        &extraction.candidates,
                        remaining,
                        policy,
                        CostModel::Complexity,
                    );
                    let next = account
                        .credit(result.credit)
                        .debit(result.debit)
                        .map_err(|source| CaptureError::BudgetConflict {
                            capture_id: event.capture_id,
                            source,
                        })?;
                    Ok((next, (result, next, remaining)))
                })?;
        trail.advance(ResolutionPhase::BudgetChecked);

        let gained = result.gained_anything();
        let over_budget = result.rejected_charge > 0;
        let branch = match (gained, over_budget) {
            (true, true) => ResolutionPhase::PartiallySpliced,
            (false, true) => ResolutionPhase::Blocked,
            (_, false) => ResolutionPhase::Spliced,
        };
        trail.advance(branch);

        let cause = if result.blocked {
            EvolutionSkipCause::Blocked
        } else if extraction.candidates.is_empty() {
            EvolutionSkipCause::NoCandidates
        } else {
            EvolutionSkipCause::NothingAffordable
        };
        let rejection = result.blocked.then_some(InsufficientBudget {
            kind: BudgetKind::Complexity,
            cost: result.rejected_charge,
            remaining,
        });
        if over_budget {
            tracing::warn!(
                capture = %event.capture_id,
                unit = %event.attacker,
                policy = policy.as_str(),
                rejected = result.rejected_charge,
                remaining,
                "Trait gain exceeds complexity budget"
            );
        }

        let outcome = self.finalize(
            game,
            event,
            Settlement {
                result,
                skipped: extraction.withheld,
                budget,
                cause,
                count_empty_generation: false,
            },
            trail,
        )?;

        match rejection {
            Some(budget) => Err(CaptureError::InsufficientBudget {
                budget,
                outcome: Box::new(outcome),
            }),
            None => Ok(outcome),
        }
    }

    /// Commit a settled splice and finish the capture on the board.
    pub(crate) fn finalize(
        &mut self,
        game: &mut MatchState,
        event: CaptureEvent,
        settlement: Settlement,
        mut trail: PhaseTrail,
    ) -> Result<EvolutionOutcome, CaptureError> {
        let Settlement {
            result,
            mut skipped,
            budget,
            cause,
            count_empty_generation,
        } = settlement;

        let profile = game
            .profile_mut(event.attacker)
            .ok_or(CaptureError::UnknownUnit(event.attacker))?;
        let gained = profile.commit_capture(event.defender, &result, event.turn);
        if !gained && count_empty_generation {
            profile.bump_generation();
        }
        let generation = profile.generation();
        let complexity = profile.complexity_cost();

        if let Some(position) = game.move_capture(event.attacker, event.defender) {
            self.board.remove_unit(event.defender);
            self.board.confirm_attacker_position(event.attacker, position);
        }
        trail.advance(ResolutionPhase::Resolved);

        skipped.extend(result.skipped);
        skipped.sort_by_key(|entry| (entry.name.as_str(), entry.reason as u8));

        self.telemetry.capture_resolved(&CaptureResolvedEvent {
            capture_id: event.capture_id,
            attacker: event.attacker,
            defender: event.defender,
            turn: event.turn,
            generation,
            complexity,
        });
        if gained {
            tracing::info!(
                capture = %event.capture_id,
                unit = %event.attacker,
                applied = ?result.applied,
                generation,
                "Evolution applied"
            );
            self.telemetry.evolution_applied(&EvolutionAppliedEvent {
                capture_id: event.capture_id,
                unit: event.attacker,
                applied: result.applied.clone(),
                removed: result.removed.clone(),
                conflicts_resolved: result.conflicts_resolved.clone(),
                generation,
            });
        } else {
            tracing::info!(
                capture = %event.capture_id,
                unit = %event.attacker,
                ?cause,
                "Evolution skipped"
            );
            self.telemetry.evolution_skipped(&EvolutionSkippedEvent {
                capture_id: event.capture_id,
                unit: event.attacker,
                cause,
                skipped: skipped.clone(),
            });
        }

        let outcome = EvolutionOutcome {
            capture_id: event.capture_id,
            attacker: event.attacker,
            defender: event.defender,
            applied: result.applied,
            skipped,
            conflicts_resolved: result.conflicts_resolved,
            removed: result.removed,
            budget,
            generation,
            complexity,
            skip_cause: (!gained).then_some(cause),
            trail,
        };
        game.record(outcome.clone());
        Ok(outcome)
    }
}

/// `CaptureDetected` checks. Returns the attacker's side.
pub(crate) fn detect(game: &MatchState, event: &CaptureEvent) -> Result<Side, CaptureError> {
    if game.is_resolved(event.capture_id) {
        return Err(CaptureError::AlreadyResolved(event.capture_id));
    }
    let attacker = game
        .unit(event.attacker)
        .ok_or(CaptureError::UnknownUnit(event.attacker))?;
    let defender = game
        .unit(event.defender)
        .ok_or(CaptureError::UnknownUnit(event.defender))?;
    if attacker.side == defender.side {
        tracing::error!(
            capture = %event.capture_id,
            attacker = %event.attacker,
            defender = %event.defender,
            side = %attacker.side,
            "Capture between units of the same side"
        );
        return Err(CaptureError::InvalidCaptureSameSide {
            attacker: event.attacker,
            defender: event.defender,
            side: attacker.side,
        });
    }
    for unit in [attacker, defender] {
        if !unit.alive {
            return Err(CaptureError::UnitNotAlive(unit.id));
        }
    }
    Ok(attacker.side)
}
