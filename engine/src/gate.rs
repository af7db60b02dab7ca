//! Player-confirmed evolution under the gas economy.
//!
//! Opening a capture produces an [`EvolutionOffer`]; the capture then stays
//! pending until a decision settles it. Settling re-runs capture validation, so
//! a defender taken by another capture in the meantime is never taken twice.
//! The gate also re-validates every accepted
//! selection against the player's gas and the attacker's complexity budget, so
//! affordability hints in the offer are advisory only.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time;

use gambit_core::{
    BudgetAccount, BudgetOverflowPolicy, CostModel, InsufficientBudget, LedgerError, TraitCatalog,
    splice,
};
use gambit_types::{
    BudgetKind, CaptureEvent, CaptureId, EvolutionSkipCause, Side, SkipReason, SkippedTrait,
    TraitName, UnitId,
};

use crate::arena::MatchState;
use crate::collaborators::{BoardCollaborator, PlayerDecisionCollaborator, TelemetryCollaborator};
use crate::phase::{PhaseTrail, ResolutionPhase};
use crate::resolver::{self, CaptureError, CaptureResolver, EvolutionOutcome, Settlement};

/// What to do when the player does not answer in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutFallback {
    #[default]
    AutoSkip,
    /// Take the cheapest offered traits that fit, as if the player had picked them.
    AcceptAffordable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionDecision {
    Accept(Vec<TraitName>),
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OfferedTrait {
    pub name: TraitName,
    pub complexity_cost: u32,
    pub gas_cost: u32,
    /// Fits both budgets on its own. Combinations are checked on submit.
    pub can_afford: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvolutionOffer {
    pub capture_id: CaptureId,
    pub attacker: UnitId,
    pub defender: UnitId,
    pub side: Side,
    pub options: Vec<OfferedTrait>,
    /// Defender traits that can't be offered, with the reason.
    pub withheld: Vec<SkippedTrait>,
    pub gas_remaining: u32,
    pub complexity_remaining: u32,
}

impl EvolutionOffer {
    #[must_use]
    pub fn offers(&self, name: TraitName) -> bool {
        self.options.iter().any(|option| option.name == name)
    }

    /// Cheapest-first selection that fits both budgets taken together.
    #[must_use]
    pub fn affordable_selection(&self) -> Vec<TraitName> {
        let mut options = self.options.clone();
        options.sort_by_key(|option| (option.gas_cost, option.name.as_str()));

        let mut gas = self.gas_remaining;
        let mut complexity = self.complexity_remaining;
        let mut selection = Vec::new();
        for option in options {
            if option.gas_cost <= gas && option.complexity_cost <= complexity {
                gas -= option.gas_cost;
                complexity -= option.complexity_cost;
                selection.push(option.name);
            }
        }
        selection
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("no pending decision for capture {0}")]
    UnknownCapture(CaptureId),
    #[error("capture {capture_id} was already decided")]
    DuplicateDecisionSubmission {
        capture_id: CaptureId,
        outcome: Box<EvolutionOutcome>,
    },
    #[error("{name} was not offered for capture {capture_id}")]
    NotOffered {
        capture_id: CaptureId,
        name: TraitName,
    },
    /// The selection does not fit. The capture stays pending.
    #[error("selection for capture {capture_id} rejected: {budget}")]
    InsufficientBudget {
        capture_id: CaptureId,
        budget: InsufficientBudget,
    },
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone)]
struct PendingDecision {
    event: CaptureEvent,
    side: Side,
    offer: EvolutionOffer,
    trail: PhaseTrail,
}

/// Wraps a [`CaptureResolver`] with a per-capture decision step.
#[derive(Debug)]
pub struct EvolutionDecisionGate<B, T> {
    resolver: CaptureResolver<B, T>,
    pending: HashMap<CaptureId, PendingDecision>,
}

impl<B, T> EvolutionDecisionGate<B, T>
where
    B: BoardCollaborator,
    T: TelemetryCollaborator,
{
    pub fn new(resolver: CaptureResolver<B, T>) -> Self {
        Self {
            resolver,
            pending: HashMap::new(),
        }
    }

    pub fn resolver(&self) -> &CaptureResolver<B, T> {
        &self.resolver
    }

    #[must_use]
    pub fn is_pending(&self, capture: CaptureId) -> bool {
        self.pending.contains_key(&capture)
    }

    /// Validate a capture and present its inheritable traits.
    ///
    /// Opening an already pending capture returns the same offer again.
    pub fn open(
        &mut self,
        game: &MatchState,
        event: CaptureEvent,
    ) -> Result<EvolutionOffer, GateError> {
        if let Some(outcome) = game.outcome(event.capture_id) {
            return Err(GateError::DuplicateDecisionSubmission {
                capture_id: event.capture_id,
                outcome: Box::new(outcome.clone()),
            });
        }
        if let Some(pending) = self.pending.get(&event.capture_id) {
            return Ok(pending.offer.clone());
        }

        let mut trail = PhaseTrail::new();
        let side = resolver::detect(game, &event)?;
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

        let gas_remaining = game.gas_account(side)?.account.remaining();
        let complexity_remaining = game.complexity_account(event.attacker)?.account.remaining();

        let mut withheld = extraction.withheld;
        let mut options = Vec::new();
        for name in extraction.candidates {
            if held.holds(name) {
                withheld.push(SkippedTrait {
                    name,
                    reason: SkipReason::DuplicateTraitIgnored,
                });
                continue;
            }
            let entry = TraitCatalog::trait_of(name);
            options.push(OfferedTrait {
                name,
                complexity_cost: entry.cost,
                gas_cost: entry.gas_cost,
                can_afford: entry.gas_cost <= gas_remaining
                    && entry.cost <= complexity_remaining,
            });
        }

        let offer = EvolutionOffer {
            capture_id: event.capture_id,
            attacker: event.attacker,
            defender: event.defender,
            side,
            options,
            withheld,
            gas_remaining,
            complexity_remaining,
        };
        tracing::debug!(
            capture = %event.capture_id,
            options = offer.options.len(),
            gas_remaining,
            "Evolution offered"
        );
        self.pending.insert(
            event.capture_id,
            PendingDecision {
                event,
                side,
                offer: offer.clone(),
                trail,
            },
        );
        Ok(offer)
    }

    /// Settle a pending capture with the player's decision.
    pub fn submit(
        &mut self,
        game: &mut MatchState,
        capture: CaptureId,
        decision: EvolutionDecision,
    ) -> Result<EvolutionOutcome, GateError> {
        if let Some(outcome) = game.outcome(capture) {
            tracing::warn!(capture = %capture, "Duplicate decision ignored");
            return Err(GateError::DuplicateDecisionSubmission {
                capture_id: capture,
                outcome: Box::new(outcome.clone()),
            });
        }
        self.revalidate(game, capture)?;
        let pending = self
            .pending
            .get(&capture)
            .ok_or(GateError::UnknownCapture(capture))?;

        match decision {
            EvolutionDecision::Skip => self.settle_skip(game, capture, EvolutionSkipCause::PlayerSkipped),
            EvolutionDecision::Accept(selection) => {
                if let Some(&name) = selection.iter().find(|&&name| !pending.offer.offers(name)) {
                    return Err(GateError::NotOffered {
                        capture_id: capture,
                        name,
                    });
                }
                if selection.is_empty() {
                    return self.settle_skip(game, capture, EvolutionSkipCause::PlayerSkipped);
                }
                self.settle_accept(game, capture, &selection)
            }
        }
    }

    /// Ask the player, wait up to `timeout`, and settle.
    ///
    /// A decision that fails validation leaves the capture pending and is
    /// returned as an error.
    pub async fn decide<P>(
        &mut self,
        game: &mut MatchState,
        event: CaptureEvent,
        player: &mut P,
        timeout: Duration,
    ) -> Result<EvolutionOutcome, GateError>
    where
        P: PlayerDecisionCollaborator,
    {
        let offer = self.open(game, event)?;
        match time::timeout(timeout, player.request_evolution_choice(&offer)).await {
            Ok(decision) => self.submit(game, event.capture_id, decision),
            Err(_) => {
                let fallback = game.rules().timeout_fallback;
                tracing::warn!(
                    capture = %event.capture_id,
                    ?timeout,
                    ?fallback,
                    "Evolution decision timed out"
                );
                self.fall_back(game, &offer, fallback)
            }
        }
    }

    fn fall_back(
        &mut self,
        game: &mut MatchState,
        offer: &EvolutionOffer,
        fallback: TimeoutFallback,
    ) -> Result<EvolutionOutcome, GateError> {
        let capture = offer.capture_id;
        self.revalidate(game, capture)?;
        if fallback == TimeoutFallback::AcceptAffordable {
            let selection = offer.affordable_selection();
            if !selection.is_empty() {
                match self.settle_accept(game, capture, &selection) {
                    Err(GateError::InsufficientBudget { .. }) => {}
                    settled => return settled,
                }
            }
        }
        self.settle_skip(game, capture, EvolutionSkipCause::DecisionTimedOut)
    }

    /// Check a pending capture against the board as it stands now.
    ///
    /// Another capture may have settled since this one was opened. A capture
    /// that no longer validates leaves the pending set.
    fn revalidate(&mut self, game: &MatchState, capture: CaptureId) -> Result<(), GateError> {
        let event = self
            .pending
            .get(&capture)
            .ok_or(GateError::UnknownCapture(capture))?
            .event;
        if let Err(err) = resolver::detect(game, &event) {
            self.pending.remove(&capture);
            tracing::warn!(capture = %capture, "Pending capture dropped: {err}");
            return Err(err.into());
        }
        Ok(())
    }

    fn settle_accept(
        &mut self,
        game: &mut MatchState,
        capture: CaptureId,
        selection: &[TraitName],
    ) -> Result<EvolutionOutcome, GateError> {
        let PendingDecision {
            event,
            side,
            offer,
            mut trail,
        } = self
            .pending
            .get(&capture)
            .cloned()
            .ok_or(GateError::UnknownCapture(capture))?;
        let held = game
            .profile(event.attacker)
            .ok_or(CaptureError::UnknownUnit(event.attacker))?
            .held();
        let old_cost = held.complexity_cost();

        // Lock order: attacker complexity, then player gas.
        let (result, gas) = game.complexity_ledger().transact(
            event.attacker,
            |complexity| -> Result<_, GateError> {
                let (result, gas) = game.gas_ledger().transact(
                    side,
                    |gas| -> Result<_, GateError> {
                        let result = splice(
                            &held,
                            selection,
                            gas.remaining(),
                            BudgetOverflowPolicy::BlockCapture,
                            CostModel::Gas,
                        );
                        if result.blocked {
                            return Err(GateError::InsufficientBudget {
                                capture_id: capture,
                                budget: InsufficientBudget {
                                    kind: BudgetKind::Gas,
                                    cost: result.rejected_charge,
                                    remaining: gas.remaining(),
                                },
                            });
                        }
                        let growth = result.new_cost.saturating_sub(old_cost);
                        if !complexity.can_afford(growth) {
                            return Err(GateError::InsufficientBudget {
                                capture_id: capture,
                                budget: InsufficientBudget {
                                    kind: BudgetKind::Complexity,
                                    cost: growth,
                                    remaining: complexity.remaining(),
                                },
                            });
                        }
                        let next = gas
                            .credit(result.credit)
                            .debit(result.debit)
                            .map_err(|budget| GateError::InsufficientBudget {
                                capture_id: capture,
                                budget,
                            })?;
                        Ok((next, (result, next)))
                    },
                )?;
                let next = complexity
                    .credit(old_cost.saturating_sub(result.new_cost))
                    .debit(result.new_cost.saturating_sub(old_cost))
                    .map_err(|budget| GateError::InsufficientBudget {
                        capture_id: capture,
                        budget,
                    })?;
                Ok((next, (result, gas)))
            },
        )
        .inspect_err(|err| {
            if let GateError::InsufficientBudget { budget, .. } = err {
                tracing::warn!(capture = %capture, %budget, "Selection rejected");
            }
        })?;
        trail.advance(ResolutionPhase::BudgetChecked);
        trail.advance(ResolutionPhase::Spliced);

        let mut skipped = offer.withheld;
        skipped.extend(
            offer
                .options
                .iter()
                .filter(|option| !selection.contains(&option.name))
                .map(|option| SkippedTrait {
                    name: option.name,
                    reason: SkipReason::NotSelected,
                }),
        );

        self.pending.remove(&capture);
        let outcome = self.resolver.finalize(
            game,
            event,
            Settlement {
                result,
                skipped,
                budget: gas,
                cause: EvolutionSkipCause::NothingAffordable,
                count_empty_generation: false,
            },
            trail,
        )?;
        Ok(outcome)
    }

    fn settle_skip(
        &mut self,
        game: &mut MatchState,
        capture: CaptureId,
        cause: EvolutionSkipCause,
    ) -> Result<EvolutionOutcome, GateError> {
        let PendingDecision {
            event,
            side,
            offer,
            mut trail,
        } = self
            .pending
            .remove(&capture)
            .ok_or(GateError::UnknownCapture(capture))?;
        let held = game
            .profile(event.attacker)
            .ok_or(CaptureError::UnknownUnit(event.attacker))?
            .held();
        let gas: BudgetAccount = game.gas_account(side)?.account;

        // An empty splice: nothing charged, nothing gained.
        let result = splice(
            &held,
            &[],
            0,
            BudgetOverflowPolicy::BlockCapture,
            CostModel::Gas,
        );
        trail.advance(ResolutionPhase::BudgetChecked);
        trail.advance(ResolutionPhase::Spliced);

        let mut skipped = offer.withheld;
        skipped.extend(offer.options.iter().map(|option| SkippedTrait {
            name: option.name,
            reason: SkipReason::NotSelected,
        }));

        let outcome = self.resolver.finalize(
            game,
            event,
            Settlement {
                result,
                skipped,
                budget: gas,
                cause,
                count_empty_generation: game.rules().generation_on_skip,
            },
            trail,
        )?;
        Ok(outcome)
    }
}
