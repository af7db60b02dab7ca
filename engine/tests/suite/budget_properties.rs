//! Budgets hold under arbitrary capture sequences.

use gambit_engine::{
    BudgetOverflowPolicy, CaptureError, CaptureResolver, EvolutionDecision,
    EvolutionDecisionGate, GeneticProfile, MatchId, MatchRules, MatchState, NullBoard,
    Position, RecordingTelemetry, Side, TraitName, UnitId, UnitKind,
};
use proptest::collection;
use proptest::prelude::*;

use crate::common::{capture, resolver, spawn_with};

fn policy() -> impl Strategy<Value = BudgetOverflowPolicy> {
    prop_oneof![
        Just(BudgetOverflowPolicy::BlockCapture),
        Just(BudgetOverflowPolicy::SkipTrait),
        Just(BudgetOverflowPolicy::PartialCapture),
        Just(BudgetOverflowPolicy::ReplaceTrait),
    ]
}

/// A unit kind plus up to two extra traits it starts with.
fn roster() -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
    collection::vec((0usize..6, collection::vec(0usize..13, 0..2)), 4..10)
}

fn populate(game: &mut MatchState, roster: &[(usize, Vec<usize>)]) -> Vec<UnitId> {
    let mut ids = Vec::new();
    for (index, (kind, traits)) in roster.iter().enumerate() {
        let side = if index % 2 == 0 { Side::White } else { Side::Black };
        let traits: Vec<TraitName> = traits.iter().map(|&t| TraitName::ALL[t]).collect();
        let profile_cost_fits = {
            let preview = GeneticProfile::rehydrate(
                game.next_unit_id(),
                UnitKind::ALL[*kind],
                traits.iter().copied().collect(),
                0,
                0,
            );
            preview.complexity_cost() <= game.rules().max_complexity
        };
        let traits = if profile_cost_fits { traits } else { Vec::new() };
        ids.push(spawn_with(
            game,
            UnitKind::ALL[*kind],
            side,
            Position::new(index as u8 % 8, index as u8 / 8),
            &traits,
        ));
    }
    ids
}

fn assert_budgets_hold(game: &MatchState) -> Result<(), TestCaseError> {
    for unit in game.units() {
        let budget = game
            .complexity_account(unit.id)
            .unwrap()
            .account
            .as_complexity()
            .unwrap();
        let profile = game.profile(unit.id).unwrap();
        prop_assert!(budget.current() <= budget.max());
        prop_assert!(profile.complexity_cost() <= budget.max());
    }
    for side in [Side::White, Side::Black] {
        let gas = game.gas_account(side).unwrap().account.as_gas().unwrap();
        prop_assert!(gas.remaining() <= gas.starting());
    }
    Ok(())
}

proptest! {
    #[test]
    fn complexity_never_overflows(
        roster in roster(),
        policy in policy(),
        captures in collection::vec((0usize..10, 0usize..10), 0..12),
    ) {
        let mut game = MatchState::new(
            MatchId::new(1),
            MatchRules { overflow_policy: policy, ..MatchRules::default() },
        );
        let ids = populate(&mut game, &roster);
        let mut resolver = resolver();

        for (turn, (a, d)) in captures.into_iter().enumerate() {
            let attacker = ids[a % ids.len()];
            let defender = ids[d % ids.len()];
            let result = resolver.resolve(
                &mut game,
                capture(turn as u64, attacker, defender, turn as u32),
            );
            match result {
                Ok(outcome) => prop_assert!(outcome.complexity <= 100),
                Err(CaptureError::InsufficientBudget { outcome, .. }) => {
                    prop_assert_eq!(policy, BudgetOverflowPolicy::BlockCapture);
                    prop_assert!(!outcome.evolved());
                }
                Err(
                    CaptureError::InvalidCaptureSameSide { .. } | CaptureError::UnitNotAlive(_),
                ) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
            assert_budgets_hold(&game)?;
        }
    }

    #[test]
    fn gas_never_goes_negative(
        roster in roster(),
        captures in collection::vec((0usize..10, 0usize..10, any::<bool>()), 0..12),
        starting_gas in 0u32..20,
    ) {
        let mut game = MatchState::new(
            MatchId::new(2),
            MatchRules { starting_gas, ..MatchRules::default() },
        );
        let ids = populate(&mut game, &roster);
        let mut gate =
            EvolutionDecisionGate::new(CaptureResolver::new(NullBoard, RecordingTelemetry::new()));

        for (turn, (a, d, greedy)) in captures.into_iter().enumerate() {
            let event = capture(turn as u64, ids[a % ids.len()], ids[d % ids.len()], turn as u32);
            let Ok(offer) = gate.open(&game, event) else {
                continue;
            };
            let before = game.gas_account(offer.side).unwrap();
            let selection = if greedy {
                offer.options.iter().map(|option| option.name).collect()
            } else {
                offer.affordable_selection()
            };
            if gate
                .submit(&mut game, event.capture_id, EvolutionDecision::Accept(selection))
                .is_err()
            {
                prop_assert_eq!(game.gas_account(offer.side).unwrap(), before);
                gate.submit(&mut game, event.capture_id, EvolutionDecision::Skip).unwrap();
            }
            assert_budgets_hold(&game)?;
        }
    }
}
