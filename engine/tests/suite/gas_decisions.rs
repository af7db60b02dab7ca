//! Decision gate under the gas economy.

use gambit_engine::{
    CaptureError, CaptureResolver, Economy, EvolutionDecision, EvolutionDecisionGate, GateError,
    MatchId, MatchRules, MatchState, NullBoard, Position, RecordingTelemetry, Side, TraitName,
    UnitKind,
};
use gambit_types::{BudgetKind, SkipReason};

use crate::common::{capture, spawn_with};

fn gas_match(starting_gas: u32) -> MatchState {
    MatchState::new(
        MatchId::new(2),
        MatchRules {
            economy: Economy::Gas,
            starting_gas,
            ..MatchRules::default()
        },
    )
}

fn gate() -> EvolutionDecisionGate<NullBoard, RecordingTelemetry> {
    EvolutionDecisionGate::new(CaptureResolver::new(NullBoard, RecordingTelemetry::new()))
}

#[test]
fn second_decision_over_remaining_gas_is_rejected_atomically() {
    let mut game = gas_match(10);
    let pawn = spawn_with(&mut game, UnitKind::Pawn, Side::White, Position::new(4, 1), &[]);
    let knight = spawn_with(&mut game, UnitKind::Knight, Side::Black, Position::new(5, 3), &[]);
    let king = spawn_with(
        &mut game,
        UnitKind::King,
        Side::Black,
        Position::new(4, 7),
        &[TraitName::AutonomousAi],
    );
    let mut gate = gate();

    let first = capture(1, pawn, knight, 3);
    let offer = gate.open(&game, first).unwrap();
    assert_eq!(offer.options[0].gas_cost, 3);
    let outcome = gate
        .submit(
            &mut game,
            first.capture_id,
            EvolutionDecision::Accept(vec![TraitName::Leap]),
        )
        .unwrap();
    assert_eq!(outcome.budget.remaining(), 7);

    let second = capture(2, pawn, king, 5);
    let offer = gate.open(&game, second).unwrap();
    assert_eq!(offer.options[0].gas_cost, 11);
    assert!(!offer.options[0].can_afford);

    let before = game.gas_account(Side::White).unwrap();
    let err = gate
        .submit(
            &mut game,
            second.capture_id,
            EvolutionDecision::Accept(vec![TraitName::AutonomousAi]),
        )
        .unwrap_err();
    let GateError::InsufficientBudget { budget, .. } = err else {
        panic!("expected InsufficientBudget, got {err:?}");
    };
    assert_eq!(budget.kind, BudgetKind::Gas);
    assert_eq!(budget.cost, 11);
    assert_eq!(budget.remaining, 7);
    assert_eq!(game.gas_account(Side::White).unwrap(), before);
    assert!(gate.is_pending(second.capture_id));
    assert!(game.unit(king).unwrap().alive);
}

#[test]
fn complexity_is_rechecked_even_when_gas_suffices() {
    let mut game = gas_match(50);
    let queen = spawn_with(
        &mut game,
        UnitKind::Queen,
        Side::White,
        Position::new(3, 0),
        &[TraitName::Teleport],
    );
    let rook = spawn_with(
        &mut game,
        UnitKind::Rook,
        Side::Black,
        Position::new(3, 7),
        &[TraitName::DoubleMove],
    );
    let mut gate = gate();

    let event = capture(1, queen, rook, 2);
    gate.open(&game, event).unwrap();
    let err = gate
        .submit(
            &mut game,
            event.capture_id,
            EvolutionDecision::Accept(vec![TraitName::DoubleMove]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        GateError::InsufficientBudget { budget, .. } if budget.kind == BudgetKind::Complexity
    ));
    assert_eq!(game.gas_account(Side::White).unwrap().account.remaining(), 50);
}

#[test]
fn partial_selection_marks_the_rest_not_selected() {
    let mut game = gas_match(10);
    let pawn = spawn_with(&mut game, UnitKind::Pawn, Side::White, Position::new(4, 1), &[]);
    let bishop = spawn_with(
        &mut game,
        UnitKind::Bishop,
        Side::Black,
        Position::new(5, 2),
        &[TraitName::HiddenAbility, TraitName::Teleport],
    );
    game.reveal(bishop, TraitName::HiddenAbility);
    let mut gate = gate();

    let event = capture(1, pawn, bishop, 1);
    let offer = gate.open(&game, event).unwrap();
    assert_eq!(offer.options.len(), 3);

    let outcome = gate
        .submit(
            &mut game,
            event.capture_id,
            EvolutionDecision::Accept(vec![TraitName::HiddenAbility]),
        )
        .unwrap();
    assert_eq!(outcome.applied, vec![TraitName::HiddenAbility]);
    let not_selected: Vec<TraitName> = outcome
        .skipped
        .iter()
        .filter(|s| s.reason == SkipReason::NotSelected)
        .map(|s| s.name)
        .collect();
    assert_eq!(not_selected, vec![TraitName::Diagonal, TraitName::Teleport]);
    assert_eq!(outcome.budget.remaining(), 8);
}

#[test]
fn skip_is_free_and_finalizes_the_board() {
    let mut game = gas_match(10);
    let rook = spawn_with(&mut game, UnitKind::Rook, Side::White, Position::new(0, 0), &[]);
    let knight = spawn_with(&mut game, UnitKind::Knight, Side::Black, Position::new(0, 4), &[]);
    let mut gate = gate();

    let event = capture(1, rook, knight, 1);
    gate.open(&game, event).unwrap();
    let outcome = gate
        .submit(&mut game, event.capture_id, EvolutionDecision::Skip)
        .unwrap();
    assert!(!outcome.evolved());
    assert_eq!(outcome.budget.remaining(), 10);
    assert_eq!(game.unit(rook).unwrap().position, Position::new(0, 4));
    assert!(!game.unit(knight).unwrap().alive);
    assert_eq!(game.profile(rook).unwrap().lineage(), &[knight]);
}

#[test]
fn defender_taken_while_pending_cannot_be_taken_again() {
    let mut game = gas_match(10);
    let pawn = spawn_with(&mut game, UnitKind::Pawn, Side::White, Position::new(4, 1), &[]);
    let rook = spawn_with(&mut game, UnitKind::Rook, Side::White, Position::new(5, 0), &[]);
    let knight = spawn_with(&mut game, UnitKind::Knight, Side::Black, Position::new(5, 3), &[]);
    let mut gate = gate();

    let by_pawn = capture(1, pawn, knight, 3);
    let by_rook = capture(2, rook, knight, 3);
    gate.open(&game, by_pawn).unwrap();
    gate.open(&game, by_rook).unwrap();

    gate.submit(
        &mut game,
        by_pawn.capture_id,
        EvolutionDecision::Accept(vec![TraitName::Leap]),
    )
    .unwrap();
    let gas_after_first = game.gas_account(Side::White).unwrap();
    assert_eq!(gas_after_first.account.remaining(), 7);

    let err = gate
        .submit(
            &mut game,
            by_rook.capture_id,
            EvolutionDecision::Accept(vec![TraitName::Leap]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        GateError::Capture(CaptureError::UnitNotAlive(id)) if id == knight
    ));
    assert!(!gate.is_pending(by_rook.capture_id));
    assert_eq!(game.gas_account(Side::White).unwrap(), gas_after_first);
    assert!(game.profile(rook).unwrap().lineage().is_empty());
    assert!(game.profile(rook).unwrap().inherited().is_empty());
    assert_eq!(game.profile(pawn).unwrap().lineage(), &[knight]);
    assert!(!game.is_resolved(by_rook.capture_id));
}

#[test]
fn attacker_captured_while_pending_settles_nothing() {
    let mut game = gas_match(10);
    let pawn = spawn_with(&mut game, UnitKind::Pawn, Side::White, Position::new(4, 1), &[]);
    let knight = spawn_with(&mut game, UnitKind::Knight, Side::Black, Position::new(5, 3), &[]);
    let bishop = spawn_with(&mut game, UnitKind::Bishop, Side::Black, Position::new(2, 3), &[]);
    let mut gate = gate();

    let stale = capture(1, pawn, knight, 3);
    gate.open(&game, stale).unwrap();
    let counter = capture(2, bishop, pawn, 4);
    gate.open(&game, counter).unwrap();
    gate.submit(&mut game, counter.capture_id, EvolutionDecision::Skip)
        .unwrap();

    let err = gate
        .submit(&mut game, stale.capture_id, EvolutionDecision::Skip)
        .unwrap_err();
    assert!(matches!(
        err,
        GateError::Capture(CaptureError::UnitNotAlive(id)) if id == pawn
    ));
    assert!(game.unit(knight).unwrap().alive);
    assert!(!gate.is_pending(stale.capture_id));
}
