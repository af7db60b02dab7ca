//! Capture resolution end to end under the complexity economy.

use gambit_engine::{
    BudgetOverflowPolicy, CaptureError, Position, ResolutionPhase, Side, TelemetryEvent,
    TraitName, UnitKind,
};
use gambit_types::{BudgetKind, EvolutionSkipCause, SkipReason};

use crate::common::{capture, complexity_match, resolver, spawn_with};

#[test]
fn knight_gains_defender_trait_and_generation() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let knight = spawn_with(&mut game, UnitKind::Knight, Side::White, Position::new(1, 0), &[]);
    let bishop = spawn_with(&mut game, UnitKind::Bishop, Side::Black, Position::new(2, 2), &[]);
    assert_eq!(game.profile(knight).unwrap().complexity_cost(), 15);

    let mut resolver = resolver();
    let outcome = resolver
        .resolve(&mut game, capture(1, knight, bishop, 1))
        .unwrap();

    assert_eq!(outcome.complexity, 40);
    assert_eq!(outcome.generation, 2);
    let profile = game.profile(knight).unwrap();
    assert_eq!(profile.complexity_cost(), 40);
    assert_eq!(profile.generation(), 2);
    assert!(profile.inherited().contains(TraitName::Diagonal));

    assert_eq!(
        outcome.trail.phases().collect::<Vec<_>>(),
        vec![
            ResolutionPhase::Idle,
            ResolutionPhase::CaptureDetected,
            ResolutionPhase::TraitsExtracted,
            ResolutionPhase::BudgetChecked,
            ResolutionPhase::Spliced,
            ResolutionPhase::Resolved,
        ]
    );

    let (board, telemetry) = resolver.into_parts();
    assert_eq!(board.removed, vec![bishop]);
    assert_eq!(board.moved, vec![(knight, Position::new(2, 2))]);
    assert!(matches!(telemetry.events[0], TelemetryEvent::CaptureResolved(_)));
    assert!(matches!(telemetry.events[1], TelemetryEvent::EvolutionApplied(_)));
}

#[test]
fn block_capture_rejects_gain_but_takes_the_square() {
    let mut game = complexity_match(BudgetOverflowPolicy::BlockCapture);
    let knight = spawn_with(
        &mut game,
        UnitKind::Knight,
        Side::White,
        Position::new(1, 0),
        &[TraitName::Teleport, TraitName::HiddenAbility],
    );
    let king = spawn_with(
        &mut game,
        UnitKind::King,
        Side::Black,
        Position::new(4, 7),
        &[TraitName::DoubleMove],
    );
    assert_eq!(game.profile(knight).unwrap().complexity_cost(), 85);

    let mut resolver = resolver();
    let err = resolver
        .resolve(&mut game, capture(1, knight, king, 2))
        .unwrap_err();
    let CaptureError::InsufficientBudget { budget, outcome } = err else {
        panic!("expected InsufficientBudget, got {err:?}");
    };
    assert_eq!(budget.kind, BudgetKind::Complexity);
    assert_eq!(budget.cost, 45);
    assert_eq!(budget.remaining, 15);
    assert!(outcome.applied.is_empty());

    assert_eq!(game.profile(knight).unwrap().complexity_cost(), 85);
    assert!(!game.unit(king).unwrap().alive);
    assert_eq!(resolver.board().removed, vec![king]);
}

#[test]
fn skip_trait_captures_without_gain() {
    let mut game = complexity_match(BudgetOverflowPolicy::SkipTrait);
    let knight = spawn_with(
        &mut game,
        UnitKind::Knight,
        Side::White,
        Position::new(1, 0),
        &[TraitName::Teleport, TraitName::HiddenAbility],
    );
    let king = spawn_with(
        &mut game,
        UnitKind::King,
        Side::Black,
        Position::new(4, 7),
        &[TraitName::DoubleMove],
    );

    let mut resolver = resolver();
    let outcome = resolver
        .resolve(&mut game, capture(1, knight, king, 2))
        .unwrap();
    assert!(!outcome.evolved());
    assert_eq!(outcome.branch(), Some(ResolutionPhase::Blocked));
    assert_eq!(outcome.skip_cause, Some(EvolutionSkipCause::NothingAffordable));
    assert_eq!(outcome.complexity, 85);
    assert_eq!(outcome.generation, 1);
    assert!(!game.unit(king).unwrap().alive);
    assert_eq!(resolver.telemetry().skipped().count(), 1);
}

#[test]
fn partial_capture_keeps_what_fits() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let rook = spawn_with(
        &mut game,
        UnitKind::Rook,
        Side::White,
        Position::new(0, 0),
        &[TraitName::DoubleMove],
    );
    let pawn = spawn_with(
        &mut game,
        UnitKind::Pawn,
        Side::Black,
        Position::new(0, 6),
        &[TraitName::Teleport],
    );

    let mut resolver = resolver();
    let outcome = resolver
        .resolve(&mut game, capture(1, rook, pawn, 4))
        .unwrap();
    assert_eq!(outcome.applied, vec![TraitName::ForwardStep]);
    assert_eq!(outcome.branch(), Some(ResolutionPhase::PartiallySpliced));
    assert!(
        outcome
            .skipped
            .iter()
            .any(|s| s.name == TraitName::Teleport && s.reason == SkipReason::InsufficientBudget)
    );
    assert_eq!(outcome.complexity, 75);
}

#[test]
fn diagonal_and_straight_become_combined() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let pawn = spawn_with(&mut game, UnitKind::Pawn, Side::White, Position::new(3, 1), &[]);
    let bishop = spawn_with(
        &mut game,
        UnitKind::Bishop,
        Side::Black,
        Position::new(4, 2),
        &[TraitName::Straight],
    );

    let mut resolver = resolver();
    let outcome = resolver
        .resolve(&mut game, capture(1, pawn, bishop, 1))
        .unwrap();
    let inherited: Vec<TraitName> = game.profile(pawn).unwrap().inherited().iter().collect();
    assert_eq!(inherited, vec![TraitName::Combined]);
    assert_eq!(outcome.conflicts_resolved.len(), 1);
    assert_eq!(outcome.conflicts_resolved[0].merged, TraitName::Combined);
    assert_eq!(outcome.complexity, 45);
}

#[test]
fn rook_taking_bishop_merges_with_its_base() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let rook = spawn_with(&mut game, UnitKind::Rook, Side::White, Position::new(0, 0), &[]);
    let bishop = spawn_with(&mut game, UnitKind::Bishop, Side::Black, Position::new(0, 5), &[]);

    let outcome = resolver()
        .resolve(&mut game, capture(1, rook, bishop, 1))
        .unwrap();
    assert_eq!(outcome.applied, vec![TraitName::Combined]);
    assert_eq!(outcome.conflicts_resolved.len(), 1);
    assert_eq!(outcome.complexity, 40);

    let profile = game.profile(rook).unwrap();
    let inherited: Vec<TraitName> = profile.inherited().iter().collect();
    assert_eq!(inherited, vec![TraitName::Combined]);
    assert_eq!(
        game.complexity_account(rook)
            .unwrap()
            .account
            .as_complexity()
            .unwrap()
            .current(),
        40
    );
}

#[test]
fn knight_gaining_extended_range_becomes_phantom_leap() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let knight = spawn_with(&mut game, UnitKind::Knight, Side::White, Position::new(1, 0), &[]);
    let pawn = spawn_with(
        &mut game,
        UnitKind::Pawn,
        Side::Black,
        Position::new(2, 2),
        &[TraitName::ExtendedRange],
    );

    let outcome = resolver()
        .resolve(&mut game, capture(1, knight, pawn, 1))
        .unwrap();
    let inherited: Vec<TraitName> = game.profile(knight).unwrap().inherited().iter().collect();
    assert_eq!(inherited, vec![TraitName::ForwardStep, TraitName::PhantomLeap]);
    assert_eq!(outcome.conflicts_resolved[0].merged, TraitName::PhantomLeap);
    // 15 base folded into 35, plus 5 for the pawn's step.
    assert_eq!(outcome.complexity, 40);
}

#[test]
fn held_constituent_merges_with_incoming_one() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let pawn = spawn_with(
        &mut game,
        UnitKind::Pawn,
        Side::White,
        Position::new(3, 1),
        &[TraitName::Diagonal],
    );
    let rook = spawn_with(&mut game, UnitKind::Rook, Side::Black, Position::new(3, 5), &[]);

    let mut resolver = resolver();
    let outcome = resolver
        .resolve(&mut game, capture(1, pawn, rook, 1))
        .unwrap();
    assert_eq!(outcome.applied, vec![TraitName::Combined]);
    assert_eq!(outcome.removed, vec![TraitName::Diagonal]);
    assert_eq!(outcome.complexity, 45);
    assert_eq!(
        game.complexity_account(pawn)
            .unwrap()
            .account
            .as_complexity()
            .unwrap()
            .current(),
        45
    );
}

#[test]
fn duplicate_traits_are_ignored_silently() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let knight = spawn_with(&mut game, UnitKind::Knight, Side::White, Position::new(1, 0), &[]);
    let other = spawn_with(&mut game, UnitKind::Knight, Side::Black, Position::new(2, 2), &[]);

    let mut resolver = resolver();
    let outcome = resolver
        .resolve(&mut game, capture(1, knight, other, 1))
        .unwrap();
    assert!(!outcome.evolved());
    assert_eq!(outcome.skipped[0].reason, SkipReason::DuplicateTraitIgnored);
    assert_eq!(outcome.complexity, 15);
    assert_eq!(game.profile(knight).unwrap().captures_made(), 1);
}

#[test]
fn hidden_traits_pass_on_only_once_revealed() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let rook = spawn_with(&mut game, UnitKind::Rook, Side::White, Position::new(0, 0), &[]);
    let queen = spawn_with(&mut game, UnitKind::Queen, Side::White, Position::new(3, 0), &[]);
    let first = spawn_with(
        &mut game,
        UnitKind::Pawn,
        Side::Black,
        Position::new(0, 6),
        &[TraitName::HiddenAbility],
    );
    let second = spawn_with(
        &mut game,
        UnitKind::Pawn,
        Side::Black,
        Position::new(3, 6),
        &[TraitName::HiddenAbility],
    );
    assert!(game.reveal(second, TraitName::HiddenAbility));

    let mut resolver = resolver();
    let hidden = resolver
        .resolve(&mut game, capture(1, rook, first, 1))
        .unwrap();
    assert!(
        hidden
            .skipped
            .iter()
            .any(|s| s.reason == SkipReason::HiddenUnrevealed)
    );
    assert!(!game.profile(rook).unwrap().inherited().contains(TraitName::HiddenAbility));

    resolver
        .resolve(&mut game, capture(2, queen, second, 1))
        .unwrap();
    assert!(game.profile(queen).unwrap().inherited().contains(TraitName::HiddenAbility));
}

#[test]
fn lineage_follows_capture_order() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let queen = spawn_with(&mut game, UnitKind::Queen, Side::White, Position::new(3, 0), &[]);
    let victims: Vec<_> = (0..3u8)
        .map(|file| {
            spawn_with(&mut game, UnitKind::Pawn, Side::Black, Position::new(file, 6), &[])
        })
        .collect();

    let mut resolver = resolver();
    for (turn, &victim) in victims.iter().enumerate() {
        resolver
            .resolve(&mut game, capture(turn as u64 + 1, queen, victim, turn as u32))
            .unwrap();
    }
    let profile = game.profile(queen).unwrap();
    assert_eq!(profile.lineage(), victims.as_slice());
    assert_eq!(profile.captures_made(), 3);
    // Only the first pawn had anything new to give.
    assert_eq!(profile.generation(), 2);
}
