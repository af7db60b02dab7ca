//! Pieces carried from one match into the next.

use gambit_engine::{
    BudgetOverflowPolicy, Inventory, InventoryError, InventoryPieceRecord, MatchId, MatchRules,
    MatchState, PersistenceCollaborator, Position, Side, SpawnError, TraitName, UnitKind,
};
use gambit_types::RarityTier;

use crate::common::{capture, complexity_match, resolver, spawn_with};

#[test]
fn evolved_piece_survives_into_the_next_match() {
    let mut first = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let knight = spawn_with(&mut first, UnitKind::Knight, Side::White, Position::new(1, 0), &[]);
    let rook = spawn_with(&mut first, UnitKind::Rook, Side::Black, Position::new(1, 2), &[]);
    resolver()
        .resolve(&mut first, capture(1, knight, rook, 1))
        .unwrap();
    let evolved = first.profile(knight).unwrap().clone();

    let mut inventory = Inventory::with_default_slots("0xfeed");
    let piece = inventory.save(&evolved, 1, Some("Rookbane".into())).unwrap();

    let mut second = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let pawn = spawn_with(&mut second, UnitKind::Pawn, Side::Black, Position::new(0, 6), &[]);
    let veteran = inventory
        .deploy_into(piece, &mut second, Side::White, Position::new(0, 0), 0)
        .unwrap();

    let deployed = second.profile(veteran).unwrap();
    assert_eq!(deployed.inherited(), evolved.inherited());
    assert_eq!(deployed.complexity_cost(), evolved.complexity_cost());
    assert_eq!(deployed.generation(), 2);
    assert_eq!(
        second
            .complexity_account(veteran)
            .unwrap()
            .account
            .remaining(),
        100 - evolved.complexity_cost()
    );

    resolver()
        .resolve(&mut second, capture(1, veteran, pawn, 2))
        .unwrap();
    let record = inventory
        .return_from_match(piece, second.profile(veteran).unwrap())
        .unwrap();
    assert_eq!(
        record.traits.iter().collect::<Vec<_>>(),
        vec![TraitName::ForwardStep, TraitName::Straight]
    );
    assert_eq!(record.captures_made, 2);
    assert_eq!(record.games_played, 2);
    assert_eq!(record.evolution_count, 2);
}

#[test]
fn rarity_needs_both_traits_and_games() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let pawn = spawn_with(
        &mut game,
        UnitKind::Pawn,
        Side::White,
        Position::new(0, 1),
        &[
            TraitName::Leap,
            TraitName::Diagonal,
            TraitName::Adjacent,
            TraitName::HiddenAbility,
        ],
    );
    let profile = game.profile(pawn).unwrap();

    let mut inventory = Inventory::with_default_slots("0xfeed");
    let veteran = inventory.save(profile, 25, None).unwrap();
    let rookie = inventory.save(profile, 24, None).unwrap();
    assert_eq!(inventory.get(veteran).unwrap().rarity, RarityTier::Epic);
    assert_eq!(inventory.get(rookie).unwrap().rarity, RarityTier::Rare);

    // One more game promotes the rookie.
    inventory.deploy(rookie, game.next_unit_id(), 0).unwrap();
    assert_eq!(inventory.get(rookie).unwrap().rarity, RarityTier::Epic);
}

#[test]
fn persistence_seam_assigns_ids_and_enforces_slots() {
    let mut game = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let bishop = spawn_with(&mut game, UnitKind::Bishop, Side::White, Position::new(2, 0), &[]);
    let profile = game.profile(bishop).unwrap();

    let mut store = Inventory::new("0xfeed", 1);
    let record = InventoryPieceRecord::from_profile("0xfeed", profile, 1);
    let id = store.save_record(record.clone()).unwrap();
    assert_eq!(store.load_record(id).unwrap().kind, UnitKind::Bishop);
    assert_eq!(
        store.save_record(record),
        Err(InventoryError::Full { max_slots: 1 })
    );
    assert_eq!(store.stats().available_slots, 0);
}

#[test]
fn piece_too_big_for_the_match_stays_in_the_inventory() {
    let mut first = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let knight = spawn_with(&mut first, UnitKind::Knight, Side::White, Position::new(1, 0), &[]);
    let bishop = spawn_with(&mut first, UnitKind::Bishop, Side::Black, Position::new(2, 2), &[]);
    resolver()
        .resolve(&mut first, capture(1, knight, bishop, 1))
        .unwrap();

    let mut inventory = Inventory::with_default_slots("0xfeed");
    let piece = inventory
        .save(first.profile(knight).unwrap(), 9, None)
        .unwrap();
    let before = inventory.get(piece).unwrap().clone();

    let mut tight = MatchState::new(
        MatchId::new(7),
        MatchRules {
            max_complexity: 30,
            ..MatchRules::default()
        },
    );
    let err = inventory
        .deploy_into(piece, &mut tight, Side::White, Position::new(1, 0), 0)
        .unwrap_err();
    assert!(matches!(
        err,
        InventoryError::Spawn {
            source: SpawnError::OverBudget(_),
            ..
        }
    ));
    assert_eq!(inventory.get(piece).unwrap(), &before);
    assert_eq!(tight.units().count(), 0);

    let mut roomy = complexity_match(BudgetOverflowPolicy::PartialCapture);
    let unit = inventory
        .deploy_into(piece, &mut roomy, Side::White, Position::new(1, 0), 0)
        .unwrap();
    assert_eq!(roomy.profile(unit).unwrap().complexity_cost(), 40);
    assert_eq!(inventory.get(piece).unwrap().games_played, 10);
}
