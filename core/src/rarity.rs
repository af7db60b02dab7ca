//! Rarity classification for persisted pieces.

use gambit_types::RarityTier;

/// Minimum trait count and games played for each tier above `Common`.
///
/// A piece gets the highest tier whose two minimums it meets.
const THRESHOLDS: [(RarityTier, usize, u32); 5] = [
    (RarityTier::Mythic, 8, 100),
    (RarityTier::Legendary, 6, 50),
    (RarityTier::Epic, 4, 25),
    (RarityTier::Rare, 2, 10),
    (RarityTier::Uncommon, 1, 3),
];

#[must_use]
pub fn classify(trait_count: usize, games_played: u32) -> RarityTier {
    THRESHOLDS
        .iter()
        .find(|&&(_, min_traits, min_games)| {
            trait_count >= min_traits && games_played >= min_games
        })
        .map_or(RarityTier::Common, |&(tier, _, _)| tier)
}
