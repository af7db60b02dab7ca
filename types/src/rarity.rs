use std::fmt;

use serde::{Deserialize, Serialize};

/// Rarity of a persisted piece, ordered from least to most rare.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RarityTier {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl RarityTier {
    pub const ALL: [RarityTier; 6] = [
        RarityTier::Common,
        RarityTier::Uncommon,
        RarityTier::Rare,
        RarityTier::Epic,
        RarityTier::Legendary,
        RarityTier::Mythic,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RarityTier::Common => "COMMON",
            RarityTier::Uncommon => "UNCOMMON",
            RarityTier::Rare => "RARE",
            RarityTier::Epic => "EPIC",
            RarityTier::Legendary => "LEGENDARY",
            RarityTier::Mythic => "MYTHIC",
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
