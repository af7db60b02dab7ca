//! Pieces kept between matches.
//!
//! A profile is projected to an [`InventoryPieceRecord`] when its owner saves it
//! at match end, and rehydrated into a fresh [`GeneticProfile`] when deployed
//! into a later match. Rarity is recomputed whenever traits or games played move.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gambit_core::{GeneticProfile, TraitCatalog, classify, total_complexity};
use gambit_types::{PieceId, Position, RarityTier, Side, TraitSet, UnitId, UnitKind};

use crate::arena::{MatchState, SpawnError};
use crate::collaborators::PersistenceCollaborator;
use crate::config::DEFAULT_MAX_SLOTS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPieceRecord {
    pub id: PieceId,
    pub owner: String,
    pub kind: UnitKind,
    pub traits: TraitSet,
    pub name: Option<String>,
    pub games_played: u32,
    pub captures_made: u32,
    pub evolution_count: u32,
    pub rarity: RarityTier,
    pub locked: bool,
    pub available: bool,
}

impl InventoryPieceRecord {
    /// Project a profile at match end. The id is assigned when the record is saved.
    #[must_use]
    pub fn from_profile(owner: impl Into<String>, profile: &GeneticProfile, games_played: u32) -> Self {
        let traits = profile.inherited().clone();
        Self {
            id: PieceId::new(0),
            owner: owner.into(),
            kind: profile.kind(),
            rarity: classify(traits.len(), games_played),
            traits,
            name: None,
            games_played,
            captures_made: profile.captures_made(),
            evolution_count: profile.evolution_count(),
            locked: false,
            available: true,
        }
    }

    #[must_use]
    pub fn complexity_cost(&self) -> u32 {
        total_complexity(TraitCatalog::base_trait(self.kind).name, &self.traits)
    }

    /// Fresh profile for `unit` carrying this piece's traits.
    #[must_use]
    pub fn rehydrate(&self, unit: UnitId, turn: u32) -> GeneticProfile {
        GeneticProfile::rehydrate(unit, self.kind, self.traits.clone(), self.evolution_count, turn)
    }

    fn reclassify(&mut self) {
        self.rarity = classify(self.traits.len(), self.games_played);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("inventory is full ({max_slots} slots)")]
    Full { max_slots: usize },
    #[error("piece {0} not found")]
    NotFound(PieceId),
    #[error("piece {0} is locked")]
    Locked(PieceId),
    #[error("piece {0} is deployed in a match")]
    Unavailable(PieceId),
    #[error("piece {0} is not deployed")]
    NotDeployed(PieceId),
    #[error("piece {id} cannot join the match: {source}")]
    Spawn { id: PieceId, source: SpawnError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total_pieces: usize,
    pub max_slots: usize,
    pub available_slots: usize,
    pub total_captures: u32,
    pub total_evolutions: u32,
    pub rarity_distribution: BTreeMap<RarityTier, usize>,
    pub locked_pieces: usize,
}

/// One owner's pieces, held in memory.
#[derive(Debug, Clone)]
pub struct Inventory {
    owner: String,
    max_slots: usize,
    pieces: BTreeMap<PieceId, InventoryPieceRecord>,
    next_id: u64,
}

impl Inventory {
    #[must_use]
    pub fn new(owner: impl Into<String>, max_slots: usize) -> Self {
        Self {
            owner: owner.into(),
            max_slots,
            pieces: BTreeMap::new(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn with_default_slots(owner: impl Into<String>) -> Self {
        Self::new(owner, DEFAULT_MAX_SLOTS)
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.max_slots.saturating_sub(self.pieces.len())
    }

    #[must_use]
    pub fn get(&self, id: PieceId) -> Option<&InventoryPieceRecord> {
        self.pieces.get(&id)
    }

    pub fn pieces(&self) -> impl Iterator<Item = &InventoryPieceRecord> {
        self.pieces.values()
    }

    /// Save a unit's profile after a match.
    pub fn save(
        &mut self,
        profile: &GeneticProfile,
        games_played: u32,
        name: Option<String>,
    ) -> Result<PieceId, InventoryError> {
        let mut record = InventoryPieceRecord::from_profile(self.owner.clone(), profile, games_played);
        record.name = name;
        self.save_record(record)
    }

    /// Take a piece into a match as `unit`.
    ///
    /// If the caller then fails to place the profile, [`Self::cancel_deploy`]
    /// puts the piece back. [`Self::deploy_into`] does both.
    pub fn deploy(&mut self, id: PieceId, unit: UnitId, turn: u32) -> Result<GeneticProfile, InventoryError> {
        let record = self.pieces.get_mut(&id).ok_or(InventoryError::NotFound(id))?;
        if record.locked {
            return Err(InventoryError::Locked(id));
        }
        if !record.available {
            return Err(InventoryError::Unavailable(id));
        }
        record.available = false;
        record.games_played += 1;
        record.reclassify();
        tracing::info!(piece = %id, %unit, games_played = record.games_played, "Piece deployed");
        Ok(record.rehydrate(unit, turn))
    }

    /// Deploy a piece and spawn it in `game`, leaving the piece untouched if
    /// the match can't take it.
    pub fn deploy_into(
        &mut self,
        id: PieceId,
        game: &mut MatchState,
        side: Side,
        position: Position,
        turn: u32,
    ) -> Result<UnitId, InventoryError> {
        let profile = self.deploy(id, game.next_unit_id(), turn)?;
        match game.spawn_profile(side, position, profile) {
            Ok(unit) => Ok(unit),
            Err(source) => {
                self.cancel_deploy(id)?;
                Err(InventoryError::Spawn { id, source })
            }
        }
    }

    /// Undo a [`Self::deploy`] whose profile never entered a match.
    pub fn cancel_deploy(&mut self, id: PieceId) -> Result<(), InventoryError> {
        let record = self.record_mut(id)?;
        if record.available {
            return Err(InventoryError::NotDeployed(id));
        }
        record.available = true;
        record.games_played = record.games_played.saturating_sub(1);
        record.reclassify();
        tracing::info!(piece = %id, "Deploy cancelled");
        Ok(())
    }

    /// Bring a deployed piece back with whatever it gained in the match.
    pub fn return_from_match(
        &mut self,
        id: PieceId,
        profile: &GeneticProfile,
    ) -> Result<&InventoryPieceRecord, InventoryError> {
        let record = self.pieces.get_mut(&id).ok_or(InventoryError::NotFound(id))?;
        if record.available {
            return Err(InventoryError::NotDeployed(id));
        }
        record.traits = profile.inherited().clone();
        record.captures_made += profile.captures_made();
        record.evolution_count = profile.evolution_count();
        record.available = true;
        record.reclassify();
        Ok(record)
    }

    pub fn lock(&mut self, id: PieceId) -> Result<(), InventoryError> {
        self.record_mut(id)?.locked = true;
        Ok(())
    }

    pub fn unlock(&mut self, id: PieceId) -> Result<(), InventoryError> {
        self.record_mut(id)?.locked = false;
        Ok(())
    }

    pub fn rename(&mut self, id: PieceId, name: impl Into<String>) -> Result<(), InventoryError> {
        self.record_mut(id)?.name = Some(name.into());
        Ok(())
    }

    pub fn delete(&mut self, id: PieceId) -> Result<InventoryPieceRecord, InventoryError> {
        let record = self.pieces.get(&id).ok_or(InventoryError::NotFound(id))?;
        if record.locked {
            return Err(InventoryError::Locked(id));
        }
        self.pieces.remove(&id).ok_or(InventoryError::NotFound(id))
    }

    #[must_use]
    pub fn stats(&self) -> InventoryStats {
        let mut rarity_distribution: BTreeMap<RarityTier, usize> =
            RarityTier::ALL.iter().map(|&tier| (tier, 0)).collect();
        for record in self.pieces.values() {
            *rarity_distribution.entry(record.rarity).or_default() += 1;
        }
        InventoryStats {
            total_pieces: self.pieces.len(),
            max_slots: self.max_slots,
            available_slots: self.available_slots(),
            total_captures: self.pieces.values().map(|r| r.captures_made).sum(),
            total_evolutions: self.pieces.values().map(|r| r.evolution_count).sum(),
            rarity_distribution,
            locked_pieces: self.pieces.values().filter(|r| r.locked).count(),
        }
    }

    fn record_mut(&mut self, id: PieceId) -> Result<&mut InventoryPieceRecord, InventoryError> {
        self.pieces.get_mut(&id).ok_or(InventoryError::NotFound(id))
    }
}

impl PersistenceCollaborator for Inventory {
    fn save_record(&mut self, mut record: InventoryPieceRecord) -> Result<PieceId, InventoryError> {
        if self.pieces.len() >= self.max_slots {
            tracing::warn!(owner = %self.owner, max_slots = self.max_slots, "Inventory full");
            return Err(InventoryError::Full {
                max_slots: self.max_slots,
            });
        }
        let id = PieceId::new(self.next_id);
        self.next_id += 1;
        record.id = id;
        record.reclassify();
        tracing::info!(piece = %id, kind = %record.kind, rarity = %record.rarity, "Piece saved");
        self.pieces.insert(id, record);
        Ok(id)
    }

    fn load_record(&self, id: PieceId) -> Option<InventoryPieceRecord> {
        self.pieces.get(&id).cloned()
    }
}
