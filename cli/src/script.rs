//! Replay scripts: a roster of units and the captures played between them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use gambit_engine::{
    CaptureEvent, CaptureId, EvolutionDecision, EvolutionOffer, GeneticProfile, MatchState,
    PlayerDecisionCollaborator, Position, Side, TraitName, UnitId, UnitKind,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub units: Vec<ScriptUnit>,
    #[serde(default)]
    pub captures: Vec<ScriptCapture>,
    /// Units to store in the inventory once the replay ends.
    #[serde(default)]
    pub save: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptUnit {
    pub kind: UnitKind,
    pub side: Side,
    pub position: Position,
    /// Traits the unit starts with on top of its base trait.
    #[serde(default)]
    pub traits: Vec<TraitName>,
    #[serde(default)]
    pub revealed: Vec<TraitName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptCapture {
    pub attacker: u32,
    pub defender: u32,
    pub turn: u32,
    /// Only read under the gas economy. Absent means "take what I can afford".
    #[serde(default)]
    pub decision: Option<ScriptDecision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptDecision {
    Accept(Vec<TraitName>),
    Skip,
}

impl From<ScriptDecision> for EvolutionDecision {
    fn from(decision: ScriptDecision) -> Self {
        match decision {
            ScriptDecision::Accept(names) => EvolutionDecision::Accept(names),
            ScriptDecision::Skip => EvolutionDecision::Skip,
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid script {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(content)?;
        let count = script.units.len();
        for (index, capture) in script.captures.iter().enumerate() {
            if capture.attacker as usize >= count || capture.defender as usize >= count {
                bail!("capture {index} refers to a unit outside the roster of {count}");
            }
        }
        if let Some(missing) = script.save.iter().find(|&&unit| unit as usize >= count) {
            bail!("cannot save unit {missing}: roster has {count} units");
        }
        Ok(script)
    }

    /// Spawn every unit in roster order, so roster index `i` becomes `UnitId(i)`.
    pub fn populate(&self, game: &mut MatchState) -> Result<Vec<UnitId>> {
        let mut ids = Vec::with_capacity(self.units.len());
        for (index, unit) in self.units.iter().enumerate() {
            let owner = game.next_unit_id();
            let profile = GeneticProfile::rehydrate(
                owner,
                unit.kind,
                unit.traits.iter().copied().collect(),
                0,
                0,
            );
            let id = game
                .spawn_profile(unit.side, unit.position, profile)
                .with_context(|| format!("failed to spawn unit {index} ({})", unit.kind))?;
            for &name in &unit.revealed {
                if !game.reveal(id, name) {
                    tracing::warn!(unit = %id, %name, "Nothing to reveal");
                }
            }
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn events(&self) -> impl Iterator<Item = (CaptureEvent, Option<ScriptDecision>)> + '_ {
        self.captures.iter().zip(1u64..).map(|(capture, id)| {
            let event = CaptureEvent {
                capture_id: CaptureId::new(id),
                attacker: UnitId::new(capture.attacker),
                defender: UnitId::new(capture.defender),
                turn: capture.turn,
            };
            (event, capture.decision.clone())
        })
    }
}

/// Answers with the scripted decision, or the affordable set when there is none.
pub struct ScriptedPlayer {
    decision: Option<EvolutionDecision>,
}

impl ScriptedPlayer {
    pub fn new(decision: Option<ScriptDecision>) -> Self {
        Self {
            decision: decision.map(Into::into),
        }
    }
}

impl PlayerDecisionCollaborator for ScriptedPlayer {
    async fn request_evolution_choice(&mut self, offer: &EvolutionOffer) -> EvolutionDecision {
        self.decision
            .take()
            .unwrap_or_else(|| EvolutionDecision::Accept(offer.affordable_selection()))
    }
}
