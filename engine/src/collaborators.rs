//! Seams between the engine and the rest of the game.
//!
//! The engine never touches the board, the player, storage or metrics directly.
//! Each is reached through one of these traits so matches can run headless in
//! tests and replays.

use std::future::Future;

use gambit_types::{
    CaptureResolvedEvent, EvolutionAppliedEvent, EvolutionSkippedEvent, PieceId, Position, UnitId,
};

use crate::gate::{EvolutionDecision, EvolutionOffer};
use crate::inventory::{InventoryError, InventoryPieceRecord};

/// Board state owned outside the engine.
pub trait BoardCollaborator {
    fn remove_unit(&mut self, unit: UnitId);

    /// The attacker now stands on the square it captured.
    fn confirm_attacker_position(&mut self, attacker: UnitId, position: Position);
}

impl<B: BoardCollaborator + ?Sized> BoardCollaborator for &mut B {
    fn remove_unit(&mut self, unit: UnitId) {
        (**self).remove_unit(unit);
    }

    fn confirm_attacker_position(&mut self, attacker: UnitId, position: Position) {
        (**self).confirm_attacker_position(attacker, position);
    }
}

/// Asks the capturing player which offered traits to take.
pub trait PlayerDecisionCollaborator {
    fn request_evolution_choice(
        &mut self,
        offer: &EvolutionOffer,
    ) -> impl Future<Output = EvolutionDecision> + Send;
}

/// Long-lived storage for pieces that outlive a match.
pub trait PersistenceCollaborator {
    /// Store a record. The record's id is assigned by the store and returned.
    fn save_record(&mut self, record: InventoryPieceRecord) -> Result<PieceId, InventoryError>;

    fn load_record(&self, id: PieceId) -> Option<InventoryPieceRecord>;
}

pub trait TelemetryCollaborator {
    fn capture_resolved(&mut self, event: &CaptureResolvedEvent);
    fn evolution_applied(&mut self, event: &EvolutionAppliedEvent);
    fn evolution_skipped(&mut self, event: &EvolutionSkippedEvent);
}

impl<T: TelemetryCollaborator + ?Sized> TelemetryCollaborator for &mut T {
    fn capture_resolved(&mut self, event: &CaptureResolvedEvent) {
        (**self).capture_resolved(event);
    }

    fn evolution_applied(&mut self, event: &EvolutionAppliedEvent) {
        (**self).evolution_applied(event);
    }

    fn evolution_skipped(&mut self, event: &EvolutionSkippedEvent) {
        (**self).evolution_skipped(event);
    }
}

/// Board that accepts every update and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBoard;

impl BoardCollaborator for NullBoard {
    fn remove_unit(&mut self, _unit: UnitId) {}

    fn confirm_attacker_position(&mut self, _attacker: UnitId, _position: Position) {}
}

/// Forwards telemetry to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetryCollaborator for TracingTelemetry {
    fn capture_resolved(&mut self, event: &CaptureResolvedEvent) {
        tracing::info!(
            capture = %event.capture_id,
            attacker = %event.attacker,
            defender = %event.defender,
            turn = event.turn,
            generation = event.generation,
            complexity = event.complexity,
            "Capture resolved"
        );
    }

    fn evolution_applied(&mut self, event: &EvolutionAppliedEvent) {
        tracing::info!(
            capture = %event.capture_id,
            unit = %event.unit,
            applied = ?event.applied,
            removed = ?event.removed,
            generation = event.generation,
            "Evolution applied"
        );
    }

    fn evolution_skipped(&mut self, event: &EvolutionSkippedEvent) {
        tracing::info!(
            capture = %event.capture_id,
            unit = %event.unit,
            cause = ?event.cause,
            skipped = event.skipped.len(),
            "Evolution skipped"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    CaptureResolved(CaptureResolvedEvent),
    EvolutionApplied(EvolutionAppliedEvent),
    EvolutionSkipped(EvolutionSkippedEvent),
}

/// Keeps every event in emission order.
#[derive(Debug, Default, Clone)]
pub struct RecordingTelemetry {
    pub events: Vec<TelemetryEvent>,
}

impl RecordingTelemetry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> impl Iterator<Item = &EvolutionAppliedEvent> {
        self.events.iter().filter_map(|event| match event {
            TelemetryEvent::EvolutionApplied(applied) => Some(applied),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &EvolutionSkippedEvent> {
        self.events.iter().filter_map(|event| match event {
            TelemetryEvent::EvolutionSkipped(skipped) => Some(skipped),
            _ => None,
        })
    }
}

impl TelemetryCollaborator for RecordingTelemetry {
    fn capture_resolved(&mut self, event: &CaptureResolvedEvent) {
        self.events
            .push(TelemetryEvent::CaptureResolved(event.clone()));
    }

    fn evolution_applied(&mut self, event: &EvolutionAppliedEvent) {
        self.events
            .push(TelemetryEvent::EvolutionApplied(event.clone()));
    }

    fn evolution_skipped(&mut self, event: &EvolutionSkippedEvent) {
        self.events
            .push(TelemetryEvent::EvolutionSkipped(event.clone()));
    }
}
