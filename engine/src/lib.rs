//! Match orchestration for Gambit.
//!
//! This crate drives captures through the core splice logic: the per-match
//! arena, the capture resolver state machine, the player decision gate, the
//! collaborator seams, the inventory, and TOML configuration.

mod arena;
pub mod collaborators;
mod config;
mod gate;
mod inventory;
pub mod phase;
mod resolver;

pub use arena::{MatchState, SpawnError};
pub use collaborators::{
    BoardCollaborator, NullBoard, PersistenceCollaborator, PlayerDecisionCollaborator,
    RecordingTelemetry, TelemetryCollaborator, TelemetryEvent, TracingTelemetry,
};
pub use config::{
    BudgetConfig, ConfigError, DEFAULT_MAX_SLOTS, DecayConfig, DecisionConfig, Economy,
    EngineConfig, InventoryConfig, MatchRules, config_path,
};
pub use gate::{
    EvolutionDecision, EvolutionDecisionGate, EvolutionOffer, GateError, OfferedTrait,
    TimeoutFallback,
};
pub use inventory::{Inventory, InventoryError, InventoryPieceRecord, InventoryStats};
pub use phase::{PhaseTrail, ResolutionEdge, ResolutionPhase, TransitionReceipt};
pub use resolver::{CaptureError, CaptureResolver, EvolutionOutcome};

pub use gambit_core::{BudgetAccount, BudgetOverflowPolicy, GeneticProfile, InsufficientBudget};
pub use gambit_types::{
    CaptureEvent, CaptureId, MatchId, PieceId, Position, Side, TraitName, UnitId, UnitKind,
};
