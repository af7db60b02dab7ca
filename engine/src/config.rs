use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use gambit_core::{BudgetOverflowPolicy, ComplexityBudget, DecayRule, GasAccount};

use crate::gate::TimeoutFallback;

/// Contents of `~/.gambit/config.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    pub budget: Option<BudgetConfig>,
    pub decay: Option<DecayConfig>,
    pub decision: Option<DecisionConfig>,
    pub inventory: Option<InventoryConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Which account pays for inheritance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Economy {
    /// Each unit's complexity budget; captures resolve immediately.
    #[default]
    Complexity,
    /// Each player's gas allowance; captures wait on a player decision.
    Gas,
}

#[derive(Debug, Default, Deserialize)]
pub struct BudgetConfig {
    #[serde(default)]
    pub economy: Economy,
    pub max_complexity: Option<u32>,
    pub starting_gas: Option<u32>,
    #[serde(default)]
    pub overflow_policy: BudgetOverflowPolicy,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecayConfig {
    #[serde(default)]
    pub enabled: bool,
    pub every_idle_turns: Option<u32>,
    pub amount: Option<u32>,
    pub floor: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionConfig {
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub timeout_fallback: TimeoutFallback,
    /// Count a skipped evolution as a generation.
    #[serde(default)]
    pub generation_on_skip: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryConfig {
    pub max_slots: Option<usize>,
}

/// Resolved per-match settings with defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    pub economy: Economy,
    pub max_complexity: u32,
    pub starting_gas: u32,
    pub overflow_policy: BudgetOverflowPolicy,
    pub decay: Option<DecayRule>,
    pub decision_timeout: Duration,
    pub timeout_fallback: TimeoutFallback,
    pub generation_on_skip: bool,
}

impl MatchRules {
    pub const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_DECAY: DecayRule = DecayRule {
        every_idle_turns: 5,
        amount: 5,
        floor: 0,
    };
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            economy: Economy::Complexity,
            max_complexity: ComplexityBudget::DEFAULT_MAX,
            starting_gas: GasAccount::DEFAULT_STARTING,
            overflow_policy: BudgetOverflowPolicy::default(),
            decay: None,
            decision_timeout: Self::DEFAULT_DECISION_TIMEOUT,
            timeout_fallback: TimeoutFallback::default(),
            generation_on_skip: false,
        }
    }
}

pub const DEFAULT_MAX_SLOTS: usize = 10;

impl EngineConfig {
    /// Load from the default location. A missing file is not an error.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn rules(&self) -> MatchRules {
        let defaults = MatchRules::default();
        let budget = self.budget.as_ref();
        let decision = self.decision.as_ref();

        let decay = self.decay.as_ref().filter(|d| d.enabled).map(|d| DecayRule {
            every_idle_turns: d
                .every_idle_turns
                .unwrap_or(MatchRules::DEFAULT_DECAY.every_idle_turns),
            amount: d.amount.unwrap_or(MatchRules::DEFAULT_DECAY.amount),
            floor: d.floor.unwrap_or(MatchRules::DEFAULT_DECAY.floor),
        });

        MatchRules {
            economy: budget.map_or(defaults.economy, |b| b.economy),
            max_complexity: budget
                .and_then(|b| b.max_complexity)
                .unwrap_or(defaults.max_complexity),
            starting_gas: budget
                .and_then(|b| b.starting_gas)
                .unwrap_or(defaults.starting_gas),
            overflow_policy: budget.map_or(defaults.overflow_policy, |b| b.overflow_policy),
            decay,
            decision_timeout: decision
                .and_then(|d| d.timeout_ms)
                .map_or(defaults.decision_timeout, Duration::from_millis),
            timeout_fallback: decision.map_or(defaults.timeout_fallback, |d| d.timeout_fallback),
            generation_on_skip: decision.is_some_and(|d| d.generation_on_skip),
        }
    }

    #[must_use]
    pub fn max_slots(&self) -> usize {
        self.inventory
            .as_ref()
            .and_then(|i| i.max_slots)
            .unwrap_or(DEFAULT_MAX_SLOTS)
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gambit").join("config.toml"))
}
