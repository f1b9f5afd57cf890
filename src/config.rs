use std::path::Path;
use std::time::Duration;

use tracing::warn;

use crate::ai::{Heuristic, HeuristicWeights, MinimaxAgent, StoreDifference, WeightedHeuristic};
use crate::arbiter::ArbiterConfig;
use crate::error::ConfigError;

/// Board dimensions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub holes: usize,
    pub seeds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig { holes: 7, seeds: 7 }
    }
}

/// Leaf evaluator used by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluator {
    Weighted,
    StoreDifference,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub depth: usize,
    /// Per-move budget for iterative deepening. `0` turns the limit off and
    /// every move is searched to `depth`.
    pub time_limit_ms: Option<u64>,
    pub evaluator: Evaluator,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            depth: 10,
            time_limit_ms: Some(2000),
            evaluator: Evaluator::Weighted,
        }
    }
}

impl SearchConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Build a minimax agent from these settings.
    pub fn build_agent(&self, weights: &HeuristicWeights) -> MinimaxAgent {
        let heuristic: Box<dyn Heuristic> = match self.evaluator {
            Evaluator::Weighted => Box::new(WeightedHeuristic::new(weights.clone())),
            Evaluator::StoreDifference => Box::new(StoreDifference),
        };
        MinimaxAgent::with_heuristic(self.depth, heuristic).with_time_limit(self.time_limit())
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub search: SearchConfig,
    pub heuristic: HeuristicWeights,
    pub arbiter: ArbiterConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.holes == 0 {
            return Err(ConfigError::Validation("game.holes must be > 0".into()));
        }
        if self.search.depth == 0 {
            return Err(ConfigError::Validation("search.depth must be > 0".into()));
        }

        let w = &self.heuristic;
        let weights = [
            ("own_store", w.own_store),
            ("opponent_store", w.opponent_store),
            ("own_seeds", w.own_seeds),
            ("opponent_seeds", w.opponent_seeds),
            ("non_empty_holes", w.non_empty_holes),
            ("leftmost_hole", w.leftmost_hole),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "heuristic.{name} must be a finite value >= 0"
                )));
            }
        }

        if let Some(command) = &self.arbiter.opponent {
            if command.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "arbiter.opponent must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}
