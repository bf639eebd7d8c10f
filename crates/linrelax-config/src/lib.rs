//! Configuration system for linrelax.
//!
//! Load solver configuration from TOML or YAML to choose the relaxation
//! variant, pivot selector and conflict resolution strategy without code
//! changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use linrelax_config::{ConflictStrategyType, RelaxationConfig, SolverConfig};
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     tolerance = 1e-8
//!     random_seed = 7
//!
//!     [relaxation]
//!     type = "gauss_seidel"
//!     max_iterations = 2000
//!
//!     [pivot_selector]
//!     type = "two_phase"
//!     distance = 4
//!
//!     [conflict_resolution]
//!     strategy = "binary_search"
//! "#).unwrap();
//!
//! assert_eq!(config.tolerance, Some(1e-8));
//! assert!(matches!(config.relaxation, RelaxationConfig::GaussSeidel(_)));
//! assert_eq!(
//!     config.conflict_resolution.map(|c| c.strategy),
//!     Some(ConflictStrategyType::BinarySearch)
//! );
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use linrelax_config::SolverConfig;
//!
//! let config = SolverConfig::load("linrelax.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main solver configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Residual below which a constraint counts as satisfied.
    #[serde(default)]
    pub tolerance: Option<f64>,

    /// Zero all variables before each solve instead of reusing prior values.
    #[serde(default)]
    pub reset: bool,

    /// Random seed for reproducible pivot selection.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Relaxation variant.
    #[serde(default)]
    pub relaxation: RelaxationConfig,

    /// Pivot selection strategy (used by pivot-based relaxation).
    #[serde(default)]
    pub pivot_selector: PivotSelectorConfig,

    /// Conflict resolution wrapped around the relaxation, if any.
    #[serde(default)]
    pub conflict_resolution: Option<ConflictResolutionConfig>,
}

impl SolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Enables or disables resetting values before each solve.
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the relaxation variant.
    pub fn with_relaxation(mut self, relaxation: RelaxationConfig) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Sets the pivot selector.
    pub fn with_pivot_selector(mut self, pivot_selector: PivotSelectorConfig) -> Self {
        self.pivot_selector = pivot_selector;
        self
    }

    /// Wraps the relaxation in a conflict resolution strategy.
    pub fn with_conflict_resolution(mut self, strategy: ConflictStrategyType) -> Self {
        self.conflict_resolution = Some(ConflictResolutionConfig {
            strategy,
            ..self.conflict_resolution.unwrap_or_default()
        });
        self
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tolerance) = self.tolerance {
            positive("tolerance", tolerance)?;
        }
        match &self.relaxation {
            RelaxationConfig::Kaczmarz(c) => {
                nonzero("relaxation.max_iterations", c.max_iterations)?;
                if let Some(factor) = c.relaxation_factor {
                    relaxation_factor(factor)?;
                }
                if let Some(cooling) = c.cooling_factor {
                    unit_interval("relaxation.cooling_factor", cooling)?;
                }
            }
            RelaxationConfig::GaussSeidel(c) => {
                nonzero("relaxation.max_iterations", c.max_iterations)?;
                if let Some(factor) = c.relaxation_factor {
                    relaxation_factor(factor)?;
                }
            }
            RelaxationConfig::ForceDirected(c) => {
                nonzero("relaxation.max_iterations", c.max_iterations)?;
                nonzero("relaxation.hard_sweeps", c.hard_sweeps)?;
                if let Some(cooling) = c.cooling_factor {
                    unit_interval("relaxation.cooling_factor", cooling)?;
                }
            }
        }
        match &self.pivot_selector {
            PivotSelectorConfig::TwoPhase(c) if c.distance == Some(0) => {
                return Err(ConfigError::Invalid(
                    "pivot_selector.distance must be at least 1".to_string(),
                ));
            }
            PivotSelectorConfig::Random(c) if c.max_retries == Some(0) => {
                return Err(ConfigError::Invalid(
                    "pivot_selector.max_retries must be at least 1".to_string(),
                ));
            }
            _ => {}
        }
        if let Some(resolution) = &self.conflict_resolution {
            nonzero("conflict_resolution.max_iterations", resolution.max_iterations)?;
        }
        Ok(())
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be positive, got {value}")))
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be in (0, 1], got {value}")))
    }
}

fn relaxation_factor(value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value < 2.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "relaxation.relaxation_factor must be in (0, 2), got {value}"
        )))
    }
}

fn nonzero<T: Into<u64> + Copy>(field: &str, value: Option<T>) -> Result<(), ConfigError> {
    match value {
        Some(v) if v.into() == 0 => Err(ConfigError::Invalid(format!("{field} must be at least 1"))),
        _ => Ok(()),
    }
}

/// Relaxation variant configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelaxationConfig {
    /// Kaczmarz projection of every participating variable.
    Kaczmarz(KaczmarzConfig),

    /// Damped projection of one pivot variable per constraint.
    GaussSeidel(GaussSeidelConfig),

    /// Spring aggregation of soft constraints with hard re-enforcement.
    ForceDirected(ForceDirectedConfig),
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        RelaxationConfig::Kaczmarz(KaczmarzConfig::default())
    }
}

/// Kaczmarz configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct KaczmarzConfig {
    /// Maximum number of sweeps.
    pub max_iterations: Option<u64>,

    /// Projection scale λ.
    pub relaxation_factor: Option<f64>,

    /// Per-sweep decay applied to soft projections.
    pub cooling_factor: Option<f64>,
}

/// Gauss-Seidel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GaussSeidelConfig {
    /// Maximum number of sweeps.
    pub max_iterations: Option<u64>,

    /// Scale applied to the damped pivot update.
    pub relaxation_factor: Option<f64>,
}

/// Force-directed configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ForceDirectedConfig {
    /// Maximum number of force/projection rounds.
    pub max_iterations: Option<u64>,

    /// Per-round decay of the force magnitude.
    pub cooling_factor: Option<f64>,

    /// Kaczmarz sweeps over hard constraints after each force pass.
    pub hard_sweeps: Option<u64>,
}

/// Pivot selector configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PivotSelectorConfig {
    /// Fewest-unassigned-first selection with orphan duplication.
    #[default]
    Deterministic,

    /// Local then global influence with a spaced shuffle.
    TwoPhase(TwoPhaseConfig),

    /// Uniform random choice.
    Random(RandomPivotConfig),
}

/// Two-phase selector configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TwoPhaseConfig {
    /// Minimum distance between entries sharing a pivot variable.
    pub distance: Option<usize>,
}

/// Random selector configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RandomPivotConfig {
    /// Draws before falling back to the dominant summand.
    pub max_retries: Option<u32>,
}

/// Conflict resolution configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConflictResolutionConfig {
    /// Strategy used to pick suspended constraints.
    #[serde(default)]
    pub strategy: ConflictStrategyType,

    /// Sweep budget of each bounded relaxation sub-solve.
    pub max_iterations: Option<u64>,
}

/// Conflict resolution strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategyType {
    /// Enable constraints one at a time in priority order.
    Adding,

    /// Disable violated constraints from the low-priority end.
    Removing,

    /// Grow and halve an enabled window over the sorted list.
    #[default]
    BinarySearch,
}
