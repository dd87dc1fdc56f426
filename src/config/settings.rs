//! TOML-based configuration for the join-path solver.
//!
//! Example configuration:
//! ```toml
//! [solver]
//! exact = false
//! path_slack = 2
//! steiner_result_limit = 10
//! max_steiner_candidates = 12
//! max_terminals = 12
//! visible_relationships_only = false
//!
//! [costs]
//! default_edge_cost = 1
//! cross_schema_cost = 1
//!
//! [[costs.rules]]
//! object = "relationship"
//! attribute = "name"
//! pattern = "audit_*"
//! cost = 10
//!
//! [visualization]
//! enabled = false
//! step_delay_ms = 50
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest accepted `max_steiner_candidates`; every refinement pass runs
/// `2^n - 1` Steiner tree computations.
pub const STEINER_CANDIDATE_HARD_CAP: usize = 20;

/// Largest accepted `max_terminals`; the Steiner tree tables grow with
/// `2^k` for `k` terminals.
pub const TERMINAL_HARD_CAP: usize = 16;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Search bounds.
    pub solver: SolverSettings,

    /// Edge weight policy.
    pub costs: CostSettings,

    /// Real-time visualization side channel.
    pub visualization: VisualizationSettings,
}

/// Search bounds for the solver.
///
/// `exact` governs the Steiner search (no result limit, no baseline cutoff).
/// `exact_paths` governs path expansion (zero slack) and defaults to `exact`,
/// so an exact Steiner search with bounded path expansion is expressed as
/// `exact = true, exact_paths = false`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Exhaustive Steiner search.
    pub exact: bool,

    /// Zero-slack path expansion. Falls back to `exact` when unset.
    pub exact_paths: Option<bool>,

    /// Allowed cost overrun above the minimum when enumerating paths.
    pub path_slack: u32,

    /// Stop the Steiner search after this many candidate trees (non-exact only).
    pub steiner_result_limit: usize,

    /// Cap on the Steiner points taking part in subset enumeration.
    pub max_steiner_candidates: usize,

    /// Most connected required tables a Steiner search accepts.
    pub max_terminals: usize,

    /// Ignore relationships hidden in the model view.
    pub visible_relationships_only: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            exact: false,
            exact_paths: None,
            path_slack: 1,
            steiner_result_limit: 10,
            max_steiner_candidates: 12,
            max_terminals: 12,
            visible_relationships_only: false,
        }
    }
}

impl SolverSettings {
    /// Settings with both exactness knobs switched on.
    pub fn exact() -> Self {
        Self {
            exact: true,
            ..Self::default()
        }
    }

    /// Whether path expansion runs with zero slack.
    pub fn exact_paths(&self) -> bool {
        self.exact_paths.unwrap_or(self.exact)
    }

    /// Candidate cap in force, never above [`STEINER_CANDIDATE_HARD_CAP`].
    pub fn candidate_cap(&self) -> usize {
        self.max_steiner_candidates.min(STEINER_CANDIDATE_HARD_CAP)
    }

    /// Terminal cap in force, never above [`TERMINAL_HARD_CAP`].
    pub fn terminal_cap(&self) -> usize {
        self.max_terminals.min(TERMINAL_HARD_CAP)
    }

    /// Slack actually applied to each super-edge budget.
    pub fn effective_slack(&self) -> u32 {
        if self.exact_paths() {
            0
        } else {
            self.path_slack
        }
    }
}

/// Edge weight policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CostSettings {
    /// Base cost of every join.
    pub default_edge_cost: u32,

    /// Surcharge for joins crossing schemas.
    pub cross_schema_cost: u32,

    /// User-defined surcharges.
    pub rules: Vec<CostRule>,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            default_edge_cost: 1,
            cross_schema_cost: 1,
            rules: Vec::new(),
        }
    }
}

/// Object a cost rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostObject {
    Relationship,
    Constraint,
    Table,
    Schema,
}

/// Attribute of the object a cost rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostAttribute {
    Name,
    Comment,
}

/// A wildcard-matched surcharge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CostRule {
    pub object: CostObject,
    pub attribute: CostAttribute,
    /// Glob pattern (`*`, `?`), matched case-insensitively against the whole value.
    pub pattern: String,
    pub cost: u32,
}

impl CostRule {
    pub fn new(
        object: CostObject,
        attribute: CostAttribute,
        pattern: impl Into<String>,
        cost: u32,
    ) -> Self {
        Self {
            object,
            attribute,
            pattern: pattern.into(),
            cost,
        }
    }
}

/// Visualization side channel settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VisualizationSettings {
    /// Emit touched-table events.
    pub enabled: bool,

    /// Pause after each touched-table event, in milliseconds.
    pub step_delay_ms: u64,
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            step_delay_ms: 50,
        }
    }
}

impl VisualizationSettings {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `JOINPATH_CONFIG`
    /// 2. `./joinpath.toml`
    /// 3. `~/.config/joinpath/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("JOINPATH_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("joinpath.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("joinpath").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values that would make the search unbounded or meaningless.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.solver.max_steiner_candidates > STEINER_CANDIDATE_HARD_CAP {
            return Err(SettingsError::InvalidConfig(format!(
                "max_steiner_candidates must be at most {}, got {}",
                STEINER_CANDIDATE_HARD_CAP, self.solver.max_steiner_candidates
            )));
        }

        if self.solver.max_terminals < 2 || self.solver.max_terminals > TERMINAL_HARD_CAP {
            return Err(SettingsError::InvalidConfig(format!(
                "max_terminals must be between 2 and {}, got {}",
                TERMINAL_HARD_CAP, self.solver.max_terminals
            )));
        }

        if !self.solver.exact && self.solver.steiner_result_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "steiner_result_limit must be positive unless exact mode is on".to_string(),
            ));
        }

        if let Some(rule) = self.costs.rules.iter().find(|r| r.pattern.is_empty()) {
            return Err(SettingsError::InvalidConfig(format!(
                "cost rule on {:?}.{:?} has an empty pattern",
                rule.object, rule.attribute
            )));
        }

        Ok(())
    }
}
