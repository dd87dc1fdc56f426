//! Configuration module for the join-path solver.
//!
//! Handles solver bounds, edge cost rules and visualization settings.

mod settings;

pub use settings::{
    CostAttribute, CostObject, CostRule, CostSettings, Settings, SettingsError, SolverSettings,
    VisualizationSettings, STEINER_CANDIDATE_HARD_CAP, TERMINAL_HARD_CAP,
};
