use crate::error::SolverError;
use crate::Utils::logger::init_logger;
use crate::global::{
    CONVERGE_TOLERANCE, DEFAULT_FIND_TO_FIX_TIMEOUT_MS, DRAGGED_COLUMN_SCALE,
    MAX_NEWTON_ITERATIONS, MAX_UNKNOWNS, UNREASONABLE_MAGNITUDE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Solver settings. Every field may be omitted in the TOML source, missing ones take the
/// values of `crate::global`.
/// ```
/// use RustedGCS::Utils::config::SolverConfig;
/// let config = SolverConfig::from_toml_str("max_unknowns = 100\nloglevel = \"warn\"").unwrap();
/// assert_eq!(config.max_unknowns, 100);
/// assert_eq!(config.max_newton_iterations, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_unknowns: usize,
    pub converge_tolerance: f64,
    pub max_newton_iterations: usize,
    pub dragged_column_scale: f64,
    pub unreasonable_magnitude: f64,
    /// debug, info, warn, error or off; read by `SolverConfig::init_logger`
    pub loglevel: Option<String>,
    pub default_find_to_fix_timeout_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_unknowns: MAX_UNKNOWNS,
            converge_tolerance: CONVERGE_TOLERANCE,
            max_newton_iterations: MAX_NEWTON_ITERATIONS,
            dragged_column_scale: DRAGGED_COLUMN_SCALE,
            unreasonable_magnitude: UNREASONABLE_MAGNITUDE,
            loglevel: Some("info".to_string()),
            default_find_to_fix_timeout_ms: DEFAULT_FIND_TO_FIX_TIMEOUT_MS,
        }
    }
}

impl SolverConfig {
    pub fn from_toml_str(source: &str) -> Result<SolverConfig, SolverError> {
        let config: SolverConfig = toml::from_str(source)?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SolverConfig, SolverError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Starts the global logger at `loglevel`.
    pub fn init_logger(&self, to_file: bool) -> Result<(), SolverError> {
        init_logger(self.loglevel.as_deref(), to_file)
    }

    /// x is NaN or has blown past `unreasonable_magnitude`
    pub fn is_unreasonable(&self, x: f64) -> bool {
        x.is_nan() || x.abs() > self.unreasonable_magnitude
    }
}
