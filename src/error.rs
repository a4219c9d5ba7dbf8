use crate::symbolic::symbolic_engine::GroupHandle;
use thiserror::Error;

/// Infrastructure failures. Non-convergence and redundancy are not errors, they are
/// reported through `numerical::solver_api::SolveResult`.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse solver configuration: {0}")]
    ConfigToml(#[from] toml::de::Error),
    #[error("loglevel must be debug, info, warn or error, got {0}")]
    LogLevel(String),
    #[error("least squares step failed: {0}")]
    LeastSquares(String),
    #[error("group {0:?} does not exist")]
    UnknownGroup(GroupHandle),
}
