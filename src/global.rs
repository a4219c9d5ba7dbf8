//! solver-wide numeric constants. `Utils::config::SolverConfig::default()` is built from them.

/// geometric tolerance: two lengths closer than this are the same length
pub const LENGTH_EPS: f64 = 1e-6;
/// every residual must end up below this; much tighter than LENGTH_EPS
pub const CONVERGE_TOLERANCE: f64 = LENGTH_EPS / 1e2;
/// ceiling on the live equation count of one Jacobian
pub const MAX_UNKNOWNS: usize = 2048;
pub const MAX_NEWTON_ITERATIONS: usize = 50;
/// weight of a dragged parameter's column in the least squares step
pub const DRAGGED_COLUMN_SCALE: f64 = 1.0 / 20.0;
/// values beyond this magnitude (or NaN) mean the iteration has blown up
pub const UNREASONABLE_MAGNITUDE: f64 = 1e11;
/// an unknown is free when its unit direction stays at least this far (squared distance)
/// from the row space of the Jacobian
pub const FREE_COLUMN_TOLERANCE: f64 = 1e-12;
pub const DEFAULT_FIND_TO_FIX_TIMEOUT_MS: u64 = 5000;
/// first stage id handed out by the sequential elimination pass
pub const ELIMINATION_STAGE_START: u32 = 1000;
