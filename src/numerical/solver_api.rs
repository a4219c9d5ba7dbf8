//! Types shared between the solver and the layer that owns parameters and constraints:
//! result taxonomy, per-group policy, the status record kept on a group, and the
//! `ConstraintLayer` trait through which the solver pulls equations and pushes values back.

use crate::error::SolverError;
use crate::numerical::system::Equation;
use crate::symbolic::symbolic_engine::{ConstraintHandle, GroupHandle, ParamHandle};
use strum_macros::{Display, EnumIter};

/// Outcome of `System::solve` and `System::solve_rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum SolveResult {
    /// consistent, exactly determined or intentionally under-determined
    OKAY,
    /// Newton failed or a value went non-finite
    DIDNT_CONVERGE,
    /// converged, but the rank test shows redundant constraints
    REDUNDANT_OKAY,
    REDUNDANT_DIDNT_CONVERGE,
    /// too many live equations, nothing numeric was attempted
    TOO_MANY_UNKNOWNS,
}

impl SolveResult {
    pub fn is_okay(&self) -> bool {
        matches!(self, SolveResult::OKAY | SolveResult::REDUNDANT_OKAY)
    }
    pub fn didnt_converge(&self) -> bool {
        matches!(
            self,
            SolveResult::DIDNT_CONVERGE | SolveResult::REDUNDANT_DIDNT_CONVERGE
        )
    }
}

/// What a solve call hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub result: SolveResult,
    /// live unknowns minus Jacobian rank; -1 when the rank was never computed
    pub dof: i32,
    pub rank: Option<usize>,
    /// constraints implicated in a failure; empty on OKAY
    pub bad: Vec<ConstraintHandle>,
    /// the search for constraints to remove ran out of time, `bad` is partial
    pub find_to_fix_timed_out: bool,
}

impl SolveReport {
    pub fn new(result: SolveResult) -> SolveReport {
        SolveReport {
            result,
            dof: -1,
            rank: None,
            bad: Vec::new(),
            find_to_fix_timed_out: false,
        }
    }
}

/// Per-group switches read by the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPolicy {
    pub suppress_dof_calculation: bool,
    pub allow_redundant: bool,
    /// keep only point-coincident constraints (plus entity and group equations)
    pub relax_constraints: bool,
    /// every labelled constraint is a reference dimension
    pub all_dims_reference: bool,
    pub find_to_fix_timeout_ms: u64,
}

impl Default for GroupPolicy {
    fn default() -> Self {
        GroupPolicy {
            suppress_dof_calculation: false,
            allow_redundant: false,
            relax_constraints: false,
            all_dims_reference: false,
            find_to_fix_timeout_ms: crate::global::DEFAULT_FIND_TO_FIX_TIMEOUT_MS,
        }
    }
}

/// Last solve outcome, kept on the group for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveStatus {
    pub how: SolveResult,
    pub dof: i32,
    pub bad: Vec<ConstraintHandle>,
    /// the conflict search stopped on its deadline
    pub timeout: bool,
}

impl Default for SolveStatus {
    fn default() -> Self {
        SolveStatus {
            how: SolveResult::OKAY,
            dof: 0,
            bad: Vec::new(),
            timeout: false,
        }
    }
}

impl From<&SolveReport> for SolveStatus {
    fn from(report: &SolveReport) -> Self {
        SolveStatus {
            how: report.result,
            dof: report.dof,
            bad: report.bad.clone(),
            timeout: report.find_to_fix_timed_out,
        }
    }
}

/// The document side of a solve: owns parameters, entities, constraints and groups.
pub trait ConstraintLayer {
    fn group_policy(&self, g: GroupHandle) -> Result<GroupPolicy, SolverError>;

    /// Appends the equations of group `g` to `out`, leaving out those of constraint `except`.
    /// Reference dimensions write no equations and are updated to their measured value,
    /// a relaxed group writes only its point-coincident constraints. Entity and group
    /// equations are always written.
    fn write_equations_except_for(
        &mut self,
        g: GroupHandle,
        except: Option<ConstraintHandle>,
        out: &mut Vec<Equation>,
    );

    /// constraints of the group, in table order, with a flag marking point-coincident ones
    fn group_constraints(&self, g: GroupHandle) -> Vec<(ConstraintHandle, bool)>;

    fn constraint_exists(&self, c: ConstraintHandle) -> bool;

    /// (handle, current value) of every unknown owned by the group
    fn group_params(&self, g: GroupHandle) -> Vec<(ParamHandle, f64)>;

    /// value of any parameter, including those of other groups
    fn param_value(&self, h: ParamHandle) -> Option<f64>;

    /// parameters the user is dragging right now
    fn dragged(&self) -> Vec<ParamHandle>;

    fn write_back(&mut self, h: ParamHandle, val: f64, free: bool);

    fn record_status(&mut self, g: GroupHandle, status: SolveStatus);
}
