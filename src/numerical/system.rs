//! Parameter and equation store for one solve call.
//!
//! Parameters live in an arena (`System::param`) addressed by position; `index` maps handles
//! to positions and is also what `Expr::rewrite_params_as_slots` uses. Parameters of other
//! groups are not unknowns: their values are captured once per load in `foreign`.
//!
//! Which phase an unknown or an equation belongs to is kept in an explicit state enum plus a
//! numeric stage, never in one overloaded integer.

use crate::error::SolverError;
use crate::numerical::solver_api::{ConstraintLayer, GroupPolicy};
use crate::symbolic::symbolic_engine::{
    ConstraintHandle, EquationHandle, Expr, GroupHandle, ParamHandle,
};
use crate::symbolic::symbolic_engine_derivatives::ParamLookup;
use crate::Utils::config::SolverConfig;
use crate::Utils::timer::PhaseTimer;
use log::{debug, warn};
use nalgebra::DVector;
use sprs::CsMat;
use std::collections::{BTreeMap, HashMap, VecDeque};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ParamState {
    /// unknown of the main system
    Live,
    /// proven equal to another parameter, takes its value from `substd`
    Substituted,
    /// fixed by an equation that references it alone
    SolvedAlone,
    /// recovered afterwards from its only equation
    Eliminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EquationState {
    Live,
    /// `a - b = 0` consumed by substitution
    Satisfied,
    SolvedAlone,
    Eliminated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub h: ParamHandle,
    pub val: f64,
    pub known: bool,
    /// under-constrained: moving it alone does not change the rank
    pub free: bool,
    /// root of the substitution chain this parameter was collapsed into
    pub substd: Option<ParamHandle>,
    pub state: ParamState,
    pub stage: u32,
}

impl Param {
    pub fn new(h: ParamHandle, val: f64) -> Param {
        Param {
            h,
            val,
            known: false,
            free: false,
            substd: None,
            state: ParamState::Live,
            stage: 0,
        }
    }
}

/// `e = 0`
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub h: EquationHandle,
    pub e: Expr,
    pub state: EquationState,
    pub stage: u32,
}

impl Equation {
    pub fn new(h: EquationHandle, e: Expr) -> Equation {
        Equation {
            h,
            e,
            state: EquationState::Live,
            stage: 0,
        }
    }
}

/// Rows/columns selected for one Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    /// everything still live
    Live,
    /// one singleton stage
    Alone(u32),
}

/// Snapshot of the system being iterated: symbolic and numeric Jacobian, residuals, step.
/// Rebuilt by every `write_jacobian`.
#[derive(Debug, Clone)]
pub struct SparseSystem {
    /// arena positions of the columns
    pub param: Vec<usize>,
    /// positions in `System::eq` of the rows
    pub eq: Vec<usize>,
    pub m: usize,
    pub n: usize,
    /// (row, col, partial derivative), nonzero entries only
    pub A_sym: Vec<(usize, usize, Expr)>,
    pub A_num: CsMat<f64>,
    pub B_sym: Vec<Expr>,
    pub B_num: DVector<f64>,
    pub X: DVector<f64>,
    pub scale: DVector<f64>,
}

impl Default for SparseSystem {
    fn default() -> Self {
        SparseSystem {
            param: Vec::new(),
            eq: Vec::new(),
            m: 0,
            n: 0,
            A_sym: Vec::new(),
            A_num: CsMat::zero((0, 0)),
            B_sym: Vec::new(),
            B_num: DVector::zeros(0),
            X: DVector::zeros(0),
            scale: DVector::zeros(0),
        }
    }
}

/// Unknowns eliminated in one round, each with the position of its defining equation.
pub type EliminationRound = BTreeMap<ParamHandle, usize>;

pub struct System {
    pub config: SolverConfig,
    pub param: Vec<Param>,
    pub index: HashMap<ParamHandle, usize>,
    pub eq: Vec<Equation>,
    pub dragged: Vec<ParamHandle>,
    /// values of parameters owned by other groups
    pub foreign: HashMap<ParamHandle, f64>,
    pub mat: SparseSystem,
    /// innermost round first
    pub elimination: VecDeque<EliminationRound>,
    pub rank: Option<usize>,
    pub dof: i32,
    pub timer: PhaseTimer,
}

impl System {
    pub fn new(config: SolverConfig) -> System {
        System {
            config,
            param: Vec::new(),
            index: HashMap::new(),
            eq: Vec::new(),
            dragged: Vec::new(),
            foreign: HashMap::new(),
            mat: SparseSystem::default(),
            elimination: VecDeque::new(),
            rank: None,
            dof: -1,
            timer: PhaseTimer::new(),
        }
    }

    pub fn clear(&mut self) {
        self.param.clear();
        self.index.clear();
        self.eq.clear();
        self.dragged.clear();
        self.foreign.clear();
        self.mat = SparseSystem::default();
        self.elimination.clear();
        self.rank = None;
        self.dof = -1;
    }

    pub fn add_param(&mut self, h: ParamHandle, val: f64) {
        self.index.insert(h, self.param.len());
        self.param.push(Param::new(h, val));
    }

    pub fn add_equation(&mut self, h: EquationHandle, e: Expr) {
        self.eq.push(Equation::new(h, e));
    }

    pub fn set_foreign(&mut self, h: ParamHandle, val: f64) {
        self.foreign.insert(h, val);
    }

    /// Fresh load of group `g`: its unknowns, the dragged set and every equation except those
    /// of `except`. Parameters referenced by the equations but owned elsewhere are captured
    /// as constants.
    pub fn load_group<L: ConstraintLayer>(
        &mut self,
        layer: &mut L,
        g: GroupHandle,
        except: Option<ConstraintHandle>,
    ) -> Result<GroupPolicy, SolverError> {
        let policy = layer.group_policy(g)?;
        self.clear();
        for (h, val) in layer.group_params(g) {
            self.add_param(h, val);
        }
        self.dragged = layer.dragged();
        layer.write_equations_except_for(g, except, &mut self.eq);
        self.capture_foreign(layer);
        debug!(
            "loaded group {:?}: {} unknowns, {} equations, {} foreign parameters",
            g,
            self.param.len(),
            self.eq.len(),
            self.foreign.len()
        );
        Ok(policy)
    }

    fn capture_foreign<L: ConstraintLayer>(&mut self, layer: &L) {
        let mut used = Vec::new();
        for eq in self.eq.iter() {
            eq.e.params_used(&mut used);
        }
        for h in used {
            if self.index.contains_key(&h) {
                continue;
            }
            match layer.param_value(h) {
                Some(val) => {
                    self.foreign.insert(h, val);
                }
                None => warn!("equation references unknown parameter {:?}", h),
            }
        }
    }

    /// every unknown and equation back to `Live`, stage 0, no substitution
    pub fn clear_tags(&mut self) {
        for p in self.param.iter_mut() {
            p.state = ParamState::Live;
            p.stage = 0;
            p.substd = None;
        }
        for e in self.eq.iter_mut() {
            e.state = EquationState::Live;
            e.stage = 0;
        }
        self.elimination.clear();
    }

    pub fn is_dragged(&self, h: ParamHandle) -> bool {
        self.dragged.contains(&h)
    }

    pub fn param_by_handle(&self, h: ParamHandle) -> Option<&Param> {
        self.index.get(&h).map(|&i| &self.param[i])
    }

    pub fn is_solver_param(&self, h: ParamHandle) -> bool {
        self.index.contains_key(&h)
    }

    pub fn param_in_subset(&self, p: &Param, subset: Subset) -> bool {
        match subset {
            Subset::Live => p.state == ParamState::Live,
            Subset::Alone(stage) => p.state == ParamState::SolvedAlone && p.stage == stage,
        }
    }

    pub fn eq_in_subset(&self, e: &Equation, subset: Subset) -> bool {
        match subset {
            Subset::Live => e.state == EquationState::Live,
            Subset::Alone(stage) => e.state == EquationState::SolvedAlone && e.stage == stage,
        }
    }

    /// (columns, rows) of a subset, both in table order
    pub fn select(&self, subset: Subset) -> (Vec<usize>, Vec<usize>) {
        let params = self
            .param
            .iter()
            .enumerate()
            .filter(|(_, p)| self.param_in_subset(p, subset))
            .map(|(i, _)| i)
            .collect();
        let eqs = self
            .eq
            .iter()
            .enumerate()
            .filter(|(_, e)| self.eq_in_subset(e, subset))
            .map(|(i, _)| i)
            .collect();
        (params, eqs)
    }

    pub fn count_live(&self) -> (usize, usize) {
        (
            self.param
                .iter()
                .filter(|p| p.state == ParamState::Live)
                .count(),
            self.eq
                .iter()
                .filter(|e| e.state == EquationState::Live)
                .count(),
        )
    }
}

impl ParamLookup for System {
    fn param_value(&self, h: ParamHandle) -> f64 {
        match self.index.get(&h) {
            Some(&i) => self.param[i].val,
            None => self.foreign.get(&h).copied().unwrap_or(f64::NAN),
        }
    }
    fn slot_value(&self, slot: usize, _h: ParamHandle) -> f64 {
        self.param[slot].val
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::EquationOrigin;

    fn eq_handle(c: u32) -> EquationHandle {
        EquationHandle::new(EquationOrigin::Constraint(ConstraintHandle(c)), 0)
    }

    #[test]
    fn test_lookup_prefers_own_params() {
        let mut sys = System::new(SolverConfig::default());
        sys.add_param(ParamHandle(1), 2.0);
        sys.set_foreign(ParamHandle(9), 5.0);
        let e = Expr::Param(ParamHandle(1)) * Expr::Param(ParamHandle(9));
        assert_eq!(e.eval(&sys), 10.0);
        let slotted = e.rewrite_params_as_slots(&sys.index);
        assert_eq!(slotted.eval(&sys), 10.0);
        assert!(Expr::Param(ParamHandle(3)).eval(&sys).is_nan());
    }

    #[test]
    fn test_select_is_table_ordered_and_pure() {
        let mut sys = System::new(SolverConfig::default());
        for i in 0..4 {
            sys.add_param(ParamHandle(10 - i), i as f64);
            sys.add_equation(eq_handle(i), Expr::Param(ParamHandle(10 - i)));
        }
        sys.param[1].state = ParamState::Substituted;
        sys.eq[2].state = EquationState::SolvedAlone;
        sys.eq[2].stage = 3;
        let before = sys.param.clone();
        let (cols, rows) = sys.select(Subset::Live);
        assert_eq!(cols, vec![0, 2, 3]);
        assert_eq!(rows, vec![0, 1, 3]);
        assert_eq!(sys.select(Subset::Live), (cols, rows));
        assert_eq!(sys.select(Subset::Alone(3)).1, vec![2]);
        assert_eq!(sys.param, before);
    }

    #[test]
    fn test_clear_tags() {
        let mut sys = System::new(SolverConfig::default());
        sys.add_param(ParamHandle(1), 0.0);
        sys.add_param(ParamHandle(2), 0.0);
        sys.param[0].state = ParamState::Substituted;
        sys.param[0].substd = Some(ParamHandle(2));
        sys.add_equation(eq_handle(0), Expr::Param(ParamHandle(1)));
        sys.eq[0].state = EquationState::Satisfied;
        sys.clear_tags();
        assert_eq!(sys.count_live(), (2, 1));
        assert_eq!(sys.param[0].substd, None);
    }
}
