//! # Solve orchestration
//!
//! ## Purpose
//! Entry points the document calls: `System::solve` finds values for every unknown of a group,
//! `System::solve_rank` only checks consistency and degrees of freedom.
//!
//! ## Phases of `solve`
//! 1. load the group's unknowns and equations from the `ConstraintLayer`
//! 2. substitution of `a - b = 0` pairs (skipped when a strict DOF check is asked for)
//! 3. singleton pass, then sequential elimination
//! 4. Jacobian of what is left, rank test, Newton, rank test again
//! 5. conflict search on rank failure, free-parameter marking otherwise
//! 6. eliminated and substituted unknowns are recovered, values written back
//!
//! Nothing is written back unless the result is `OKAY` or `REDUNDANT_OKAY`. Every exit records
//! a `SolveStatus` on the group.
//!
//! ## Interesting Code Features
//! - phase durations are collected in `System::timer` and logged as a table
//! - on non-convergence the reported constraints include the singleton equations that fixed
//!   unknowns of an unsatisfied row, so both halves of a contradiction show up
//! - an eliminated unknown whose recovered value is not real (`x^2 = -2`) turns the result
//!   into `DIDNT_CONVERGE` and reports the constraint of its defining equation

use crate::error::SolverError;
use crate::numerical::find_to_fix::Deadline;
use crate::numerical::solver_api::{
    ConstraintLayer, GroupPolicy, SolveReport, SolveResult, SolveStatus,
};
use crate::numerical::system::{EquationState, ParamState, Subset, System};
use crate::symbolic::symbolic_engine::{ConstraintHandle, EquationHandle, GroupHandle};
use log::{debug, info, warn};

impl System {
    /// Solves group `g` in place.
    ///
    /// # Arguments
    /// * `find_bad` - on redundancy, search for constraints whose removal fixes it
    /// * `find_free` - mark which unknowns are free to move
    /// * `force_dof_check` - do not let substitution hide redundant constraints
    pub fn solve<L: ConstraintLayer>(
        &mut self,
        layer: &mut L,
        g: GroupHandle,
        find_bad: bool,
        find_free: bool,
        force_dof_check: bool,
    ) -> Result<SolveReport, SolverError> {
        self.timer.start();
        let policy = self.load_group(layer, g, None)?;
        let report = self.solve_loaded(layer, g, &policy, find_bad, find_free, force_dof_check)?;
        layer.record_status(g, SolveStatus::from(&report));
        let (live_params, live_eqs) = self.count_live();
        info!(
            "group {:?} solved: {}, dof {}, {} unknowns ({} in the Newton system), {} equations ({} live)",
            g,
            report.result,
            report.dof,
            self.param.len(),
            live_params,
            self.eq.len(),
            live_eqs
        );
        if !report.bad.is_empty() {
            warn!("constraints implicated: {:?}", report.bad);
        }
        self.timer.log_table();
        Ok(report)
    }

    fn solve_loaded<L: ConstraintLayer>(
        &mut self,
        layer: &mut L,
        g: GroupHandle,
        policy: &GroupPolicy,
        find_bad: bool,
        find_free: bool,
        force_dof_check: bool,
    ) -> Result<SolveReport, SolverError> {
        self.clear_tags();

        self.timer.substitution_tic();
        if policy.suppress_dof_calculation || policy.allow_redundant || !force_dof_check {
            self.solve_by_substitution();
        }
        self.timer.substitution_tac();

        self.timer.singleton_tic();
        let alone_ok = self.solve_singletons();
        self.timer.singleton_tac();
        if !alone_ok {
            return Ok(self.didnt_converge(layer, true));
        }

        self.timer.elimination_tic();
        self.eliminate_sequentially();
        self.timer.elimination_tac();

        if !self.write_jacobian(Subset::Live) {
            return Ok(SolveReport::new(SolveResult::TOO_MANY_UNKNOWNS));
        }
        self.rank = None;
        self.dof = -1;
        let rank_ok = if !policy.suppress_dof_calculation && !policy.allow_redundant {
            self.test_rank()
        } else {
            true
        };

        self.timer.newton_tic();
        let converged = self.newton_solve();
        self.timer.newton_tac();
        if !converged {
            return Ok(self.didnt_converge(layer, rank_ok));
        }

        self.timer.finish_tic();
        let rank_ok = if !policy.suppress_dof_calculation {
            self.test_rank()
        } else {
            true
        };
        let mut report = SolveReport::new(if rank_ok {
            SolveResult::OKAY
        } else {
            SolveResult::REDUNDANT_OKAY
        });
        report.dof = self.dof;
        report.rank = self.rank;
        if !rank_ok {
            if find_bad {
                let deadline = Deadline::from_millis(policy.find_to_fix_timeout_ms);
                let search = self.find_which_to_remove(layer, g, force_dof_check, deadline)?;
                report.bad = search.bad;
                report.find_to_fix_timed_out = search.timed_out;
            }
        } else {
            self.mark_params_free(find_free);
        }

        self.copy_substituted_values();
        if let Err(defining) = self.replay_eliminations() {
            report.result = if rank_ok {
                SolveResult::DIDNT_CONVERGE
            } else {
                SolveResult::REDUNDANT_DIDNT_CONVERGE
            };
            push_constraint(layer, &mut report.bad, defining);
            self.timer.finish_tac();
            return Ok(report);
        }
        self.copy_substituted_values();
        for p in self.param.iter() {
            layer.write_back(p.h, p.val, p.free);
        }
        self.timer.finish_tac();
        Ok(report)
    }

    /// Consistency and DOF check without moving anything. Substitution is not run, so every
    /// constraint shows up in the rank.
    pub fn solve_rank<L: ConstraintLayer>(
        &mut self,
        layer: &mut L,
        g: GroupHandle,
        find_bad: bool,
        find_free: bool,
    ) -> Result<SolveReport, SolverError> {
        self.timer.start();
        let policy = self.load_group(layer, g, None)?;
        self.clear_tags();
        if !self.write_jacobian(Subset::Live) {
            let report = SolveReport::new(SolveResult::TOO_MANY_UNKNOWNS);
            layer.record_status(g, SolveStatus::from(&report));
            return Ok(report);
        }
        let rank_ok = self.test_rank();
        let mut report = SolveReport::new(if rank_ok {
            SolveResult::OKAY
        } else {
            SolveResult::REDUNDANT_OKAY
        });
        report.dof = self.dof;
        report.rank = self.rank;
        if !rank_ok {
            if !policy.suppress_dof_calculation && !policy.allow_redundant && find_bad {
                let deadline = Deadline::from_millis(policy.find_to_fix_timeout_ms);
                let search = self.find_which_to_remove(layer, g, true, deadline)?;
                report.bad = search.bad;
                report.find_to_fix_timed_out = search.timed_out;
            }
        } else {
            self.mark_params_free(find_free);
        }
        for p in self.param.iter() {
            layer.write_back(p.h, p.val, p.free);
        }
        layer.record_status(g, SolveStatus::from(&report));
        info!(
            "group {:?} rank check: {}, rank {:?}, dof {}",
            g, report.result, report.rank, report.dof
        );
        Ok(report)
    }

    /// Report for a failed Newton solve, built from the rows of `mat` still unsatisfied.
    fn didnt_converge<L: ConstraintLayer>(&self, layer: &L, rank_ok: bool) -> SolveReport {
        let mut report = SolveReport::new(if rank_ok {
            SolveResult::DIDNT_CONVERGE
        } else {
            SolveResult::REDUNDANT_DIDNT_CONVERGE
        });
        report.dof = self.dof;
        report.rank = self.rank;
        let tol = self.config.converge_tolerance;
        let mut used = Vec::new();
        for (i, &ei) in self.mat.eq.iter().enumerate() {
            let satisfied = self
                .mat
                .B_num
                .get(i)
                .is_some_and(|&b| b.abs() <= tol && !self.config.is_unreasonable(b));
            if satisfied {
                continue;
            }
            let eq = &self.eq[ei];
            push_constraint(layer, &mut report.bad, eq.h);
            used.clear();
            eq.e.params_used(&mut used);
            for h in used.iter() {
                let Some(p) = self.param_by_handle(*h) else {
                    continue;
                };
                if p.state != ParamState::SolvedAlone {
                    continue;
                }
                let fixing = self.eq.iter().filter(|e| {
                    e.state == EquationState::SolvedAlone && e.stage == p.stage
                });
                for e in fixing {
                    push_constraint(layer, &mut report.bad, e.h);
                }
            }
        }
        debug!(
            "did not converge, {} constraints implicated by {} rows",
            report.bad.len(),
            self.mat.m
        );
        report
    }
}

fn push_constraint<L: ConstraintLayer>(
    layer: &L,
    bad: &mut Vec<ConstraintHandle>,
    h: EquationHandle,
) {
    let Some(c) = h.constraint() else {
        return;
    };
    if layer.constraint_exists(c) && !bad.contains(&c) {
        bad.push(c);
    }
}
