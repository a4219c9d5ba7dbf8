//! Search for constraints whose removal would make the group's Jacobian full row rank.
//!
//! Each candidate is tried on a scratch system loaded without it, at the main system's current
//! values. Point-coincident constraints are tried last. The search stops between trials once
//! the group's time budget is used up and reports that it did.

use crate::error::SolverError;
use crate::numerical::solver_api::ConstraintLayer;
use crate::numerical::system::{Subset, System};
use crate::symbolic::symbolic_engine::{ConstraintHandle, GroupHandle};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Cooperative time limit, checked once per trial.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Deadline {
        Deadline {
            start: Instant::now(),
            budget,
        }
    }

    pub fn from_millis(ms: u64) -> Deadline {
        Deadline::new(Duration::from_millis(ms))
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() > self.budget
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixSearch {
    /// removing any one of these restores full rank
    pub bad: Vec<ConstraintHandle>,
    /// the deadline hit before every constraint was tried
    pub timed_out: bool,
}

impl System {
    /// # Arguments
    /// * `force_dof_check` - skip substitution in the trials, so that constraints absorbed by
    ///   substitution are tested too
    /// * `deadline` - checked before each trial
    pub fn find_which_to_remove<L: ConstraintLayer>(
        &self,
        layer: &mut L,
        g: GroupHandle,
        force_dof_check: bool,
        deadline: Deadline,
    ) -> Result<FixSearch, SolverError> {
        let constraints = layer.group_constraints(g);
        let mut search = FixSearch::default();
        let mut trial = System::new(self.config.clone());
        'passes: for coincident_pass in [false, true] {
            for &(c, coincident) in constraints.iter() {
                if deadline.expired() {
                    search.timed_out = true;
                    break 'passes;
                }
                if coincident != coincident_pass {
                    continue;
                }
                if self.rank_ok_without(&mut trial, layer, g, c, force_dof_check)? {
                    debug!("removing {:?} restores full rank", c);
                    search.bad.push(c);
                }
            }
        }
        if search.timed_out {
            warn!(
                "search for constraints to remove timed out, {} found so far",
                search.bad.len()
            );
        } else {
            info!("{} constraints could be removed to fix the group", search.bad.len());
        }
        Ok(search)
    }

    fn rank_ok_without<L: ConstraintLayer>(
        &self,
        trial: &mut System,
        layer: &mut L,
        g: GroupHandle,
        c: ConstraintHandle,
        force_dof_check: bool,
    ) -> Result<bool, SolverError> {
        trial.load_group(layer, g, Some(c))?;
        for p in trial.param.iter_mut() {
            if let Some(current) = self.param_by_handle(p.h) {
                p.val = current.val;
            }
        }
        trial.clear_tags();
        if !force_dof_check {
            trial.solve_by_substitution();
        }
        if !trial.write_jacobian(Subset::Live) {
            return Ok(false);
        }
        trial.eval_jacobian();
        Ok(trial.calculate_rank() == trial.mat.m)
    }
}
