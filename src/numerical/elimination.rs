//! Cheap passes run before the big Newton solve.
//!
//! * the singleton pass solves every equation that references exactly one live unknown, either
//!   in closed form or with a one-by-one Newton solve;
//! * sequential elimination removes unknowns that appear in a single remaining equation. Their
//!   values are recovered after the Newton solve by isolating them from that equation.
//!
//! Sequential elimination works on a bipartite graph of live unknowns and live equations. An
//! equation claimed in round `r` is retired for every later round but still counts as backing
//! its other unknowns within round `r`.

use crate::global::ELIMINATION_STAGE_START;
use crate::numerical::isolate::{can_isolate, isolate};
use crate::numerical::system::{EliminationRound, EquationState, ParamState, Subset, System};
use crate::symbolic::symbolic_engine::{EquationHandle, ParamHandle};
use crate::symbolic::symbolic_engine_derivatives::ReferencedParams;
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};

/// Edges between live unknowns and live equations, by arena position.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    /// equations referencing each unknown
    pub eqs_of: HashMap<usize, Vec<usize>>,
    /// unknowns referenced by each equation
    pub params_of: HashMap<usize, Vec<usize>>,
}

impl ReferenceGraph {
    pub fn build(sys: &System) -> ReferenceGraph {
        let mut graph = ReferenceGraph::default();
        let mut used = Vec::new();
        for (ei, eq) in sys.eq.iter().enumerate() {
            if eq.state != EquationState::Live {
                continue;
            }
            used.clear();
            eq.e.params_used(&mut used);
            for h in used.iter() {
                let Some(&pi) = sys.index.get(h) else {
                    continue;
                };
                if sys.param[pi].state != ParamState::Live {
                    continue;
                }
                graph.eqs_of.entry(pi).or_default().push(ei);
                graph.params_of.entry(ei).or_default().push(pi);
            }
        }
        graph
    }

    /// equations of `pi` not retired before `round`
    fn open_equations<'a>(
        &'a self,
        sys: &'a System,
        pi: usize,
        round: u32,
    ) -> impl Iterator<Item = usize> + 'a {
        self.eqs_of
            .get(&pi)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&ei| !is_retired(sys, ei, round))
    }
}

fn is_retired(sys: &System, ei: usize, round: u32) -> bool {
    let eq = &sys.eq[ei];
    eq.state != EquationState::Live && eq.stage < round
}

impl System {
    /// Solves every live equation that references exactly one live unknown.
    ///
    /// # Returns
    /// false as soon as one of the small Newton solves fails or an isolated value is not a
    /// real number; `mat` then still holds that one-by-one system
    pub fn solve_singletons(&mut self) -> bool {
        let mut stage = 1;
        for ei in 0..self.eq.len() {
            if self.eq[ei].state != EquationState::Live {
                continue;
            }
            let referenced = self.eq[ei]
                .e
                .referenced_params(&|h: ParamHandle| self.is_solver_param(h));
            let ReferencedParams::Exactly(h) = referenced else {
                continue;
            };
            let pi = self.index[&h];
            if self.param[pi].state != ParamState::Live {
                continue;
            }
            self.eq[ei].state = EquationState::SolvedAlone;
            self.eq[ei].stage = stage;
            self.param[pi].state = ParamState::SolvedAlone;
            self.param[pi].stage = stage;

            let f = self.eq[ei]
                .e
                .fold_constants()
                .rewrite_params_as_slots(&self.index);
            if f.count_references(h) == 1 && can_isolate(&f, h) {
                let val = isolate(&f, h, &*self).eval(&*self);
                self.param[pi].val = val;
                if self.config.is_unreasonable(val) {
                    warn!("{:?} has no real value from {:?}", h, self.eq[ei].h);
                    // leave the unsatisfied row in `mat` for the failure report
                    if self.write_jacobian(Subset::Alone(stage)) {
                        self.eval_residuals();
                    }
                    return false;
                }
                self.param[pi].known = true;
                debug!("{:?} = {} isolated from {:?}", h, val, self.eq[ei].h);
            } else if !self.write_jacobian(Subset::Alone(stage)) || !self.newton_solve() {
                warn!("{:?} alone did not converge for {:?}", self.eq[ei].h, h);
                return false;
            }
            stage += 1;
        }
        true
    }

    /// Tags unknowns that can be recovered from a single equation after the Newton solve and
    /// records them, latest round first, in `self.elimination`. Dragged unknowns are never
    /// eliminated. Returns how many unknowns were eliminated.
    pub fn eliminate_sequentially(&mut self) -> usize {
        let graph = ReferenceGraph::build(self);
        let mut round = ELIMINATION_STAGE_START;
        let mut eliminated = 0;
        loop {
            let mut found = EliminationRound::new();
            for pi in 0..self.param.len() {
                let h = self.param[pi].h;
                if self.param[pi].state != ParamState::Live || self.is_dragged(h) {
                    continue;
                }
                let open: Vec<usize> = graph.open_equations(self, pi, round).collect();
                let &[ei] = open.as_slice() else {
                    continue;
                };
                if !self.can_remove(&graph, pi, ei, round) {
                    continue;
                }
                let f = self.eq[ei].e.fold_constants();
                if !can_isolate(&f, h) {
                    continue;
                }
                self.eq[ei].state = EquationState::Eliminated;
                self.eq[ei].stage = round;
                self.param[pi].state = ParamState::Eliminated;
                self.param[pi].stage = round;
                found.insert(h, ei);
            }
            if found.is_empty() {
                break;
            }
            debug!("elimination round {}: {:?}", round, found);
            eliminated += found.len();
            self.elimination.push_front(found);
            round += 1;
        }
        eliminated
    }

    /// Every other unknown of `ei` keeps at least one open equation besides `ei`.
    fn can_remove(&self, graph: &ReferenceGraph, pi: usize, ei: usize, round: u32) -> bool {
        let Some(others) = graph.params_of.get(&ei) else {
            return true;
        };
        others
            .iter()
            .filter(|&&other| other != pi)
            .all(|&other| graph.open_equations(self, other, round).any(|e| e != ei))
    }

    /// Recovers eliminated unknowns, innermost round first.
    ///
    /// # Returns
    /// the defining equation of the first unknown that comes out NaN or unreasonably large,
    /// e.g. `x^2 = -2`; the remaining unknowns are left as they were
    pub fn replay_eliminations(&mut self) -> Result<(), EquationHandle> {
        let rounds = std::mem::take(&mut self.elimination);
        let replayed = self.replay_rounds(&rounds);
        self.elimination = rounds;
        replayed
    }

    fn replay_rounds(&mut self, rounds: &VecDeque<EliminationRound>) -> Result<(), EquationHandle> {
        for found in rounds.iter() {
            for (&h, &ei) in found.iter() {
                let f = self.eq[ei]
                    .e
                    .fold_constants()
                    .rewrite_params_as_slots(&self.index);
                let val = isolate(&f, h, &*self).eval(&*self);
                if self.config.is_unreasonable(val) {
                    warn!("{:?} has no real value from {:?}", h, self.eq[ei].h);
                    return Err(self.eq[ei].h);
                }
                if let Some(&pi) = self.index.get(&h) {
                    self.param[pi].val = val;
                    self.param[pi].known = true;
                }
            }
        }
        Ok(())
    }
}
