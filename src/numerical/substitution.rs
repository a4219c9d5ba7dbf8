//! Collapsing of parameters proven equal by `a - b = 0` equations.
//!
//! Equal parameters are grouped with an index based union-find over the parameter arena. A
//! pair whose members already share a root would close a cycle and is only marked satisfied.
//! Each group then gets one canonical root: the first dragged member in table order, or, when
//! nothing in the group is dragged, the last member in table order. Every other member points
//! straight at the root, and all equations are rewritten in terms of roots.

use crate::numerical::system::{EquationState, ParamState, System};
use crate::symbolic::symbolic_engine::{Expr, ParamHandle};
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;

/// union-find over arena positions
pub struct ParamUnion {
    parent: Vec<usize>,
}

impl ParamUnion {
    pub fn new(n: usize) -> ParamUnion {
        ParamUnion {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// joins the sets of `a` and `b`; false if they were already one set
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }
}

impl System {
    /// Both sides of `e` if it has the shape `param - param` over unknowns of this system.
    fn substitution_pair(&self, e: &Expr) -> Option<(usize, usize)> {
        let Expr::Sub(a, b) = e else {
            return None;
        };
        match (a.as_ref(), b.as_ref()) {
            (Expr::Param(ha), Expr::Param(hb)) => {
                Some((*self.index.get(ha)?, *self.index.get(hb)?))
            }
            _ => None,
        }
    }

    /// Runs the substitution pass. Returns the number of unknowns substituted away.
    pub fn solve_by_substitution(&mut self) -> usize {
        let mut sets = ParamUnion::new(self.param.len());
        let mut pairs = 0;
        for ei in 0..self.eq.len() {
            let Some((a, b)) = self.substitution_pair(&self.eq[ei].e) else {
                continue;
            };
            if a != b && !sets.union(a, b) {
                debug!(
                    "{:?} = {:?} closes a substitution cycle",
                    self.param[a].h, self.param[b].h
                );
            }
            self.eq[ei].state = EquationState::Satisfied;
            pairs += 1;
        }
        if pairs == 0 {
            return 0;
        }

        // members of each set, in table order
        let members = (0..self.param.len())
            .map(|i| (sets.find(i), i))
            .into_group_map();
        let mut to_root: HashMap<ParamHandle, ParamHandle> = HashMap::new();
        for group in members.values().filter(|group| group.len() > 1) {
            let root = group
                .iter()
                .copied()
                .find(|&i| self.is_dragged(self.param[i].h))
                .or_else(|| group.last().copied());
            let Some(root) = root else {
                continue;
            };
            let root_h = self.param[root].h;
            for &i in group {
                let p = &mut self.param[i];
                if i == root {
                    p.substd = None;
                    p.state = ParamState::Live;
                } else {
                    p.substd = Some(root_h);
                    p.state = ParamState::Substituted;
                    to_root.insert(p.h, root_h);
                }
            }
        }

        for eq in self.eq.iter_mut() {
            eq.e = eq.e.substitute_params(&to_root);
        }
        debug!(
            "substitution: {} equations consumed, {} unknowns substituted",
            pairs,
            to_root.len()
        );
        to_root.len()
    }

    /// Substituted unknowns take the value of their root.
    pub fn copy_substituted_values(&mut self) {
        for i in 0..self.param.len() {
            if self.param[i].state != ParamState::Substituted {
                continue;
            }
            if let Some(root) = self.param[i].substd.and_then(|h| self.index.get(&h).copied()) {
                self.param[i].val = self.param[root].val;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::{ConstraintHandle, EquationHandle, EquationOrigin};
    use crate::Utils::config::SolverConfig;

    fn handle(c: u32) -> EquationHandle {
        EquationHandle::new(EquationOrigin::Constraint(ConstraintHandle(c)), 0)
    }

    fn p(h: u32) -> Expr {
        Expr::Param(ParamHandle(h))
    }

    fn system_with(params: &[u32]) -> System {
        let mut sys = System::new(SolverConfig::default());
        for &h in params {
            sys.add_param(ParamHandle(h), h as f64);
        }
        sys
    }

    #[test]
    fn test_union_find() {
        let mut sets = ParamUnion::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(1, 2));
        assert!(!sets.union(2, 0));
        assert_eq!(sets.find(0), sets.find(2));
        assert_ne!(sets.find(3), sets.find(0));
    }

    #[test]
    fn test_no_pairs_changes_nothing() {
        let mut sys = system_with(&[1, 2, 3]);
        sys.add_equation(handle(0), p(1) + p(2) - Expr::Const(4.0));
        sys.add_equation(handle(1), p(3) - Expr::Const(1.0));
        // foreign right-hand side is not a substitution
        sys.set_foreign(ParamHandle(99), 1.0);
        sys.add_equation(handle(2), p(2) - p(99));
        let params_before = sys.param.clone();
        let eqs_before = sys.eq.clone();
        assert_eq!(sys.solve_by_substitution(), 0);
        assert_eq!(sys.param, params_before);
        assert_eq!(sys.eq, eqs_before);
    }

    #[test]
    fn test_chain_collapses_to_last_member() {
        let mut sys = system_with(&[1, 2, 3, 4]);
        sys.add_equation(handle(0), p(1) - p(2));
        sys.add_equation(handle(1), p(2) - p(3));
        sys.add_equation(handle(2), p(1) + p(4) - Expr::Const(10.0));
        assert_eq!(sys.solve_by_substitution(), 2);
        assert_eq!(sys.param[0].substd, Some(ParamHandle(3)));
        assert_eq!(sys.param[1].substd, Some(ParamHandle(3)));
        assert_eq!(sys.param[2].state, ParamState::Live);
        assert_eq!(sys.eq[0].state, EquationState::Satisfied);
        assert_eq!(sys.eq[2].state, EquationState::Live);
        assert_eq!(sys.eq[2].e, p(3) + p(4) - Expr::Const(10.0));
    }

    #[test]
    fn test_cycle_terminates_with_one_root() {
        let mut sys = system_with(&[1, 2, 3]);
        sys.add_equation(handle(0), p(1) - p(2));
        sys.add_equation(handle(1), p(2) - p(3));
        sys.add_equation(handle(2), p(3) - p(1));
        assert_eq!(sys.solve_by_substitution(), 2);
        let live: Vec<_> = sys
            .param
            .iter()
            .filter(|p| p.state == ParamState::Live)
            .collect();
        assert_eq!(live.len(), 1);
        assert!(sys.eq.iter().all(|e| e.state == EquationState::Satisfied));
    }

    #[test]
    fn test_dragged_member_is_root_in_any_order() {
        let orders: [[(u32, u32); 3]; 3] = [
            [(1, 2), (2, 3), (3, 1)],
            [(3, 1), (1, 2), (2, 3)],
            [(2, 3), (3, 1), (1, 2)],
        ];
        for order in orders {
            let mut sys = system_with(&[1, 2, 3]);
            sys.dragged.push(ParamHandle(2));
            for (k, (a, b)) in order.iter().enumerate() {
                sys.add_equation(handle(k as u32), p(*a) - p(*b));
            }
            sys.solve_by_substitution();
            assert_eq!(sys.param[1].state, ParamState::Live);
            assert_eq!(sys.param[1].substd, None);
            assert_eq!(sys.param[0].substd, Some(ParamHandle(2)));
            assert_eq!(sys.param[2].substd, Some(ParamHandle(2)));
        }
    }

    #[test]
    fn test_self_pair_is_satisfied() {
        let mut sys = system_with(&[1]);
        sys.add_equation(handle(0), p(1) - p(1));
        assert_eq!(sys.solve_by_substitution(), 0);
        assert_eq!(sys.eq[0].state, EquationState::Satisfied);
        assert_eq!(sys.param[0].state, ParamState::Live);
    }

    #[test]
    fn test_copy_substituted_values() {
        let mut sys = system_with(&[1, 2]);
        sys.add_equation(handle(0), p(1) - p(2));
        sys.solve_by_substitution();
        sys.param[1].val = 42.0;
        sys.copy_substituted_values();
        assert_eq!(sys.param[0].val, 42.0);
    }
}
