//! Symbolic Jacobian assembly and its numeric evaluation.
//!
//! `write_jacobian` fixes the row and column order for everything that follows (Newton step,
//! rank test, mapping failing rows back to constraints), so rows and columns are always taken
//! in table order.

use crate::numerical::system::{SparseSystem, Subset, System};
use crate::somelinalg::sparse_utils::sprs_triplet_to_csc;
use log::{debug, error};
use nalgebra::DVector;
use std::collections::HashMap;

impl System {
    /// Builds the symbolic Jacobian and residual expressions of `subset`.
    ///
    /// Every equation is folded and rewritten to address unknowns by arena slot; a partial
    /// derivative is kept only when it does not fold to the constant zero.
    ///
    /// # Returns
    /// false when the equation count reaches `max_unknowns`; the snapshot is then empty
    pub fn write_jacobian(&mut self, subset: Subset) -> bool {
        let (cols, rows) = self.select(subset);
        let (m, n) = (rows.len(), cols.len());
        if m >= self.config.max_unknowns {
            error!(
                "{} equations, no more than {} allowed",
                m,
                self.config.max_unknowns.saturating_sub(1)
            );
            self.mat = SparseSystem::default();
            return false;
        }
        let col_of: HashMap<usize, usize> =
            cols.iter().enumerate().map(|(j, &slot)| (slot, j)).collect();

        let mut A_sym = Vec::new();
        let mut B_sym = Vec::with_capacity(m);
        let mut used = Vec::new();
        for (i, &ei) in rows.iter().enumerate() {
            let f = self.eq[ei]
                .e
                .fold_constants()
                .rewrite_params_as_slots(&self.index);
            used.clear();
            f.params_used(&mut used);
            for &h in used.iter() {
                let Some(j) = self.index.get(&h).and_then(|slot| col_of.get(slot)) else {
                    continue;
                };
                let pd = f.partial_wrt(h).fold_constants();
                if pd.is_zero_const() {
                    continue;
                }
                A_sym.push((i, *j, pd));
            }
            B_sym.push(f);
        }
        debug!(
            "jacobian {:?}: {} x {}, {} symbolic entries",
            subset,
            m,
            n,
            A_sym.len()
        );
        self.mat = SparseSystem {
            param: cols,
            eq: rows,
            m,
            n,
            A_sym,
            A_num: sprs::CsMat::zero((m, n)),
            B_sym,
            B_num: DVector::zeros(m),
            X: DVector::zeros(n),
            scale: DVector::from_element(n, 1.0),
        };
        true
    }

    /// Numeric Jacobian at the current point. Exact zeros are not stored.
    pub fn eval_jacobian(&mut self) {
        let triplets: Vec<(usize, usize, f64)> = self
            .mat
            .A_sym
            .iter()
            .map(|(i, j, pd)| (*i, *j, pd.eval(&*self)))
            .filter(|(_, _, v)| *v != 0.0)
            .collect();
        self.mat.A_num = sprs_triplet_to_csc(self.mat.m, self.mat.n, &triplets);
    }

    /// Residual vector at the current point.
    pub fn eval_residuals(&mut self) {
        let residuals: Vec<f64> = self.mat.B_sym.iter().map(|f| f.eval(&*self)).collect();
        self.mat.B_num = DVector::from_vec(residuals);
    }
}

#[cfg(test)]
mod tests {
    use crate::numerical::system::{EquationState, ParamState, Subset, System};
    use crate::somelinalg::sparse_utils::csmat_to_dense;
    use crate::symbolic::symbolic_engine::{
        ConstraintHandle, EquationHandle, EquationOrigin, ParamHandle,
    };
    use crate::Utils::config::SolverConfig;
    use approx::assert_relative_eq;

    fn handle(c: u32) -> EquationHandle {
        EquationHandle::new(EquationOrigin::Constraint(ConstraintHandle(c)), 0)
    }

    fn circle_system() -> System {
        // x^2 + y^2 - r^2 = 0, x - y = 0 with r foreign
        let mut sys = System::new(SolverConfig::default());
        sys.add_param(ParamHandle(1), 3.0);
        sys.add_param(ParamHandle(2), 4.0);
        sys.set_foreign(ParamHandle(50), 5.0);
        let (x, y, r) = crate::params!(1, 2, 50);
        sys.add_equation(handle(0), x.clone().square() + y.clone().square() - r.square());
        sys.add_equation(handle(1), x - y);
        sys
    }

    #[test]
    fn test_write_and_eval() {
        let mut sys = circle_system();
        assert!(sys.write_jacobian(Subset::Live));
        assert_eq!((sys.mat.m, sys.mat.n), (2, 2));
        sys.eval_jacobian();
        sys.eval_residuals();
        let a = csmat_to_dense(&sys.mat.A_num);
        assert_relative_eq!(a[(0, 0)], 6.0);
        assert_relative_eq!(a[(0, 1)], 8.0);
        assert_relative_eq!(a[(1, 0)], 1.0);
        assert_relative_eq!(a[(1, 1)], -1.0);
        assert_relative_eq!(sys.mat.B_num[0], 0.0);
        assert_relative_eq!(sys.mat.B_num[1], -1.0);
    }

    #[test]
    fn test_zero_partials_are_not_stored() {
        let mut sys = circle_system();
        sys.param[0].val = 0.0;
        sys.write_jacobian(Subset::Live);
        // symbolic entries: 2x, 2y, 1, -1
        assert_eq!(sys.mat.A_sym.len(), 4);
        sys.eval_jacobian();
        // 2x evaluates to exactly zero and is skipped
        assert_eq!(sys.mat.A_num.nnz(), 3);
    }

    #[test]
    fn test_columns_follow_subset() {
        let mut sys = circle_system();
        sys.param[1].state = ParamState::SolvedAlone;
        sys.eq[1].state = EquationState::Satisfied;
        sys.write_jacobian(Subset::Live);
        assert_eq!((sys.mat.m, sys.mat.n), (1, 1));
        assert_eq!(sys.mat.param, vec![0]);
        // y is no longer a column but still evaluates through its slot
        sys.eval_residuals();
        assert_relative_eq!(sys.mat.B_num[0], 0.0);
    }

    #[test]
    fn test_too_many_unknowns() {
        let mut config = SolverConfig::default();
        config.max_unknowns = 2;
        let mut sys = circle_system();
        sys.config = config;
        assert!(!sys.write_jacobian(Subset::Live));
        assert_eq!(sys.mat.m, 0);
        assert!(sys.mat.A_sym.is_empty());
    }
}
