//! Newton-Raphson iteration over the current `SparseSystem` snapshot, with the step taken as
//! the minimum norm least squares solution of `J dx = F`.
//!
//! The step is computed through the normal equations of the row space: with column weights
//! `W`, `(J W)(J W)^T z = F` is solved by rank revealing QR and `dx = W (J W)^T z`. Dragged
//! unknowns get a small weight so the rest of the sketch moves instead of them.
//!
//! Example (one unknown, `x^2 - 2 = 0`):
//! ```
//! use RustedGCS::numerical::system::{Subset, System};
//! use RustedGCS::symbolic::symbolic_engine::{
//!     ConstraintHandle, EquationHandle, EquationOrigin, Expr, ParamHandle,
//! };
//! use RustedGCS::Utils::config::SolverConfig;
//! let mut sys = System::new(SolverConfig::default());
//! sys.add_param(ParamHandle(1), 1.0);
//! let x = Expr::Param(ParamHandle(1));
//! let h = EquationHandle::new(EquationOrigin::Constraint(ConstraintHandle(0)), 0);
//! sys.add_equation(h, x.clone() * x - Expr::Const(2.0));
//! assert!(sys.write_jacobian(Subset::Live));
//! assert!(sys.newton_solve());
//! assert!((sys.param[0].val - 2f64.sqrt()).abs() < 1e-8);
//! ```
use crate::error::SolverError;
use crate::numerical::system::System;
use crate::somelinalg::qr_col_piv::QR_col_piv;
use crate::somelinalg::sparse_utils::{csmat_to_dense, sprs_triplet_to_csc};
use log::{debug, warn};
use nalgebra::DVector;
use sprs::CsMat;

impl System {
    /// Least squares step for the current Jacobian and residuals, stored in `mat.X`.
    /// An empty system has the empty step.
    pub fn solve_least_squares(&mut self) -> Result<(), SolverError> {
        let (m, n) = (self.mat.m, self.mat.n);
        let scale: Vec<f64> = self
            .mat
            .param
            .iter()
            .map(|&slot| {
                if self.is_dragged(self.param[slot].h) {
                    self.config.dragged_column_scale
                } else {
                    1.0
                }
            })
            .collect();
        self.mat.scale = DVector::from_vec(scale);
        if m == 0 || n == 0 {
            self.mat.X = DVector::zeros(n);
            return Ok(());
        }

        let scaled: Vec<(usize, usize, f64)> = self
            .mat
            .A_num
            .iter()
            .map(|(&v, (i, j))| (i, j, v * self.mat.scale[j]))
            .collect();
        let A = sprs_triplet_to_csc(m, n, &scaled);
        // only the m x m normal matrix is made dense
        let AAt: CsMat<f64> = &A * &A.transpose_view();
        let qr = QR_col_piv::new(csmat_to_dense(&AAt));
        let z = qr.solve_basic(&self.mat.B_num).ok_or_else(|| {
            SolverError::LeastSquares(format!("{} x {} normal equations, rank {}", m, m, qr.rank()))
        })?;
        let mut X = DVector::zeros(n);
        for (&v, (i, j)) in A.iter() {
            X[j] += v * z[i] * self.mat.scale[j];
        }
        self.mat.X = X;
        Ok(())
    }

    /// Iterates until every residual is below `converge_tolerance`.
    ///
    /// # Returns
    /// false when the iteration limit is hit, the step cannot be computed, or a value or
    /// residual becomes unreasonable
    pub fn newton_solve(&mut self) -> bool {
        let tol = self.config.converge_tolerance;
        let max_iterations = self.config.max_newton_iterations;
        let mut iter = 0;
        let mut converged = false;
        self.eval_residuals();
        loop {
            self.eval_jacobian();
            if let Err(e) = self.solve_least_squares() {
                warn!("newton stopped after {} iterations: {}", iter, e);
                break;
            }
            for j in 0..self.mat.n {
                let slot = self.mat.param[j];
                self.param[slot].val -= self.mat.X[j];
                if self.config.is_unreasonable(self.param[slot].val) {
                    debug!("{:?} blew up at iteration {}", self.param[slot].h, iter);
                    return false;
                }
            }
            self.eval_residuals();
            converged = true;
            for i in 0..self.mat.m {
                let b = self.mat.B_num[i];
                if self.config.is_unreasonable(b) {
                    debug!("residual {} blew up at iteration {}", i, iter);
                    return false;
                }
                if b.abs() > tol {
                    converged = false;
                    break;
                }
            }
            if converged || iter >= max_iterations {
                break;
            }
            iter += 1;
        }
        debug!(
            "newton {} x {}: converged = {} after {} iterations",
            self.mat.m,
            self.mat.n,
            converged,
            iter + 1
        );
        converged
    }
}
