//! Numeric rank of the live Jacobian, degrees of freedom and free unknowns.

use crate::global::FREE_COLUMN_TOLERANCE;
use crate::numerical::system::{Subset, System};
use crate::somelinalg::qr_col_piv::QR_col_piv;
use crate::somelinalg::sparse_utils::csmat_to_dense;
use log::debug;
use nalgebra::DVector;

impl System {
    /// Rank of `mat.A_num` as it was last evaluated.
    pub fn calculate_rank(&self) -> usize {
        if self.mat.m == 0 || self.mat.n == 0 {
            return 0;
        }
        QR_col_piv::new(csmat_to_dense(&self.mat.A_num)).rank()
    }

    /// Evaluates the Jacobian at the current point and records rank and DOF.
    /// True when no equation is redundant (rank equals the equation count).
    pub fn test_rank(&mut self) -> bool {
        self.eval_jacobian();
        let rank = self.calculate_rank();
        self.rank = Some(rank);
        self.dof = self.mat.n as i32 - rank as i32;
        debug!(
            "rank {} of {} x {}, dof {}",
            rank, self.mat.m, self.mat.n, self.dof
        );
        rank == self.mat.m
    }

    /// Clears every `free` flag; with `find`, marks each live unknown whose column can be
    /// dropped while the Jacobian keeps full row rank.
    ///
    /// Dropping column j loses rank exactly when the unit vector e_j lies in the row space of
    /// J, so one factorization of J^T covers every column: with Q1 the first `rank` columns of
    /// its Q, the unknown is free when `1 - |Q1^T e_j|^2` is above `FREE_COLUMN_TOLERANCE`.
    pub fn mark_params_free(&mut self, find: bool) {
        for p in self.param.iter_mut() {
            p.free = false;
        }
        if !find || !self.write_jacobian(Subset::Live) {
            return;
        }
        self.eval_jacobian();
        let (m, n) = (self.mat.m, self.mat.n);
        let free_columns: Vec<usize> = if m == 0 {
            (0..n).collect()
        } else {
            let qr = QR_col_piv::new(csmat_to_dense(&self.mat.A_num).transpose());
            let rank = qr.rank();
            if rank < m {
                // redundant rows stay redundant with a column less
                Vec::new()
            } else {
                (0..n)
                    .filter(|&j| {
                        let e_j = DVector::from_fn(n, |i, _| if i == j { 1.0 } else { 0.0 });
                        1.0 - qr.range_norm2(&e_j, rank) > FREE_COLUMN_TOLERANCE
                    })
                    .collect()
            }
        };
        debug!("{} of {} unknowns free", free_columns.len(), n);
        for j in free_columns {
            let slot = self.mat.param[j];
            self.param[slot].free = true;
        }
    }
}
