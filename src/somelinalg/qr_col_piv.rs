#![allow(non_snake_case)]
#![allow(non_camel_case_types)]
use log::debug;
use nalgebra::{DMatrix, DVector};

/// Householder QR decomposition with column pivoting, A P = Q R, written out in the LINPACK
/// manner: the Householder vectors are kept below the diagonal of `qr`, R on and above it.
///
/// At every step the remaining column with the largest norm is swapped into place, so the
/// magnitudes of the diagonal of R never increase and the numerical rank is the number of
/// diagonal entries above a threshold. Works for any shape, m x n.
pub struct QR_col_piv {
    qr: DMatrix<f64>,
    /// Householder coefficients, one per reflection
    beta: Vec<f64>,
    /// column permutation: column i of A P is column p[i] of A
    p: Vec<usize>,
    /// largest column norm of the original matrix
    max_col_norm: f64,
}

impl QR_col_piv {
    pub fn new(matrix: DMatrix<f64>) -> QR_col_piv {
        let max_col_norm = matrix
            .column_iter()
            .map(|col| col.norm())
            .fold(0.0, f64::max);
        let mut res = QR_col_piv {
            qr: matrix,
            beta: Vec::new(),
            p: Vec::new(),
            max_col_norm,
        };
        res.factorize();
        res
    }

    fn factorize(&mut self) {
        let a = &mut self.qr;
        let (m, n) = a.shape();
        let k = m.min(n);
        let mut p: Vec<usize> = (0..n).collect();
        let mut beta = vec![0.0; k];
        for i in 0..k {
            // pivot: remaining column with the largest norm below row i
            let mut piv = i;
            let mut piv_norm2 = -1.0;
            for j in i..n {
                let mut s = 0.0;
                for r in i..m {
                    s += a[(r, j)] * a[(r, j)];
                }
                if s > piv_norm2 {
                    piv_norm2 = s;
                    piv = j;
                }
            }
            if piv != i {
                a.swap_columns(i, piv);
                p.swap(i, piv);
            }
            let alpha = piv_norm2.sqrt();
            if alpha == 0.0 {
                // everything left is exactly zero
                break;
            }
            let sign = if a[(i, i)] >= 0.0 { 1.0 } else { -1.0 };
            let v0 = a[(i, i)] + sign * alpha;
            let mut vtv = 1.0;
            for r in i + 1..m {
                a[(r, i)] /= v0;
                vtv += a[(r, i)] * a[(r, i)];
            }
            let b = 2.0 / vtv;
            a[(i, i)] = -sign * alpha;
            // apply H = I - b v v^T to the trailing columns
            for j in i + 1..n {
                let mut s = a[(i, j)];
                for r in i + 1..m {
                    s += a[(r, i)] * a[(r, j)];
                }
                s *= b;
                a[(i, j)] -= s;
                for r in i + 1..m {
                    let v_r = a[(r, i)];
                    a[(r, j)] -= s * v_r;
                }
            }
            beta[i] = b;
        }
        self.p = p;
        self.beta = beta;
    }

    /// Default threshold below which a diagonal entry of R counts as zero:
    /// 20 (m + n) max|A_j| eps, with max|A_j| replaced by 1 for a zero matrix.
    pub fn default_threshold(&self) -> f64 {
        let (m, n) = self.qr.shape();
        let norm = if self.max_col_norm == 0.0 {
            1.0
        } else {
            self.max_col_norm
        };
        20.0 * (m + n) as f64 * norm * f64::EPSILON
    }

    pub fn rank_with_threshold(&self, threshold: f64) -> usize {
        let k = self.qr.nrows().min(self.qr.ncols());
        (0..k)
            .take_while(|&i| self.qr[(i, i)].abs() > threshold)
            .count()
    }

    pub fn rank(&self) -> usize {
        self.rank_with_threshold(self.default_threshold())
    }

    pub fn diag_r(&self) -> DVector<f64> {
        let k = self.qr.nrows().min(self.qr.ncols());
        DVector::from_fn(k, |i, _| self.qr[(i, i)])
    }

    pub fn permutation(&self) -> &Vec<usize> {
        &self.p
    }

    /// b <- Q^T b
    pub fn q_tr_mul(&self, b: &mut DVector<f64>) {
        let a = &self.qr;
        let m = a.nrows();
        for (i, &beta) in self.beta.iter().enumerate() {
            if beta == 0.0 {
                continue;
            }
            let mut s = b[i];
            for r in i + 1..m {
                s += a[(r, i)] * b[r];
            }
            s *= beta;
            b[i] -= s;
            for r in i + 1..m {
                b[r] -= s * a[(r, i)];
            }
        }
    }

    /// Squared norm of the part of `b` inside the span of the first `rank` columns of Q,
    /// which is the column space of A when `rank` is its numerical rank.
    pub fn range_norm2(&self, b: &DVector<f64>, rank: usize) -> f64 {
        let mut w = b.clone();
        self.q_tr_mul(&mut w);
        w.iter().take(rank).map(|v| v * v).sum()
    }

    /// Basic solution of A x = b: the leading `rank` x `rank` block of R is back-substituted,
    /// the components of the remaining (dependent) columns are set to zero. For a consistent
    /// system this solves it exactly, otherwise it is an approximate solution.
    pub fn solve_basic(&self, b: &DVector<f64>) -> Option<DVector<f64>> {
        let (m, n) = self.qr.shape();
        if b.len() != m {
            return None;
        }
        let rank = self.rank();
        let mut w = b.clone();
        self.q_tr_mul(&mut w);
        let mut y = DVector::zeros(n);
        for i in (0..rank).rev() {
            let mut s = w[i];
            for j in i + 1..rank {
                s -= self.qr[(i, j)] * y[j];
            }
            y[i] = s / self.qr[(i, i)];
        }
        if y.iter().any(|v| !v.is_finite()) {
            debug!("basic solution is not finite, rank {} of {}x{}", rank, m, n);
            return None;
        }
        let mut x = DVector::zeros(n);
        for (i, &col) in self.p.iter().enumerate() {
            x[col] = y[i];
        }
        Some(x)
    }

    /// R as an explicit min(m, n) x n matrix
    pub fn r(&self) -> DMatrix<f64> {
        let (m, n) = self.qr.shape();
        let k = m.min(n);
        DMatrix::from_fn(k, n, |i, j| if j >= i { self.qr[(i, j)] } else { 0.0 })
    }
}
