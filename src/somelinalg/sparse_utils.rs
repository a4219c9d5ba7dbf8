use nalgebra::DMatrix;
use sprs::{CsMat, TriMat};

/// builds a compressed sparse column matrix out of (row, col, value) triplets
pub fn sprs_triplet_to_csc(
    nrows: usize,
    ncols: usize,
    triplets: &Vec<(usize, usize, f64)>,
) -> CsMat<f64> {
    let mut triplet_matrix = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        triplet_matrix.add_triplet(*i, *j, *v);
    }
    let csc_matrix: CsMat<f64> = triplet_matrix.to_csc();
    csc_matrix
}

/// dense copy of a sparse matrix stored either way
pub fn csmat_to_dense(mat: &CsMat<f64>) -> DMatrix<f64> {
    let (nrows, ncols) = mat.shape();
    let mut dense = DMatrix::zeros(nrows, ncols);
    for (outer, vec) in mat.outer_iterator().enumerate() {
        for (inner, &val) in vec.iter() {
            if mat.is_csc() {
                dense[(inner, outer)] += val;
            } else {
                dense[(outer, inner)] += val;
            }
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplets_roundtrip_through_dense() {
        let triplets = vec![(0, 0, 1.0), (1, 2, -3.0), (2, 1, 4.5)];
        let csc = sprs_triplet_to_csc(3, 3, &triplets);
        assert!(csc.is_csc());
        assert_eq!(csc.nnz(), 3);
        let dense = csmat_to_dense(&csc);
        assert_eq!(dense[(0, 0)], 1.0);
        assert_eq!(dense[(1, 2)], -3.0);
        assert_eq!(dense[(2, 1)], 4.5);
        assert_eq!(dense[(1, 1)], 0.0);
        let csr = csc.to_csr();
        assert_eq!(csmat_to_dense(&csr), dense);
    }

    #[test]
    fn test_empty_shapes() {
        let csc = sprs_triplet_to_csc(2, 0, &Vec::new());
        let dense = csmat_to_dense(&csc);
        assert_eq!(dense.shape(), (2, 0));
    }
}
