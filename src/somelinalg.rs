//! some linear algebra functions used throughout the code
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// Householder QR decomposition with column pivoting: numerical rank and basic solutions
/// of rank deficient systems
pub mod qr_col_piv;
/// conversions between sprs triplets, compressed sparse matrices and nalgebra dense matrices
pub mod sparse_utils;
