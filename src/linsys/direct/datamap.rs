#![allow(non_snake_case)]

use crate::algebra::*;

// Maps from problem data to the nonzeros of the triu KKT matrix
pub(crate) struct LDLDataMap {
    pub P: Vec<usize>,
    pub A: Vec<usize>,
    // the diagonal of the top left block, including
    // structural zeros where P has no diagonal entry
    pub diagP: Vec<usize>,
    // the diagonal of the bottom right -diag(rho_y) block
    pub diag_rho_y: Vec<usize>,
    // union of the two diagonal maps, in column order
    pub diag_full: Vec<usize>,
}

impl LDLDataMap {
    pub fn new<T: FloatT>(Pmat: &CscMatrix<T>, Amat: &CscMatrix<T>) -> Self {
        let (m, n) = Amat.size();
        Self {
            P: vec![0; Pmat.nnz()],
            A: vec![0; Amat.nnz()],
            diagP: vec![0; n],
            diag_rho_y: vec![0; m],
            diag_full: vec![0; m + n],
        }
    }
}
