#![allow(non_snake_case)]

use super::datamap::*;
use crate::algebra::*;

// Assembles the triu KKT matrix
//
//   [ P + diag  Aᵀ ]
//   [    ⋅      diag]
//
// with a structural entry everywhere on the diagonal.  Diagonal
// values other than those of P are left as zeros for the caller
// to fill through the returned map.  P must be triu.
pub(crate) fn assemble_kkt_matrix<T: FloatT>(
    P: &CscMatrix<T>,
    A: &CscMatrix<T>,
) -> (CscMatrix<T>, LDLDataMap) {
    let mut map = LDLDataMap::new(P, A);
    let (m, n) = A.size();

    // entries actually on the diagonal of P
    let nnz_diagP = P.count_diagonal_entries();

    let nnzKKT = P.nnz() +      // Number of elements in P
    n -                         // Number of elements in diagonal top left block
    nnz_diagP +                 // remove double count on the diagonal if P has entries
    A.nnz() +                   // Number of nonzeros in A
    m; // Number of elements in diagonal below Aᵀ

    let mut K = CscMatrix::<T>::spalloc(m + n, m + n, nnzKKT);

    // use K.colptr to hold nnz entries in each column
    K.colptr.fill(0);
    K.colcount_block(P, 0, MatrixShape::N);
    K.colcount_missing_diag(P, 0);
    K.colcount_block(A, n, MatrixShape::T);
    K.colcount_diag(n, m);

    K.colcount_to_colptr();

    K.fill_block(P, &mut map.P, 0, 0, MatrixShape::N);
    K.fill_missing_diag(P, 0); // after P, since triu
    K.fill_block(A, &mut map.A, 0, n, MatrixShape::T);
    K.fill_diag(&mut map.diag_rho_y, n, m);

    K.backshift_colptrs();

    // matrix is triu, so the diagonal is last in each column
    for (d, &next) in map.diag_full.iter_mut().zip(&K.colptr[1..]) {
        *d = next - 1;
    }
    map.diagP.copy_from_slice(&map.diag_full[0..n]);

    (K, map)
}

#[test]
fn test_kkt_assembly() {
    let P = CscMatrix::from(&[
        [1., 2., 4.], //
        [0., 3., 5.], //
        [0., 0., 6.], //
    ]);
    let A = CscMatrix::from(&[
        [7., 0., 8.],  //
        [0., 9., 10.], //
        [1., 2., 3.],
    ]);

    let K_true = CscMatrix::from(&[
        [1., 2., 4., 7., 0., 1.],  //
        [0., 3., 5., 0., 9., 2.],  //
        [0., 0., 6., 8., 10., 3.], //
        [0., 0., 0., -1., 0., 0.], //
        [0., 0., 0., 0., -1., 0.], //
        [0., 0., 0., 0., 0., -1.], //
    ]);

    let (mut K, map) = assemble_kkt_matrix(&P, &A);
    for &i in &map.diag_rho_y {
        K.nzval[i] = -1.;
    }
    assert_eq!(K, K_true);
    assert!(K.check_format().is_ok());

    // maps point at the right values
    for (k, &dest) in map.A.iter().enumerate() {
        assert_eq!(K.nzval[dest], A.nzval[k]);
    }
    for (k, &dest) in map.P.iter().enumerate() {
        assert_eq!(K.nzval[dest], P.nzval[k]);
    }
    assert_eq!(map.diag_full[3..], map.diag_rho_y[..]);
    for (col, &idx) in map.diag_full.iter().enumerate() {
        assert_eq!(K.rowval[idx], col);
    }
}

#[test]
fn test_kkt_assembly_missing_diagonal() {
    // P with an empty column and a missing diagonal entry
    let P = CscMatrix::from(&[
        [0., 0., 4.], //
        [0., 0., 5.], //
        [0., 0., 6.], //
    ]);
    let A = CscMatrix::from(&[
        [1., 1., 0.], //
    ]);

    let (K, map) = assemble_kkt_matrix(&P, &A);

    // structural zeros on the top left diagonal
    assert_eq!(K.nnz(), 3 + 2 + 2 + 1);
    assert_eq!(K.get_entry((0, 0)), Some(0.));
    assert_eq!(K.get_entry((1, 1)), Some(0.));
    assert_eq!(K.get_entry((2, 2)), Some(6.));
    assert_eq!(K.get_entry((3, 3)), Some(0.));
    assert_eq!(K.get_entry((1, 3)), Some(1.));
    assert_eq!(K.get_entry((2, 3)), None);
    assert!(K.is_triu());
    assert_eq!(map.diagP.len(), 3);
    assert_eq!(K.rowval[map.diag_rho_y[0]], 3);
}
