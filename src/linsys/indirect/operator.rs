#![allow(non_snake_case)]

use crate::algebra::*;

/// The reduced KKT operator `M = ρ_x I + P + Aᵀ diag(ρ_y)⁻¹ A`, applied
/// through sparse products with the problem data.
///
/// `P` is read as a symmetric matrix stored by its upper triangle when
/// `P_is_triu` is set, and as a full matrix otherwise.

pub struct ReducedKKTOperator<'a, T> {
    pub A: &'a CscMatrix<T>,
    pub P: &'a CscMatrix<T>,
    pub P_is_triu: bool,
    pub rho_x: T,
    pub rho_y_inv: &'a [T],
}

impl<'a, T> ReducedKKTOperator<'a, T>
where
    T: FloatT,
{
    /// `y = M x`.  `work` must have length `m`.
    pub fn apply(&self, y: &mut [T], x: &[T], work: &mut [T]) {
        // y = ρ_x x + P x
        y.scalarop_from(|v| self.rho_x * v, x);
        if self.P_is_triu {
            self.P.sym().symv(y, x, T::one(), T::one());
        } else {
            self.P.gemv(y, x, T::one(), T::one());
        }

        // y += Aᵀ R⁻¹ A x
        self.A.gemv(work, x, T::one(), T::zero());
        work.hadamard(self.rho_y_inv);
        self.A.t().gemv(y, work, T::one(), T::one());
    }

    /// Writes the diagonal of `M`, i.e. `ρ_x + P_jj + Σᵢ A_ij² / ρ_y_i`.
    pub fn diagonal(&self, diag: &mut [T]) {
        let mut work = vec![T::zero(); diag.len()];
        self.P.diagonal(diag);
        self.A.col_sumsq_weighted(&mut work, self.rho_y_inv);
        diag.axpby(T::one(), &work, T::one());
        diag.scalarop(|d| d + self.rho_x);
    }
}

#[test]
fn test_reduced_operator() {
    // A = [1 2; 0 1; 3 0], P = [2 1; 1 4]
    let A = CscMatrix::from(&[
        [1., 2.], //
        [0., 1.], //
        [3., 0.], //
    ]);
    let Pfull = CscMatrix::from(&[
        [2., 1.], //
        [1., 4.], //
    ]);
    let Ptriu = Pfull.to_triu();
    let rho_y_inv = [1., 0.5, 0.25];

    // M = I + P + Aᵀ diag(1, .5, .25) A
    //   = [1+2+1+2.25   1+2      ]   [6.25  3  ]
    //     [1+2          1+4+4+.5 ] = [3     9.5]
    let x = [1., -1.];
    let expected = [3.25, -6.5];

    for (P, triu) in [(&Pfull, false), (&Ptriu, true)] {
        let op = ReducedKKTOperator {
            A: &A,
            P,
            P_is_triu: triu,
            rho_x: 1.,
            rho_y_inv: &rho_y_inv,
        };
        let mut y = [0.; 2];
        let mut work = [0.; 3];
        op.apply(&mut y, &x, &mut work);
        assert!(y.norm_inf_diff(&expected) < 1e-14);

        let mut d = [0.; 2];
        op.diagonal(&mut d);
        assert!(d.norm_inf_diff(&[6.25, 9.5]) < 1e-14);
    }
}
