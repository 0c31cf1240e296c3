#![allow(non_snake_case)]

use super::ldlsolvers::config::*;
use super::*;
use crate::linsys::*;
use std::iter::zip;
use std::time::Instant;
use tracing::{debug, trace, warn};

// -------------------------------------
// KKT linear system using a direct LDL factorisation
// -------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactorState {
    Ready,
    // the last numeric refactorization failed and
    // the factors must not be used until a good update
    Unusable,
}

/// Direct backend.  Holds the unpermuted triu KKT matrix, a map from
/// the problem data into it, and an LDL engine with its factors.

pub struct DirectLinSys<T: FloatT> {
    // problem dimensions
    m: usize,
    n: usize,

    // Left and right hand sides for solves
    x: Vec<T>,
    b: Vec<T>,

    // internal workspace for IR scheme
    work1: Vec<T>,
    work2: Vec<T>,

    // KKT mapping from problem data to KKT
    map: LDLDataMap,

    //unpermuted KKT matrix
    KKT: CscMatrix<T>,

    // the direct linear LDL solver
    ldlsolver: BoxedDirectLDLSolver<T>,

    rho_x: T,
    state: FactorState,
    fingerprint: MatrixFingerprint,
    settings: LinSysSettings<T>,
    info: LinSysInfo<T>,
}

impl<T> DirectLinSys<T>
where
    T: FloatT,
{
    /// Assembles and factors the KKT matrix.  Arguments are assumed
    /// to have passed the dimension checks in [`LinSysWorkspace::new`].
    pub fn new(
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        reg: &Regularization<T>,
        settings: &LinSysSettings<T>,
    ) -> Result<Self, LinSysError> {
        let timer = Instant::now();
        let (m, n) = A.size();

        // only the upper triangle of P is used
        let Ptriu_owned;
        let Ptriu = if P.is_triu() {
            P
        } else {
            Ptriu_owned = P.to_triu();
            &Ptriu_owned
        };

        // LHS/RHS/work for iterative refinement
        let x = vec![T::zero(); n + m];
        let b = vec![T::zero(); n + m];
        let work1 = vec![T::zero(); n + m];
        let work2 = vec![T::zero(); n + m];

        // the expected signs of D in LDL
        let mut dsigns = vec![1_i8; n + m];
        dsigns[n..].fill(-1);

        let ldl_ctor = get_ldlsolver_config(settings)?;

        let (mut KKT, map) = assemble_kkt_matrix(Ptriu, A);

        // ρ_x I + P on the top left, -diag(ρ_y) on the bottom right
        let rho_x = reg.rho_x();
        for &idx in &map.diagP {
            KKT.nzval[idx] += rho_x;
        }
        for (&idx, &r) in zip(&map.diag_rho_y, reg.rho_y()) {
            KKT.nzval[idx] = -r;
        }

        let ldlsolver = ldl_ctor(&KKT, &dsigns, settings).map_err(|e| {
            warn!("KKT factorization failed on initialization: {e}");
            LinSysError::Factorization(e)
        })?;

        check_inertia(ldlsolver.as_ref(), n)?;

        let mut info = LinSysInfo {
            factorizations: 1,
            factor_nnz: ldlsolver.nnz_factors(),
            ..LinSysInfo::default()
        };
        info.setup_time = timer.elapsed().as_secs_f64();

        debug!(
            n,
            m,
            nnz_kkt = KKT.nnz(),
            nnz_factors = info.factor_nnz,
            seconds = info.setup_time,
            "direct KKT solver initialized"
        );

        Ok(Self {
            m,
            n,
            x,
            b,
            work1,
            work2,
            map,
            KKT,
            ldlsolver,
            rho_x,
            state: FactorState::Ready,
            fingerprint: MatrixFingerprint::new(A, P),
            settings: settings.clone(),
            info,
        })
    }

    /// True if the current factors can be used for solves
    pub fn is_usable(&self) -> bool {
        self.state == FactorState::Ready
    }

    /// The unpermuted triu KKT matrix for the current regularization
    pub fn kkt(&self) -> &CscMatrix<T> {
        &self.KKT
    }

    // true if A and P carry the values the KKT matrix was built from.
    // P values are only checked when P is stored as triu, since the
    // map is into the triu part.
    fn data_matches(&self, A: &CscMatrix<T>, P: &CscMatrix<T>) -> bool {
        let K = &self.KKT.nzval;

        if !zip(&A.nzval, &self.map.A).all(|(&v, &idx)| K[idx] == v) {
            return false;
        }
        // the upper triangle of P, in column order, is what was assembled
        let mut dest = self.map.P.iter();
        for col in 0..P.n {
            for k in P.colptr[col]..P.colptr[col + 1] {
                let row = P.rowval[k];
                if row > col {
                    continue;
                }
                let mut v = P.nzval[k];
                if row == col {
                    v += self.rho_x;
                }
                match dest.next() {
                    Some(&idx) if K[idx] == v => {}
                    _ => return false,
                }
            }
        }
        dest.next().is_none()
    }

    fn refactor(&mut self) -> Result<(), LinSysError> {
        let timer = Instant::now();

        let result = self
            .ldlsolver
            .refactor(&self.KKT)
            .map_err(LinSysError::Factorization)
            .and_then(|_| check_inertia(self.ldlsolver.as_ref(), self.n));

        self.info.factorizations += 1;

        match result {
            Ok(()) => {
                self.state = FactorState::Ready;
                trace!(seconds = timer.elapsed().as_secs_f64(), "KKT refactored");
                Ok(())
            }
            Err(e) => {
                warn!("KKT refactorization failed: {e}");
                self.state = FactorState::Unusable;
                Err(e)
            }
        }
    }

    // Iterative refinement of self.x against self.b.  Returns the
    // number of refinement steps taken and the final residual norm.
    fn iterative_refinement(&mut self) -> (u32, T) {
        let (x, b) = (&mut self.x, &self.b);
        let (e, dx) = (&mut self.work1, &mut self.work2);

        // iterative refinement params
        let settings = &self.settings;
        let reltol = settings.iterative_refinement_reltol;
        let abstol = settings.iterative_refinement_abstol;
        let maxiter = settings.iterative_refinement_max_iter;
        let stopratio = settings.iterative_refinement_stop_ratio;

        let K = &self.KKT;
        let normb = b.norm_inf();

        //compute the initial error
        let mut norme = _get_refine_error(e, b, K, x);
        let mut steps = 0;

        for _ in 0..maxiter {
            // bail on numerical error
            if !norme.is_finite() || norme <= (abstol + reltol * normb) {
                break;
            }

            let lastnorme = norme;

            //make a refinement
            self.ldlsolver.solve(dx, e);
            steps += 1;

            //prospective solution is x + dx.  Use dx space to
            // hold it for a check before applying to x
            dx.axpby(T::one(), x, T::one());
            norme = _get_refine_error(e, b, K, dx);

            let improved_ratio = lastnorme / norme;
            if improved_ratio < stopratio {
                //insufficient improvement.  Exit
                if improved_ratio > T::one() {
                    std::mem::swap(x, dx);
                } else {
                    norme = lastnorme;
                }
                break;
            }
            std::mem::swap(x, dx);
        }
        (steps, norme)
    }
}

impl<T> LinearSystemSolver<T> for DirectLinSys<T>
where
    T: FloatT,
{
    fn solve(
        &mut self,
        _A: &CscMatrix<T>,
        _P: &CscMatrix<T>,
        b: &mut [T],
        _warm_start: Option<&[T]>,
        _tol: T,
    ) -> LinSysStatus {
        if self.state == FactorState::Unusable {
            warn!("solve called after a failed refactorization");
            return LinSysStatus::FactorizationFailed;
        }
        let timer = Instant::now();

        self.b.copy_from(b);
        self.ldlsolver.solve(&mut self.x, &self.b);

        let (steps, residual) = if self.settings.iterative_refinement_enable {
            self.iterative_refinement()
        } else {
            let e = &mut self.work1;
            (0, _get_refine_error(e, &self.b, &self.KKT, &self.x))
        };

        self.info
            .record_solve(steps, residual, timer.elapsed().as_secs_f64());

        if !self.x.is_finite() {
            warn!("direct solve produced non-finite values");
            return LinSysStatus::NumericalError;
        }
        trace!(steps, residual = %residual, "direct solve");

        b.copy_from(&self.x);
        LinSysStatus::Success
    }

    fn update(
        &mut self,
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        rho_y: &[T],
    ) -> Result<(), LinSysError> {
        if self.settings.check_inputs && !self.data_matches(A, P) {
            return Err(LinSysError::MatrixMismatch);
        }

        let values = &mut self.work1[0..self.m];
        values.scalarop_from(|r| -r, rho_y);

        // the LDL engine keeps its own permuted copy, so update
        // it first and the unpermuted KKT only if that succeeds
        let index = &self.map.diag_rho_y;
        self.ldlsolver.update_values(index, values)?;
        for (&idx, &v) in zip(index, values.iter()) {
            self.KKT.nzval[idx] = v;
        }

        self.refactor()
    }

    fn method(&self) -> LinSysMethod {
        LinSysMethod::Direct
    }

    fn info(&self) -> &LinSysInfo<T> {
        &self.info
    }

    fn fingerprint(&self) -> &MatrixFingerprint {
        &self.fingerprint
    }
}

fn check_inertia<T: FloatT>(
    ldlsolver: &(dyn DirectLDLSolver<T> + Send),
    n: usize,
) -> Result<(), LinSysError> {
    let found = ldlsolver.positive_inertia();
    if found == n {
        Ok(())
    } else {
        warn!(expected = n, found, "KKT matrix is not quasidefinite");
        Err(LinSysError::Inertia { expected: n, found })
    }
}

//  computes e = b - Kξ, overwriting the first argument
//  and returning its norm

fn _get_refine_error<T: FloatT>(e: &mut [T], b: &[T], K: &CscMatrix<T>, ξ: &[T]) -> T {
    // Note that K is only triu data, so need to
    // be careful when computing the residual here
    e.copy_from(b);
    K.sym().symv(e, ξ, -T::one(), T::one()); //  e = b - Kξ

    e.norm_inf()
}

#[path = "test.rs"]
#[cfg(test)]
mod test;
