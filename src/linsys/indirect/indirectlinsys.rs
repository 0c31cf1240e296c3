#![allow(non_snake_case)]

use super::*;
use crate::algebra::*;
use crate::linsys::*;
use std::time::Instant;
use tracing::{debug, trace, warn};

// -------------------------------------
// KKT linear system solved by PCG on the reduced system
// -------------------------------------

/// Indirect backend.  Keeps only vectors: the dual regularizer and its
/// reciprocal, the Jacobi preconditioner and the PCG scratch space.
/// The problem data is read from the arguments of each call.

pub struct IndirectLinSys<T> {
    n: usize,

    rho_x: T,
    rho_y: Vec<T>,
    rho_y_inv: Vec<T>,

    precond: JacobiPreconditioner<T>,

    // reduced right hand side and iterate.  x holds the
    // previous solution between calls
    rhs: Vec<T>,
    x: Vec<T>,
    has_prev: bool,

    // length m scratch for products with A
    work_m: Vec<T>,
    diag: Vec<T>,
    pcg_work: PcgWork<T>,

    max_iter: usize,
    warm_start_from_previous: bool,
    fingerprint: MatrixFingerprint,

    // values of A and P at setup, kept only when inputs are checked
    nzvals: Option<(Vec<T>, Vec<T>)>,
    info: LinSysInfo<T>,
}

impl<T> IndirectLinSys<T>
where
    T: FloatT,
{
    /// Builds the preconditioner for the initial regularization.
    /// Arguments are assumed to have passed the dimension checks in
    /// [`LinSysWorkspace::new`].
    pub fn new(
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        reg: &Regularization<T>,
        settings: &LinSysSettings<T>,
    ) -> Result<Self, LinSysError> {
        let timer = Instant::now();
        let (m, n) = A.size();

        let max_iter = match settings.cg_max_iter {
            0 => usize::max(10 * n, 20),
            k => k as usize,
        };

        let rho_y = reg.rho_y().to_vec();
        let mut rho_y_inv = rho_y.clone();
        rho_y_inv.recip();

        let mut ls = Self {
            n,
            rho_x: reg.rho_x(),
            rho_y,
            rho_y_inv,
            precond: JacobiPreconditioner::new(n, settings.cg_preconditioner_enable),
            rhs: vec![T::zero(); n],
            x: vec![T::zero(); n],
            has_prev: false,
            work_m: vec![T::zero(); m],
            diag: vec![T::zero(); n],
            pcg_work: PcgWork::new(n),
            max_iter,
            warm_start_from_previous: settings.warm_start_from_previous,
            fingerprint: MatrixFingerprint::new(A, P),
            nzvals: settings
                .check_inputs
                .then(|| (A.nzval.clone(), P.nzval.clone())),
            info: LinSysInfo::default(),
        };
        ls.update_preconditioner(A, P);
        ls.info.setup_time = timer.elapsed().as_secs_f64();

        debug!(
            n,
            m,
            max_iter,
            preconditioner = settings.cg_preconditioner_enable,
            seconds = ls.info.setup_time,
            "indirect KKT solver initialized"
        );

        Ok(ls)
    }

    /// Current dual regularizer
    pub fn rho_y(&self) -> &[T] {
        &self.rho_y
    }

    /// Iteration cap applied to every solve
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    fn data_matches(&self, A: &CscMatrix<T>, P: &CscMatrix<T>) -> bool {
        match &self.nzvals {
            Some((Anzval, Pnzval)) => A.nzval == *Anzval && P.nzval == *Pnzval,
            None => true,
        }
    }

    fn update_preconditioner(&mut self, A: &CscMatrix<T>, P: &CscMatrix<T>) {
        let op = ReducedKKTOperator {
            A,
            P,
            P_is_triu: P.is_triu(),
            rho_x: self.rho_x,
            rho_y_inv: &self.rho_y_inv,
        };
        op.diagonal(&mut self.diag);
        self.precond.update(&self.diag);
    }
}

impl<T> LinearSystemSolver<T> for IndirectLinSys<T>
where
    T: FloatT,
{
    fn solve(
        &mut self,
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        b: &mut [T],
        warm_start: Option<&[T]>,
        tol: T,
    ) -> LinSysStatus {
        let timer = Instant::now();
        let n = self.n;

        let Self {
            rho_x,
            rho_y_inv,
            precond,
            rhs,
            x,
            has_prev,
            work_m,
            pcg_work,
            max_iter,
            warm_start_from_previous,
            info,
            ..
        } = self;

        let threshold = tol * T::max(T::one(), b.norm());

        // rhs = b_x + Aᵀ R⁻¹ b_y
        let (bx, by) = b.split_at_mut(n);
        work_m.copy_from(by).hadamard(rho_y_inv);
        rhs.copy_from(bx);
        A.t().gemv(rhs, work_m, T::one(), T::one());

        // initial iterate
        match warm_start {
            Some(ws) => {
                x.copy_from(&ws[..n]);
            }
            None if *warm_start_from_previous && *has_prev => {}
            None => {
                x.set(T::zero());
            }
        }

        let op = ReducedKKTOperator {
            A,
            P,
            P_is_triu: P.is_triu(),
            rho_x: *rho_x,
            rho_y_inv,
        };

        let result = pcg(
            |y: &mut [T], v: &[T]| op.apply(y, v, work_m),
            |z: &mut [T], r: &[T]| precond.apply(z, r),
            x,
            rhs,
            threshold,
            *max_iter,
            pcg_work,
        );

        info.record_solve(
            result.iterations,
            result.residual,
            timer.elapsed().as_secs_f64(),
        );

        if !x.is_finite() {
            warn!("indirect solve produced non-finite values");
            *has_prev = false;
            return LinSysStatus::NumericalError;
        }
        *has_prev = true;

        // y = R⁻¹(A x - b_y)
        work_m.copy_from(by);
        A.gemv(work_m, x, T::one(), -T::one());
        work_m.hadamard(rho_y_inv);

        bx.copy_from(x);
        by.copy_from(work_m);

        trace!(
            iterations = result.iterations,
            residual = %result.residual,
            "indirect solve"
        );

        if result.converged {
            LinSysStatus::Success
        } else {
            warn!(
                iterations = result.iterations,
                residual = %result.residual,
                threshold = %threshold,
                "PCG reached its iteration cap"
            );
            LinSysStatus::NotConverged
        }
    }

    fn update(
        &mut self,
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        rho_y: &[T],
    ) -> Result<(), LinSysError> {
        if !self.data_matches(A, P) {
            return Err(LinSysError::MatrixMismatch);
        }
        self.rho_y.copy_from(rho_y);
        self.rho_y_inv.scalarop_from(T::recip, rho_y);
        self.update_preconditioner(A, P);
        Ok(())
    }

    fn method(&self) -> LinSysMethod {
        LinSysMethod::Indirect
    }

    fn info(&self) -> &LinSysInfo<T> {
        &self.info
    }

    fn fingerprint(&self) -> &MatrixFingerprint {
        &self.fingerprint
    }
}
