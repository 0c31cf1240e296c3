//! Preconditioned conjugate gradient for symmetric positive definite
//! operators.
//!
//! ```text
//! r = rhs - M x
//! z = P⁻¹ r,  p = z,  rz = r·z
//! loop:
//!     α = rz / p·Mp
//!     x += α p,  r -= α Mp
//!     stop if ‖r‖ ≤ threshold
//!     z = P⁻¹ r,  β = r·z / rz,  p = z + β p
//! ```
//!
//! The recurrence residual drifts from the true one in long runs, so
//! convergence is confirmed against `rhs - M x` before returning, and
//! the iteration restarts from the true residual if the check fails.

use crate::algebra::*;
use tracing::{trace, warn};

/// Scratch vectors for [`pcg`], all of length `n`

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct PcgWork<T> {
    r: Vec<T>,
    z: Vec<T>,
    p: Vec<T>,
    Mp: Vec<T>,
    x_best: Vec<T>,
}

impl<T> PcgWork<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            r: vec![T::zero(); n],
            z: vec![T::zero(); n],
            p: vec![T::zero(); n],
            Mp: vec![T::zero(); n],
            x_best: vec![T::zero(); n],
        }
    }
}

/// Outcome of a [`pcg`] run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcgResult<T> {
    pub iterations: u32,
    /// 2-norm of `rhs - M x` for the returned `x`
    pub residual: T,
    pub converged: bool,
}

/// Runs PCG from the initial iterate in `x` until the residual 2-norm
/// is at most `threshold` or `max_iter` iterations have run.  On
/// exhaustion `x` holds the iterate with the smallest residual seen.
///
/// `op(y, x)` must compute `y = M x` and `precond(z, r)` must compute
/// `z = P⁻¹ r` for a positive definite `P`.
#[allow(non_snake_case)]
pub fn pcg<T, Op, Pre>(
    mut op: Op,
    precond: Pre,
    x: &mut [T],
    rhs: &[T],
    threshold: T,
    max_iter: usize,
    work: &mut PcgWork<T>,
) -> PcgResult<T>
where
    T: FloatT,
    Op: FnMut(&mut [T], &[T]),
    Pre: Fn(&mut [T], &[T]),
{
    let PcgWork { r, z, p, Mp, x_best } = work;

    let mut res = true_residual(&mut op, r, Mp, x, rhs);
    if res <= threshold {
        return PcgResult {
            iterations: 0,
            residual: res,
            converged: true,
        };
    }

    let mut best_res = res;
    x_best.copy_from(x);

    precond(z, r);
    p.copy_from(z);
    let mut rz = r.dot(z);
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=max_iter {
        iterations = k;

        op(Mp, p);
        let pMp = p.dot(Mp);
        if !(pMp > T::zero() && pMp.is_finite()) {
            warn!("PCG breakdown: p·Mp = {pMp:e} at iteration {k}");
            break;
        }

        let alpha = rz / pMp;
        x.axpby(alpha, p, T::one());
        r.axpby(-alpha, Mp, T::one());
        res = r.norm();

        trace!(iteration = k, residual = %res, "PCG");

        if res <= threshold {
            res = true_residual(&mut op, r, Mp, x, rhs);
            if res <= threshold {
                best_res = res;
                converged = true;
                break;
            }
            // drifted.  Restart from the true residual
            precond(z, r);
            p.copy_from(z);
            rz = r.dot(z);
            if res < best_res {
                best_res = res;
                x_best.copy_from(x);
            }
            continue;
        }

        if res < best_res {
            best_res = res;
            x_best.copy_from(x);
        }

        precond(z, r);
        let rz_new = r.dot(z);
        let beta = rz_new / rz;
        p.axpby(T::one(), z, beta);
        rz = rz_new;
    }

    if !converged {
        x.copy_from(x_best);
    }

    PcgResult {
        iterations: iterations as u32,
        residual: best_res,
        converged,
    }
}

// r = rhs - M x, returning ‖r‖₂
#[allow(non_snake_case)]
fn true_residual<T, Op>(op: &mut Op, r: &mut [T], Mp: &mut [T], x: &[T], rhs: &[T]) -> T
where
    T: FloatT,
    Op: FnMut(&mut [T], &[T]),
{
    op(Mp, x);
    r.waxpby(T::one(), rhs, -T::one(), Mp);
    r.norm()
}
