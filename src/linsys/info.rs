use crate::algebra::*;

use super::LinSysMethod;

/// Diagnostics accumulated by a workspace across calls.  Nothing here
/// affects the numerics.

#[derive(Debug, Clone, Default)]
pub struct LinSysInfo<T> {
    /// number of calls to solve
    pub solves: u64,
    /// iterations of the most recent solve (PCG or refinement steps)
    pub last_iterations: u32,
    /// cumulative iterations over all solves
    pub total_iterations: u64,
    /// residual norm at exit of the most recent solve
    pub last_residual: T,
    /// number of numeric factorizations, including the first
    pub factorizations: u64,
    /// nonzeros in the LDL factors (direct backend only)
    pub factor_nnz: usize,
    /// time spent in the most recent solve and cumulatively (seconds)
    pub last_solve_time: f64,
    pub total_solve_time: f64,
    /// time spent building the workspace (seconds)
    pub setup_time: f64,
}

impl<T> LinSysInfo<T>
where
    T: FloatT,
{
    pub(crate) fn record_solve(&mut self, iterations: u32, residual: T, seconds: f64) {
        self.solves += 1;
        self.last_iterations = iterations;
        self.total_iterations += u64::from(iterations);
        self.last_residual = residual;
        self.last_solve_time = seconds;
        self.total_solve_time += seconds;
    }

    /// mean iterations per solve, zero before the first solve
    pub fn average_iterations(&self) -> f64 {
        if self.solves == 0 {
            0.0
        } else {
            self.total_iterations as f64 / self.solves as f64
        }
    }

    /// Short human readable line of backend specific diagnostics
    pub fn summary(&self, method: LinSysMethod) -> String {
        match method {
            LinSysMethod::Direct => format!(
                "{}: factor nnz {}, refactors {}, solves {}",
                method.name(),
                self.factor_nnz,
                self.factorizations.saturating_sub(1),
                self.solves
            ),
            LinSysMethod::Indirect => format!(
                "{}: avg cg iters {:.2}, solves {}, last residual {:.2e}",
                method.name(),
                self.average_iterations(),
                self.solves,
                self.last_residual
            ),
        }
    }
}

#[test]
fn test_info_summary() {
    let mut info = LinSysInfo::<f64>::default();
    assert_eq!(info.average_iterations(), 0.0);

    info.record_solve(4, 1e-9, 0.0);
    info.record_solve(2, 1e-10, 0.0);
    assert_eq!(info.average_iterations(), 3.0);
    assert_eq!(info.total_iterations, 6);
    assert_eq!(info.last_iterations, 2);

    let s = info.summary(LinSysMethod::Indirect);
    assert!(s.starts_with("sparse-indirect-pcg: avg cg iters 3.00"));

    info.factorizations = 3;
    info.factor_nnz = 17;
    let s = info.summary(LinSysMethod::Direct);
    assert_eq!(s, "sparse-direct-qdldl: factor nnz 17, refactors 2, solves 2");
}
