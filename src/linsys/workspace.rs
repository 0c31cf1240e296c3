#![allow(non_snake_case)]

use super::*;
use tracing::warn;

/// Dimensions and nonzero counts of the `(A, P)` pair a workspace
/// was built from.  Calls with a pair of a different shape are rejected.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixFingerprint {
    pub m: usize,
    pub n: usize,
    pub nnzA: usize,
    pub nnzP: usize,
}

impl MatrixFingerprint {
    pub fn new<T: FloatT>(A: &CscMatrix<T>, P: &CscMatrix<T>) -> Self {
        Self {
            m: A.m,
            n: A.n,
            nnzA: A.nnz(),
            nnzP: P.nnz(),
        }
    }

    fn matches<T: FloatT>(&self, A: &CscMatrix<T>, P: &CscMatrix<T>) -> bool {
        *self == Self::new(A, P) && P.m == self.n && P.n == self.n
    }
}

/// Workspace for repeated solves of one KKT system.
///
/// Built once per `(A, P)` pair by [`new`](LinSysWorkspace::new), then
/// driven through any sequence of [`solve`](LinSysWorkspace::solve) and
/// [`update`](LinSysWorkspace::update) calls.  The workspace owns all of
/// its derived state and frees it on [`release`](LinSysWorkspace::release)
/// or drop.  It is `Send` but not shared: every call takes `&mut self`.
///
/// ```
/// use qdsys::algebra::CscMatrix;
/// use qdsys::linsys::*;
///
/// let A = CscMatrix::from(&[[1.0]]);
/// let P = CscMatrix::<f64>::spalloc(1, 1, 0);
/// let reg = Regularization::new(1.0, vec![1.0]).unwrap();
/// let settings = LinSysSettings::default();
///
/// let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings).unwrap();
/// let mut b = [2.0, 0.0];
/// assert!(ws.solve(&A, &P, &mut b, None, 1e-10).is_ok());
/// assert!((b[0] - 1.0).abs() < 1e-12 && (b[1] - 1.0).abs() < 1e-12);
/// ws.release();
/// ```

#[enum_dispatch(LinearSystemSolver<T>)]
pub enum LinSysWorkspace<T>
where
    T: FloatT,
{
    DirectLinSys(DirectLinSys<T>),
    IndirectLinSys(IndirectLinSys<T>),
}

impl<T> LinSysWorkspace<T>
where
    T: FloatT,
{
    /// Checks the problem data and builds the backend selected by
    /// `settings`.  `P` may hold its upper triangle only or both
    /// triangles.
    pub fn new(
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        reg: &Regularization<T>,
        settings: &LinSysSettings<T>,
    ) -> Result<Self, LinSysError> {
        settings.validate()?;

        let (m, n) = A.size();
        check_dimension("P rows", n, P.m)?;
        check_dimension("P columns", n, P.n)?;
        check_dimension("rho_y", m, reg.m())?;

        if settings.check_inputs {
            A.check_format()?;
            P.check_format()?;
            if !P.is_triu() && !P.is_symmetric() {
                return Err(SparseFormatError::NotSymmetric.into());
            }
        }

        let ws = match settings.method() {
            LinSysMethod::Direct => DirectLinSys::new(A, P, reg, settings)?.into(),
            LinSysMethod::Indirect => IndirectLinSys::new(A, P, reg, settings)?.into(),
        };
        Ok(ws)
    }

    /// Solves the KKT system in place.  `b` holds `[b_x; b_y]` on entry
    /// and `[x; y]` on exit.  `warm_start` (length `n+m`) seeds the
    /// indirect backend and is ignored by the direct one.  `tol` is the
    /// relative residual target of the indirect backend and must be
    /// positive.
    ///
    /// On [`InvalidInput`](LinSysStatus::InvalidInput) `b` is untouched.
    /// On [`NotConverged`](LinSysStatus::NotConverged) `b` holds the
    /// best available iterate.
    pub fn solve(
        &mut self,
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        b: &mut [T],
        warm_start: Option<&[T]>,
        tol: T,
    ) -> LinSysStatus {
        if let Err(e) = self.check_call(A, P) {
            warn!("solve rejected: {e}");
            return LinSysStatus::InvalidInput;
        }
        let dim = self.fingerprint().m + self.fingerprint().n;
        let bad_ws = warm_start.map_or(false, |ws| ws.len() != dim);
        if b.len() != dim || bad_ws {
            warn!("solve rejected: vector length differs from {dim}");
            return LinSysStatus::InvalidInput;
        }
        if !(tol > T::zero() && tol.is_finite()) {
            warn!("solve rejected: tolerance {tol} is not positive and finite");
            return LinSysStatus::InvalidInput;
        }

        LinearSystemSolver::solve(self, A, P, b, warm_start, tol)
    }

    /// Replaces the dual regularizer and refreshes the derived state.
    /// If the arguments fail validation the workspace is unchanged.  If
    /// a direct refactorization fails, solves report
    /// [`FactorizationFailed`](LinSysStatus::FactorizationFailed) until
    /// a later update succeeds.
    pub fn update(
        &mut self,
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        rho_y: &[T],
    ) -> Result<(), LinSysError> {
        self.check_call(A, P)?;
        check_dimension("rho_y", self.fingerprint().m, rho_y.len())?;
        check_rho_y(rho_y)?;

        LinearSystemSolver::update(self, A, P, rho_y)
    }

    /// Consumes the workspace and frees everything it owns
    pub fn release(self) {}

    /// Stable identifier of the active backend
    pub fn method_name(&self) -> &'static str {
        self.method().name()
    }

    /// One line of backend specific diagnostics
    pub fn summary(&self) -> String {
        self.info().summary(self.method())
    }

    fn check_call(&self, A: &CscMatrix<T>, P: &CscMatrix<T>) -> Result<(), LinSysError> {
        if self.fingerprint().matches(A, P) {
            Ok(())
        } else {
            Err(LinSysError::MatrixMismatch)
        }
    }
}

/// Name of the backend behind an optional workspace, or `None` if
/// there is no workspace.
pub fn method_name_of<T: FloatT>(ws: Option<&LinSysWorkspace<T>>) -> Option<&'static str> {
    ws.map(|ws| ws.method_name())
}

fn check_dimension(what: &'static str, expected: usize, found: usize) -> Result<(), LinSysError> {
    if expected == found {
        Ok(())
    } else {
        Err(LinSysError::IncompatibleDimension {
            what,
            expected,
            found,
        })
    }
}

#[test]
fn test_workspace_is_send() {
    fn assert_send<S: Send>() {}
    assert_send::<LinSysWorkspace<f64>>();
    assert_send::<LinSysWorkspace<f32>>();
}
