use crate::algebra::SparseFormatError;
use crate::qdldl::QDLDLError;
use thiserror::Error;

use super::SettingsError;

/// Error type returned by workspace construction and regularization updates.

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinSysError {
    /// a matrix or vector argument has the wrong size
    #[error("Incompatible dimension for {what}: expected {expected}, found {found}")]
    IncompatibleDimension {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Primal regularizer must be positive and finite")]
    BadPrimalRegularizer,
    #[error("Dual regularizer entry {index} must be positive and finite")]
    BadDualRegularizer { index: usize },
    #[error("Bad matrix format: {0}")]
    SparseFormat(#[from] SparseFormatError),
    #[error("KKT factorization failed: {0}")]
    Factorization(#[from] QDLDLError),
    /// the factored KKT matrix is not quasidefinite
    #[error("KKT matrix has {found} positive pivots, expected {expected}")]
    Inertia { expected: usize, found: usize },
    /// matrices differ from those used to build the workspace
    #[error("Matrix data does not match the data used to build the workspace")]
    MatrixMismatch,
    #[error("Bad settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Status returned by [`solve`](crate::linsys::LinSysWorkspace::solve).
///
/// Failure codes are negative, with more negative values reserved for
/// more severe failures.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinSysStatus {
    /// solution written with the requested accuracy
    Success,
    /// iteration cap reached.  The best iterate is written.
    NotConverged,
    /// the computed solution has non-finite entries
    NumericalError,
    /// no usable factorization is available
    FactorizationFailed,
    /// a dimension or value check on the arguments failed.  Nothing is written.
    InvalidInput,
}

impl LinSysStatus {
    /// integer status code, with zero for success
    pub fn code(&self) -> i32 {
        match self {
            LinSysStatus::Success => 0,
            LinSysStatus::NotConverged => -1,
            LinSysStatus::NumericalError => -2,
            LinSysStatus::FactorizationFailed => -3,
            LinSysStatus::InvalidInput => -4,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, LinSysStatus::Success)
    }
}

impl std::fmt::Display for LinSysStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinSysStatus::Success => "success",
            LinSysStatus::NotConverged => "not converged",
            LinSysStatus::NumericalError => "numerical error",
            LinSysStatus::FactorizationFailed => "factorization failed",
            LinSysStatus::InvalidInput => "invalid input",
        };
        write!(f, "{s}")
    }
}

#[test]
fn test_status_codes_ordered_by_severity() {
    let all = [
        LinSysStatus::Success,
        LinSysStatus::NotConverged,
        LinSysStatus::NumericalError,
        LinSysStatus::FactorizationFailed,
        LinSysStatus::InvalidInput,
    ];
    assert_eq!(all[0].code(), 0);
    assert!(all.windows(2).all(|w| w[0].code() > w[1].code()));
    assert!(all.iter().skip(1).all(|s| !s.is_ok()));
}
