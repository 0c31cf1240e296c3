//! KKT linear system backends.
//!
//! Each backend solves the quasidefinite system
//!
//! $$
//! \begin{bmatrix} \rho_x I + P & A^T \\\\ A & -\mathrm{diag}(\rho_y) \end{bmatrix}
//! \begin{bmatrix} x \\\\ y \end{bmatrix} =
//! \begin{bmatrix} b_x \\\\ b_y \end{bmatrix}
//! $$
//!
//! in place, either by direct LDLᵀ factorization of the full matrix or
//! by preconditioned conjugate gradient on the system reduced to `x`.
//! The backend is chosen once from [`LinSysSettings`] and hidden behind
//! [`LinSysWorkspace`].

#![allow(non_snake_case)]

use crate::algebra::*;
use enum_dispatch::*;

pub mod direct;
pub mod indirect;
use direct::DirectLinSys;
use indirect::IndirectLinSys;

mod error;
mod info;
mod regularization;
mod settings;
mod workspace;
pub use error::*;
pub use info::*;
pub use regularization::*;
pub use settings::*;
pub use workspace::*;

/// Identifies the backend behind a workspace

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinSysMethod {
    /// sparse LDLᵀ factorization of the full KKT matrix
    Direct,
    /// preconditioned conjugate gradient on the reduced system
    Indirect,
}

impl LinSysMethod {
    /// Stable short identifier, suitable for logs
    pub const fn name(&self) -> &'static str {
        match self {
            LinSysMethod::Direct => "sparse-direct-qdldl",
            LinSysMethod::Indirect => "sparse-indirect-pcg",
        }
    }
}

impl std::fmt::Display for LinSysMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operations every backend implements.  Arguments reaching these
/// methods have already been checked by [`LinSysWorkspace`].

#[enum_dispatch]
pub trait LinearSystemSolver<T>
where
    T: FloatT,
{
    /// Solves the KKT system with right hand side `b`, overwriting
    /// `b` with the solution.
    fn solve(
        &mut self,
        A: &CscMatrix<T>,
        P: &CscMatrix<T>,
        b: &mut [T],
        warm_start: Option<&[T]>,
        tol: T,
    ) -> LinSysStatus;

    /// Replaces the dual regularizer
    fn update(&mut self, A: &CscMatrix<T>, P: &CscMatrix<T>, rho_y: &[T])
        -> Result<(), LinSysError>;

    fn method(&self) -> LinSysMethod;

    fn info(&self) -> &LinSysInfo<T>;

    /// shape of the data the backend was built from
    fn fingerprint(&self) -> &MatrixFingerprint;
}
