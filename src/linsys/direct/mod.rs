//! Direct backend.  Factors the full quasidefinite KKT matrix once and
//! refactors it numerically whenever the dual regularizer changes.

use crate::algebra::*;
use crate::qdldl::QDLDLError;

//ldl linear solvers kept in a submodule (not flattened)
pub mod ldlsolvers;

//flatten direct KKT module structure
mod datamap;
mod directlinsys;
mod kkt_assembly;
use datamap::*;
pub use directlinsys::*;
use kkt_assembly::*;

/// Interface to an LDLᵀ factorization engine for the triu KKT matrix

pub trait DirectLDLSolver<T: FloatT> {
    /// overwrite entries of the factored matrix, indexed by position
    /// in the nonzeros of the KKT matrix passed at construction
    fn update_values(&mut self, index: &[usize], values: &[T]) -> Result<(), QDLDLError>;
    /// solve with the current factors
    fn solve(&mut self, x: &mut [T], b: &[T]);
    /// numeric refactorization.  `kkt` is the current unpermuted matrix
    fn refactor(&mut self, kkt: &CscMatrix<T>) -> Result<(), QDLDLError>;
    /// number of positive pivots in the current factors
    fn positive_inertia(&self) -> usize;
    /// nonzeros in the current factors
    fn nnz_factors(&self) -> usize;
}

// Send allows workspaces to be moved to worker threads
pub type BoxedDirectLDLSolver<T> = Box<dyn DirectLDLSolver<T> + Send>;
