//! Indirect backend.  Eliminates `y` from the KKT system and solves
//! the reduced positive definite system for `x` with Jacobi
//! preconditioned conjugate gradient, never forming the reduced
//! matrix explicitly.

mod indirectlinsys;
mod operator;
mod pcg;
mod preconditioner;

pub use indirectlinsys::*;
pub use operator::*;
pub use pcg::*;
pub use preconditioner::*;
