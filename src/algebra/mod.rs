//! Sparse linear algebra used by the linear system backends.
//!
//! Matrices are held in compressed sparse column format via [`CscMatrix`].
//! Products with a matrix, its transpose and its symmetric (triu stored)
//! view go through the [`MatrixVectorMultiply`] and [`SymMatrixVectorMultiply`]
//! traits, and all dense vector arithmetic goes through [`VectorMath`],
//! implemented on slices of [`FloatT`].

mod csc;
mod error_types;
mod floats;
mod math_traits;
mod matrix_traits;
mod matrix_types;
mod vecmath;

pub use error_types::*;
pub use floats::*;
pub use math_traits::*;
pub use matrix_traits::*;
pub use matrix_types::*;
