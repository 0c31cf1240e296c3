//! Sparse LDLᵀ factorization for symmetric quasidefinite matrices.
//!
//! The factorization is computed without dynamic pivoting, using a fixed
//! fill-reducing ordering computed once at construction.  The symbolic
//! analysis (ordering, elimination tree and column counts of `L`) is
//! retained so that matrices with unchanged sparsity pattern can be
//! refactored cheaply after a call to
//! [`update_values`](QDLDLFactorisation::update_values).

#![allow(non_snake_case)]

mod qdldl;
pub use qdldl::*;
