//! __qdsys__ provides the linear system layer of an operator splitting
//! conic solver.  Each iteration of such a solver requires the solution
//! of a quasidefinite KKT system
//!
//! $$
//! \begin{bmatrix} \rho_x I + P & A^\top \\\\ A & -\text{diag}(\rho_y) \end{bmatrix}
//! \begin{bmatrix} x \\\\ y \end{bmatrix} =
//! \begin{bmatrix} b_x \\\\ b_y \end{bmatrix}
//! $$
//!
//! with data matrices
//! $P=P^\top \succeq 0$ ($n \times n$) and
//! $A \in \mathbb{R}^{m \times n}$, a primal regularizer $\rho_x > 0$
//! and a dual regularizer $\rho_y \in \mathbb{R}^m_{++}$.  The matrix
//! data is fixed for the life of a workspace while $\rho_y$ may change
//! between solves.
//!
//! ## Backends
//!
//! * __Direct__: a sparse $LDL^\top$ factorization of the full KKT matrix
//!   with an AMD fill reducing ordering, computed once symbolically and
//!   refactored numerically whenever $\rho_y$ changes.  See [`qdldl`].
//!
//! * __Indirect__: Jacobi preconditioned conjugate gradient on the
//!   reduced system $(\rho_x I + P + A^\top \text{diag}(\rho_y)^{-1} A)\\,x = r$,
//!   applied matrix free.
//!
//! Both are driven through [`linsys::LinSysWorkspace`].
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

//Rust hates greek characters
#![allow(confusable_idents)]

pub mod algebra;
pub mod linsys;
pub mod qdldl;
