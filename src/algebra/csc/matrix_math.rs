use crate::algebra::*;
use std::iter::zip;

impl<T: FloatT> MatrixVectorMultiply for CscMatrix<T> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_N(self, y, x, a, b);
    }
}

impl<T: FloatT> MatrixVectorMultiply for Adjoint<'_, CscMatrix<T>> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_T(self.src, y, x, a, b);
    }
}

impl<T: FloatT> SymMatrixVectorMultiply for Symmetric<'_, CscMatrix<T>> {
    type T = T;

    fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_symv(self.src, y, x, a, b);
    }
}

impl<T: FloatT> CscMatrix<T> {
    /// Writes the diagonal of a square matrix into `diag`, with zeros
    /// for structurally missing entries.
    pub fn diagonal(&self, diag: &mut [T]) {
        assert!(self.is_square());
        assert_eq!(diag.len(), self.n);

        diag.fill(T::zero());
        for (col, d) in diag.iter_mut().enumerate() {
            for k in self.colptr[col]..self.colptr[col + 1] {
                if self.rowval[k] == col {
                    *d += self.nzval[k];
                }
            }
        }
    }

    /// Computes weighted column sums of squares, i.e.
    /// `out[j] = Σᵢ w[i]·A[i,j]²`.
    pub fn col_sumsq_weighted(&self, out: &mut [T], w: &[T]) {
        assert_eq!(out.len(), self.n);
        assert_eq!(w.len(), self.m);

        for (col, v) in out.iter_mut().enumerate() {
            let rng = self.colptr[col]..self.colptr[col + 1];
            *v = zip(&self.rowval[rng.clone()], &self.nzval[rng])
                .fold(T::zero(), |acc, (&row, &Aij)| acc + w[row] * Aij * Aij);
        }
    }
}

// y = a*A*x + b*y for A holding the triu part of a symmetric matrix
#[allow(non_snake_case)]
fn _csc_symv<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    _scale_y(y, b);

    assert!(x.len() == A.n);
    assert!(y.len() == A.n);
    assert!(A.n == A.m);

    for (col, &xcol) in x.iter().enumerate() {
        let first = A.colptr[col];
        let last = A.colptr[col + 1];
        let rows = &A.rowval[first..last];
        let nzvals = &A.nzval[first..last];

        for (&row, &Aij) in zip(rows, nzvals) {
            y[row] += a * Aij * xcol;

            if row != col {
                //don't double up on the diagonal
                y[col] += a * Aij * x[row];
            }
        }
    }
}

// the b*y part of y = a*A*x + b*y, with the common cases short circuited
fn _scale_y<T: FloatT>(y: &mut [T], b: T) {
    if b == T::zero() {
        y.fill(T::zero());
    } else if b == T::one() {
    } else if b == -T::one() {
        y.negate();
    } else {
        y.scale(b);
    }
}

// sparse matrix-vector multiply, no transpose
#[allow(non_snake_case)]
fn _csc_axpby_N<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.n);
    assert_eq!(y.len(), A.m);

    _scale_y(y, b);

    // if a is zero, we're done
    if a == T::zero() {
        return;
    }

    //y += a*A*x
    for (j, &xj) in x.iter().enumerate() {
        let axj = a * xj;
        for i in A.colptr[j]..A.colptr[j + 1] {
            y[A.rowval[i]] += A.nzval[i] * axj;
        }
    }
}

// sparse matrix-vector multiply, transposed
#[allow(non_snake_case)]
fn _csc_axpby_T<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.m);
    assert_eq!(y.len(), A.n);

    _scale_y(y, b);

    // if a is zero, we're done
    if a == T::zero() {
        return;
    }

    //y += a*A'*x
    for (j, yj) in y.iter_mut().enumerate() {
        let rng = A.colptr[j]..A.colptr[j + 1];
        let s = zip(&A.rowval[rng.clone()], &A.nzval[rng])
            .fold(T::zero(), |acc, (&row, &Aij)| acc + Aij * x[row]);
        *yj += a * s;
    }
}
