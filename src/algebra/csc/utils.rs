//---------------------------------------------------------
// low-level internal utilities for counting / filling entries
// in block partitioned sparse matrices.  The pattern is always
// two passes: first count entries per column into colptr, then
// convert the counts to offsets and fill, using colptr as the
// "next free slot" marker for each column.
//---------------------------------------------------------

use crate::algebra::{CscMatrix, FloatT, MatrixShape};

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    // true if column `col` of the triu matrix M has no entry on the
    // diagonal.  Rows are sorted, so the diagonal comes last.
    fn missing_diag(M: &CscMatrix<T>, col: usize) -> bool {
        let (first, last) = (M.colptr[col], M.colptr[col + 1]);
        first == last || M.rowval[last - 1] != col
    }

    // increment the self.colptr by the number of nonzeros in a
    // square diagonal matrix placed on the diagonal.
    pub(crate) fn colcount_diag(&mut self, initcol: usize, blockcols: usize) {
        let cols = self.colptr[initcol..(initcol + blockcols)].iter_mut();
        cols.for_each(|x| *x += 1);
    }

    // same as colcount_diag, but counts only places where the input
    // matrix M has a missing diagonal entry.  M must be square and TRIU
    pub(crate) fn colcount_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        assert_eq!(M.colptr.len(), M.n + 1);
        assert!(self.colptr.len() >= M.n + initcol);

        for i in 0..M.n {
            if Self::missing_diag(M, i) {
                self.colptr[i + initcol] += 1;
            }
        }
    }

    // increment the self.colptr by the number of nonzeros in M
    pub(crate) fn colcount_block(&mut self, M: &CscMatrix<T>, initcol: usize, shape: MatrixShape) {
        match shape {
            MatrixShape::T => {
                for row in M.rowval.iter() {
                    self.colptr[initcol + row] += 1;
                }
            }
            MatrixShape::N => {
                for i in 0..M.n {
                    self.colptr[initcol + i] += M.colptr[i + 1] - M.colptr[i];
                }
            }
        }
    }

    // populate values from M using the self.colptr as indicator of
    // next fill location in each column.   The destination of each
    // entry of M is recorded in MtoKKT.
    pub(crate) fn fill_block(
        &mut self,
        M: &CscMatrix<T>,
        MtoKKT: &mut [usize],
        initrow: usize,
        initcol: usize,
        shape: MatrixShape,
    ) {
        assert_eq!(MtoKKT.len(), M.nnz());

        for i in 0..M.n {
            for k in M.colptr[i]..M.colptr[i + 1] {
                let (row, col) = match shape {
                    MatrixShape::T => (i + initrow, M.rowval[k] + initcol),
                    MatrixShape::N => (M.rowval[k] + initrow, i + initcol),
                };

                let dest = self.colptr[col];
                self.rowval[dest] = row;
                self.nzval[dest] = M.nzval[k];
                self.colptr[col] += 1;
                MtoKKT[k] = dest;
            }
        }
    }

    // Populate the diagonal with 0s using the colptr as indicator of
    // next fill location in each column
    pub(crate) fn fill_diag(&mut self, diagtoKKT: &mut [usize], offset: usize, blockdim: usize) {
        for (i, col) in (offset..(offset + blockdim)).enumerate() {
            let dest = self.colptr[col];
            self.rowval[dest] = col;
            self.nzval[dest] = T::zero(); //structural zero
            self.colptr[col] += 1;
            diagtoKKT[i] = dest;
        }
    }

    // same as fill_diag, but only places zero entries where the input
    // matrix M has a missing diagonal entry.  M must be square and TRIU
    pub(crate) fn fill_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        for i in 0..M.n {
            if Self::missing_diag(M, i) {
                let col = i + initcol;
                let dest = self.colptr[col];
                self.rowval[dest] = col;
                self.nzval[dest] = T::zero(); //structural zero
                self.colptr[col] += 1;
            }
        }
    }

    // convert per-column counts in colptr into starting offsets
    pub(crate) fn colcount_to_colptr(&mut self) {
        let mut currentptr = 0;
        for p in &mut self.colptr {
            let count = *p;
            *p = currentptr;
            currentptr += count;
        }
    }

    // after filling, colptr[i] holds the start of column i+1, so
    // shift everything right by one to recover the true colptr
    pub(crate) fn backshift_colptrs(&mut self) {
        self.colptr.rotate_right(1);
        self.colptr[0] = 0;
    }
}
