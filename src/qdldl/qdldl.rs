use crate::algebra::*;
use derive_builder::Builder;
use std::cmp::{max, min};
use std::iter::zip;
use thiserror::Error;

/// Error codes returnable from [`QDLDLFactorisation`] operations

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QDLDLError {
    #[error("Matrix is not square")]
    NotSquare,
    #[error("Matrix has an empty column")]
    EmptyColumn,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Factorization produced a zero pivot in column {0}")]
    ZeroPivot(usize),
    #[error("Invalid permutation vector")]
    InvalidPermutation,
    #[error("Fill-reducing ordering could not be computed")]
    OrderingFailed,
    #[error("Value update does not match the factored sparsity pattern")]
    IncompatibleUpdate,
}

/// Settings for [`QDLDLFactorisation`]

#[derive(Builder, Debug, Clone)]
pub struct QDLDLSettings<T: FloatT> {
    /// scaling of the AMD dense row threshold
    #[builder(default = "1.5")]
    pub amd_dense_scale: f64,
    /// user supplied ordering.  AMD is used if `None`
    #[builder(default = "None", setter(strip_option))]
    pub perm: Option<Vec<usize>>,
    /// expected signs of the pivots, used only when regularizing
    #[builder(default = "None", setter(strip_option))]
    pub Dsigns: Option<Vec<i8>>,
    #[builder(default = "false")]
    pub regularize_enable: bool,
    #[builder(default = "(1e-13).as_T()")]
    pub regularize_eps: T,
    #[builder(default = "(2e-7).as_T()")]
    pub regularize_delta: T,
}

impl<T> Default for QDLDLSettings<T>
where
    T: FloatT,
{
    fn default() -> QDLDLSettings<T> {
        QDLDLSettingsBuilder::<T>::default().build().unwrap()
    }
}

/// $LDL^T$ factorization of a symmetric quasidefinite matrix, i.e.
/// $PAP^T = (I+L)D(I+L)^T$ for a fill-reducing permutation $P$.

#[derive(Debug)]
pub struct QDLDLFactorisation<T = f64> {
    /// fill-reducing permutation.  Position `k` of the factored
    /// matrix holds row/column `perm[k]` of the input.
    pub perm: Vec<usize>,
    /// strictly lower triangular factor
    pub L: CscMatrix<T>,
    /// diagonal factor and its inverse
    pub D: Vec<T>,
    pub Dinv: Vec<T>,
    workspace: QDLDLWorkspace<T>,
}

impl<T> QDLDLFactorisation<T>
where
    T: FloatT,
{
    /// Computes the ordering, the symbolic analysis and a first
    /// numeric factorization of the triu matrix `Ain`.
    pub fn new(Ain: &CscMatrix<T>, opts: Option<QDLDLSettings<T>>) -> Result<Self, QDLDLError> {
        check_structure(Ain)?;

        let opts = opts.unwrap_or_default();
        let n = Ain.n;

        let (perm, iperm) = match opts.perm {
            Some(perm) => {
                let iperm = _invperm(&perm)?;
                (perm, iperm)
            }
            None => _get_amd_ordering(Ain, opts.amd_dense_scale)?,
        };

        let (triuA, AtoPAPt) = _permute_symmetric(Ain, &iperm);

        let mut Dsigns = vec![1_i8; n];
        if let Some(ds) = opts.Dsigns {
            if ds.len() != n {
                return Err(QDLDLError::IncompatibleUpdate);
            }
            _permute(&mut Dsigns, &ds, &perm);
        }

        let regularizer = opts
            .regularize_enable
            .then_some((opts.regularize_eps, opts.regularize_delta));

        let mut workspace = QDLDLWorkspace::new(triuA, AtoPAPt, Dsigns, regularizer);

        let nnzL = workspace.Lnz.iter().sum();
        let mut L = CscMatrix::spalloc(n, n, nnzL);
        let mut D = vec![T::zero(); n];
        let mut Dinv = vec![T::zero(); n];

        workspace.factor(&mut L, &mut D, &mut Dinv)?;

        Ok(Self {
            perm,
            L,
            D,
            Dinv,
            workspace,
        })
    }

    /// Number of strictly positive entries in `D`
    pub fn positive_inertia(&self) -> usize {
        self.workspace.positive_inertia
    }

    /// Number of nonzeros in the factors, counting the unit diagonal of `L`
    pub fn nnz_factors(&self) -> usize {
        self.L.nnz() + self.D.len()
    }

    /// Solves `Ax = b` using the current factors, with `x` replacing `b`.
    pub fn solve(&mut self, b: &mut [T]) {
        assert_eq!(b.len(), self.D.len());

        let x = &mut self.workspace.sol;
        _permute(x, b, &self.perm);
        _solve(&self.L.colptr, &self.L.rowval, &self.L.nzval, &self.Dinv, x);
        _ipermute(b, x, &self.perm);
    }

    /// Overwrites entries of the factored matrix.  `indices` index the
    /// nonzeros of the triu matrix originally passed to
    /// [`new`](QDLDLFactorisation::new).  Takes effect at the next
    /// [`refactor`](QDLDLFactorisation::refactor).
    pub fn update_values(&mut self, indices: &[usize], values: &[T]) -> Result<(), QDLDLError> {
        let map = &self.workspace.AtoPAPt;
        if indices.len() != values.len() || indices.iter().any(|&i| i >= map.len()) {
            return Err(QDLDLError::IncompatibleUpdate);
        }

        let nzval = &mut self.workspace.triuA.nzval;
        for (&idx, &v) in zip(indices, values) {
            nzval[map[idx]] = v;
        }
        Ok(())
    }

    /// Numeric refactorization reusing the symbolic analysis.
    pub fn refactor(&mut self) -> Result<(), QDLDLError> {
        self.workspace
            .factor(&mut self.L, &mut self.D, &mut self.Dinv)
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), QDLDLError> {
    if !A.is_square() {
        return Err(QDLDLError::NotSquare);
    }
    if !A.is_triu() {
        return Err(QDLDLError::NotUpperTriangular);
    }
    //every column needs at least its diagonal
    if A.colptr.windows(2).any(|c| c[0] == c[1]) {
        return Err(QDLDLError::EmptyColumn);
    }
    Ok(())
}

const NO_PARENT: usize = usize::MAX;

#[derive(Debug)]
struct QDLDLWorkspace<T> {
    // symbolic analysis
    etree: Vec<usize>,
    Lnz: Vec<usize>,

    // numeric factorization scratch
    y_markers: Vec<bool>,
    y_idx: Vec<usize>,
    y_vals: Vec<T>,
    elim_buffer: Vec<usize>,
    next_colspace: Vec<usize>,

    // solve scratch
    sol: Vec<T>,

    // the permuted triu matrix being factored, and a map
    // from input nonzeros to its nonzeros
    triuA: CscMatrix<T>,
    AtoPAPt: Vec<usize>,

    // pivot signs and (eps, delta) when regularizing
    Dsigns: Vec<i8>,
    regularizer: Option<(T, T)>,

    positive_inertia: usize,
}

impl<T> QDLDLWorkspace<T>
where
    T: FloatT,
{
    fn new(
        triuA: CscMatrix<T>,
        AtoPAPt: Vec<usize>,
        Dsigns: Vec<i8>,
        regularizer: Option<(T, T)>,
    ) -> Self {
        let n = triuA.n;
        let mut etree = vec![NO_PARENT; n];
        let mut Lnz = vec![0; n];
        let mut work = vec![0; n];
        _etree(&triuA.colptr, &triuA.rowval, &mut work, &mut Lnz, &mut etree);

        Self {
            etree,
            Lnz,
            y_markers: vec![false; n],
            y_idx: vec![0; n],
            y_vals: vec![T::zero(); n],
            elim_buffer: vec![0; n],
            next_colspace: vec![0; n],
            sol: vec![T::zero(); n],
            triuA,
            AtoPAPt,
            Dsigns,
            regularizer,
            positive_inertia: 0,
        }
    }

    // Up-looking numeric factorization.  Row k of L is the solution
    // of a sparse triangular system whose nonzero pattern is the
    // reach of column k of A in the elimination tree.
    fn factor(&mut self, L: &mut CscMatrix<T>, D: &mut [T], Dinv: &mut [T]) -> Result<(), QDLDLError> {
        let Self {
            etree,
            Lnz,
            y_markers,
            y_idx,
            y_vals,
            elim_buffer,
            next_colspace,
            triuA: A,
            Dsigns,
            regularizer,
            positive_inertia,
            ..
        } = self;

        let n = A.n;

        L.colptr[0] = 0;
        for k in 0..n {
            L.colptr[k + 1] = L.colptr[k] + Lnz[k];
        }
        next_colspace.copy_from_slice(&L.colptr[0..n]);

        y_markers.fill(false);
        y_vals.fill(T::zero());
        D.fill(T::zero());
        *positive_inertia = 0;

        for k in 0..n {
            let mut nnz_y = 0;

            // scatter column k of A into y and collect the
            // nonzero pattern of row k of L in topological order
            for p in A.colptr[k]..A.colptr[k + 1] {
                let row = A.rowval[p];
                if row == k {
                    D[k] = A.nzval[p];
                    continue;
                }
                y_vals[row] = A.nzval[p];

                let mut len = 0;
                let mut node = row;
                while node != NO_PARENT && node < k && !y_markers[node] {
                    y_markers[node] = true;
                    elim_buffer[len] = node;
                    len += 1;
                    node = etree[node];
                }
                for &node in elim_buffer[0..len].iter().rev() {
                    y_idx[nnz_y] = node;
                    nnz_y += 1;
                }
            }

            for &col in y_idx[0..nnz_y].iter().rev() {
                let ycol = y_vals[col];
                let dest = next_colspace[col];

                for p in L.colptr[col]..dest {
                    y_vals[L.rowval[p]] -= L.nzval[p] * ycol;
                }

                let Lkc = ycol * Dinv[col];
                L.rowval[dest] = k;
                L.nzval[dest] = Lkc;
                D[k] -= ycol * Lkc;

                next_colspace[col] += 1;
                y_vals[col] = T::zero();
                y_markers[col] = false;
            }

            if let Some((eps, delta)) = *regularizer {
                let sign = if Dsigns[k] < 0 { -T::one() } else { T::one() };
                if D[k] * sign < eps {
                    D[k] = delta * sign;
                }
            }

            if D[k] == T::zero() || !D[k].is_finite() {
                return Err(QDLDLError::ZeroPivot(k));
            }
            if D[k] > T::zero() {
                *positive_inertia += 1;
            }
            Dinv[k] = T::recip(D[k]);
        }

        Ok(())
    }
}

// Elimination tree and column counts of L for a triu matrix.
// Returns the total number of nonzeros in L.
fn _etree(Ap: &[usize], Ai: &[usize], work: &mut [usize], Lnz: &mut [usize], etree: &mut [usize]) -> usize {
    let n = etree.len();
    etree.fill(NO_PARENT);
    Lnz.fill(0);

    for j in 0..n {
        work[j] = j;
        for &row in &Ai[Ap[j]..Ap[j + 1]] {
            let mut i = row;
            while work[i] != j {
                if etree[i] == NO_PARENT {
                    etree[i] = j;
                }
                Lnz[i] += 1;
                work[i] = j;
                i = etree[i];
            }
        }
    }
    Lnz.iter().sum()
}

// Solves (I+L)x = b in place
fn _lsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        let rng = Lp[i]..Lp[i + 1];
        for (&row, &v) in zip(&Li[rng.clone()], &Lx[rng]) {
            x[row] -= v * xi;
        }
    }
}

// Solves (I+L)ᵀx = b in place
fn _ltsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let rng = Lp[i]..Lp[i + 1];
        let s = zip(&Li[rng.clone()], &Lx[rng]).fold(T::zero(), |acc, (&row, &v)| acc + v * x[row]);
        x[i] -= s;
    }
}

// Solves (I+L)D(I+L)ᵀx = b in place
fn _solve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], Dinv: &[T], b: &mut [T]) {
    _lsolve(Lp, Li, Lx, b);
    b.hadamard(Dinv);
    _ltsolve(Lp, Li, Lx, b);
}

fn _invperm(p: &[usize]) -> Result<Vec<usize>, QDLDLError> {
    let n = p.len();
    let mut ip = vec![NO_PARENT; n];
    for (i, &j) in p.iter().enumerate() {
        if j >= n || ip[j] != NO_PARENT {
            return Err(QDLDLError::InvalidPermutation);
        }
        ip[j] = i;
    }
    Ok(ip)
}

// x = b[p]
fn _permute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(x, p).for_each(|(x, &p)| *x = b[p]);
}

// x[p] = b
fn _ipermute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(b, p).for_each(|(&b, &p)| x[p] = b);
}

// Symmetric permutation PAPᵀ of a triu matrix, returned again as triu,
// along with the position of each input nonzero in the output.  Row
// indices within output columns are not necessarily sorted.
fn _permute_symmetric<T: FloatT>(A: &CscMatrix<T>, iperm: &[usize]) -> (CscMatrix<T>, Vec<usize>) {
    let n = A.n;
    let mut P = CscMatrix::<T>::spalloc(n, n, A.nnz());
    let mut AtoPAPt = vec![0; A.nnz()];

    // entry (i,j) of A lands in column max(iperm[i],iperm[j]) of P
    let target_col = |row: usize, col: usize| max(iperm[row], iperm[col]);

    let mut counts = vec![0usize; n];
    for col in 0..n {
        for &row in &A.rowval[A.colptr[col]..A.colptr[col + 1]] {
            counts[target_col(row, col)] += 1;
        }
    }
    for k in 0..n {
        P.colptr[k + 1] = P.colptr[k] + counts[k];
    }

    let mut next = P.colptr[0..n].to_vec();
    for col in 0..n {
        for p in A.colptr[col]..A.colptr[col + 1] {
            let row = A.rowval[p];
            let pcol = target_col(row, col);
            let dest = next[pcol];
            P.rowval[dest] = min(iperm[row], iperm[col]);
            P.nzval[dest] = A.nzval[p];
            AtoPAPt[p] = dest;
            next[pcol] += 1;
        }
    }
    (P, AtoPAPt)
}

fn _get_amd_ordering<T: FloatT>(A: &CscMatrix<T>, amd_dense_scale: f64) -> Result<(Vec<usize>, Vec<usize>), QDLDLError> {
    let mut control = amd::Control::default();
    control.dense *= amd_dense_scale;
    let (perm, iperm, _info) =
        amd::order(A.n, &A.colptr, &A.rowval, &control).map_err(|_| QDLDLError::OrderingFailed)?;
    Ok((perm, iperm))
}

#[path = "test.rs"]
#[cfg(test)]
mod test;
