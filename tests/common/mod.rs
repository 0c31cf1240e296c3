#![allow(non_snake_case)]
#![allow(dead_code)]

use qdsys::algebra::*;

// small deterministic generator so that test problems are
// reproducible without an extra dependency
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed.wrapping_mul(6364136223846793005).wrapping_add(1))
    }

    // uniform on [0,1)
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    pub fn vector(&mut self, len: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..len).map(|_| self.uniform(lo, hi)).collect()
    }
}

pub fn csc_from_dense(rows: &[Vec<f64>], ncols: usize) -> CscMatrix<f64> {
    let m = rows.len();
    let mut colptr = vec![0];
    let mut rowval = vec![];
    let mut nzval = vec![];
    for j in 0..ncols {
        for (i, row) in rows.iter().enumerate() {
            if row[j] != 0.0 {
                rowval.push(i);
                nzval.push(row[j]);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(m, ncols, colptr, rowval, nzval)
}

/// Random KKT data.  P is symmetric and diagonally dominant,
/// so positive definite.  Dense copies are kept for residual checks.
pub struct KKTProblem {
    pub m: usize,
    pub n: usize,
    pub A: CscMatrix<f64>,
    pub P: CscMatrix<f64>,
    pub Ptriu: CscMatrix<f64>,
    pub Adense: Vec<Vec<f64>>,
    pub Pdense: Vec<Vec<f64>>,
    pub rho_x: f64,
    pub rho_y: Vec<f64>,
}

impl KKTProblem {
    pub fn random(m: usize, n: usize, density: f64, seed: u64) -> Self {
        let mut rng = Lcg::new(seed);

        let mut Adense = vec![vec![0.0; n]; m];
        for row in Adense.iter_mut() {
            for v in row.iter_mut() {
                if rng.next_f64() < density {
                    *v = rng.uniform(-1.0, 1.0);
                }
            }
        }

        let mut Pdense = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.next_f64() < density {
                    let v = rng.uniform(-0.5, 0.5);
                    Pdense[i][j] = v;
                    Pdense[j][i] = v;
                }
            }
        }
        for i in 0..n {
            let offdiag: f64 = Pdense[i].iter().map(|v| v.abs()).sum();
            Pdense[i][i] = offdiag + rng.uniform(0.1, 1.0);
        }

        let A = csc_from_dense(&Adense, n);
        let P = csc_from_dense(&Pdense, n);
        let Ptriu = P.to_triu();
        let rho_y = rng.vector(m, 0.5, 2.0);

        KKTProblem {
            m,
            n,
            A,
            P,
            Ptriu,
            Adense,
            Pdense,
            rho_x: 1e-6,
            rho_y,
        }
    }

    pub fn rhs(&self, seed: u64) -> Vec<f64> {
        Lcg::new(seed).vector(self.n + self.m, -1.0, 1.0)
    }

    /// ‖K z - b‖₂ for the KKT matrix with dual regularizer `rho_y`
    pub fn residual(&self, rho_y: &[f64], z: &[f64], b: &[f64]) -> f64 {
        let (n, m) = (self.n, self.m);
        let (x, y) = z.split_at(n);
        let mut r = vec![0.0; n + m];

        for i in 0..n {
            let mut v = self.rho_x * x[i] - b[i];
            for j in 0..n {
                v += self.Pdense[i][j] * x[j];
            }
            for k in 0..m {
                v += self.Adense[k][i] * y[k];
            }
            r[i] = v;
        }
        for k in 0..m {
            let mut v = -rho_y[k] * y[k] - b[n + k];
            for j in 0..n {
                v += self.Adense[k][j] * x[j];
            }
            r[n + k] = v;
        }
        r.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|v| v * v).sum::<f64>().sqrt()
}

pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
