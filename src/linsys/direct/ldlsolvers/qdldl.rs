#![allow(non_snake_case)]
use crate::algebra::*;
use crate::linsys::direct::DirectLDLSolver;
use crate::linsys::LinSysSettings;
use crate::qdldl::*;

/// [`DirectLDLSolver`] backed by the native QDLDL factorization

pub struct QDLDLDirectLDLSolver<T> {
    //KKT matrix and its QDLDL factorization
    factors: QDLDLFactorisation<T>,
}

impl<T> QDLDLDirectLDLSolver<T>
where
    T: FloatT,
{
    pub fn new(
        KKT: &CscMatrix<T>,
        Dsigns: &[i8],
        settings: &LinSysSettings<T>,
    ) -> Result<Self, QDLDLError> {
        let opts = QDLDLSettings {
            amd_dense_scale: settings.amd_dense_scale,
            perm: None,
            Dsigns: Some(Dsigns.to_vec()),
            regularize_enable: settings.dynamic_regularization_enable,
            regularize_eps: settings.dynamic_regularization_eps,
            regularize_delta: settings.dynamic_regularization_delta,
        };

        let factors = QDLDLFactorisation::<T>::new(KKT, Some(opts))?;

        Ok(Self { factors })
    }
}

impl<T> DirectLDLSolver<T> for QDLDLDirectLDLSolver<T>
where
    T: FloatT,
{
    fn update_values(&mut self, index: &[usize], values: &[T]) -> Result<(), QDLDLError> {
        //Update values that are stored within
        //the reordered copy held internally by QDLDL.
        self.factors.update_values(index, values)
    }

    fn solve(&mut self, x: &mut [T], b: &[T]) {
        // NB: QDLDL solves in place
        x.copy_from(b);
        self.factors.solve(x);
    }

    fn refactor(&mut self, _kkt: &CscMatrix<T>) -> Result<(), QDLDLError> {
        //QDLDL has maintained its own version of the permuted
        //KKT matrix through update_values, so we ignore the
        //KKT matrix provided by the caller
        self.factors.refactor()
    }

    fn positive_inertia(&self) -> usize {
        self.factors.positive_inertia()
    }

    fn nnz_factors(&self) -> usize {
        self.factors.nnz_factors()
    }
}
