use crate::algebra::*;

use super::LinSysError;

/// Regularization applied to the KKT system, i.e. the primal scalar
/// `rho_x` on the top-left block and the dual diagonal `rho_y` whose
/// negation forms the bottom-right block.

#[derive(Debug, Clone, PartialEq)]
pub struct Regularization<T> {
    rho_x: T,
    rho_y: Vec<T>,
}

impl<T> Regularization<T>
where
    T: FloatT,
{
    /// Validated constructor.  `rho_x` and every entry of `rho_y`
    /// must be positive and finite.
    pub fn new(rho_x: T, rho_y: Vec<T>) -> Result<Self, LinSysError> {
        check_rho_x(rho_x)?;
        check_rho_y(&rho_y)?;
        Ok(Self { rho_x, rho_y })
    }

    pub fn rho_x(&self) -> T {
        self.rho_x
    }

    pub fn rho_y(&self) -> &[T] {
        &self.rho_y
    }

    /// Number of dual entries, i.e. the row count of the constraint matrix
    pub fn m(&self) -> usize {
        self.rho_y.len()
    }

    /// Replaces the dual diagonal.  The length may not change, and on
    /// failure the current values are kept.
    pub fn set_rho_y(&mut self, rho_y: &[T]) -> Result<(), LinSysError> {
        if rho_y.len() != self.rho_y.len() {
            return Err(LinSysError::IncompatibleDimension {
                what: "rho_y",
                expected: self.rho_y.len(),
                found: rho_y.len(),
            });
        }
        check_rho_y(rho_y)?;
        self.rho_y.copy_from(rho_y);
        Ok(())
    }
}

pub(crate) fn check_rho_x<T: FloatT>(rho_x: T) -> Result<(), LinSysError> {
    if rho_x > T::zero() && rho_x.is_finite() {
        Ok(())
    } else {
        Err(LinSysError::BadPrimalRegularizer)
    }
}

pub(crate) fn check_rho_y<T: FloatT>(rho_y: &[T]) -> Result<(), LinSysError> {
    match rho_y.iter().position(|&r| !(r > T::zero() && r.is_finite())) {
        Some(index) => Err(LinSysError::BadDualRegularizer { index }),
        None => Ok(()),
    }
}

#[test]
fn test_regularization_checks() {
    assert!(Regularization::new(1.0, vec![1.0, 2.0]).is_ok());
    assert_eq!(
        Regularization::new(0.0, vec![1.0]),
        Err(LinSysError::BadPrimalRegularizer)
    );
    assert_eq!(
        Regularization::new(f64::NAN, vec![1.0]),
        Err(LinSysError::BadPrimalRegularizer)
    );
    assert_eq!(
        Regularization::new(1.0, vec![1.0, -2.0]),
        Err(LinSysError::BadDualRegularizer { index: 1 })
    );

    let mut reg = Regularization::new(1.0, vec![1.0, 2.0]).unwrap();
    assert!(reg.set_rho_y(&[3.0]).is_err());
    assert!(reg.set_rho_y(&[3.0, f64::INFINITY]).is_err());
    assert_eq!(reg.rho_y(), &[1.0, 2.0]);
    reg.set_rho_y(&[3.0, 4.0]).unwrap();
    assert_eq!(reg.rho_y(), &[3.0, 4.0]);
}
