use crate::algebra::*;

/// Jacobi (diagonal) preconditioner, `z = diag(M)⁻¹ r`.  When
/// disabled it is the identity.

#[derive(Debug, Clone)]
pub struct JacobiPreconditioner<T> {
    inv_diag: Vec<T>,
    enabled: bool,
}

impl<T> JacobiPreconditioner<T>
where
    T: FloatT,
{
    pub fn new(n: usize, enabled: bool) -> Self {
        Self {
            inv_diag: vec![T::one(); n],
            enabled,
        }
    }

    /// Recomputes the inverse diagonal from the diagonal of `M`.
    /// Entries that are not positive and finite fall back to one.
    pub fn update(&mut self, diag: &[T]) {
        if !self.enabled {
            return;
        }
        self.inv_diag.scalarop_from(
            |d| {
                if d > T::zero() && d.is_finite() {
                    T::recip(d)
                } else {
                    T::one()
                }
            },
            diag,
        );
    }

    /// `z = diag(M)⁻¹ r`
    pub fn apply(&self, z: &mut [T], r: &[T]) {
        z.copy_from(r);
        if self.enabled {
            z.hadamard(&self.inv_diag);
        }
    }

    pub fn inv_diag(&self) -> &[T] {
        &self.inv_diag
    }
}

#[test]
fn test_jacobi_preconditioner() {
    let mut pc = JacobiPreconditioner::<f64>::new(3, true);
    pc.update(&[2., 0., 4.]);
    assert_eq!(pc.inv_diag(), &[0.5, 1., 0.25]);

    let mut z = [0.; 3];
    pc.apply(&mut z, &[1., 1., 1.]);
    assert_eq!(z, [0.5, 1., 0.25]);

    let mut pc = JacobiPreconditioner::<f64>::new(3, false);
    pc.update(&[2., 3., 4.]);
    pc.apply(&mut z, &[1., 2., 3.]);
    assert_eq!(z, [1., 2., 3.]);
}
