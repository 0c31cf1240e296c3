use super::qdldl::*;
use crate::algebra::{CscMatrix, FloatT};
use crate::linsys::direct::BoxedDirectLDLSolver;
use crate::linsys::{LinSysSettings, SettingsError};
use crate::qdldl::QDLDLError;

/// Constructor for a boxed LDL engine from the triu KKT matrix
/// and the expected pivot signs
pub type LDLConstructor<T> =
    fn(&CscMatrix<T>, &[i8], &LinSysSettings<T>) -> Result<BoxedDirectLDLSolver<T>, QDLDLError>;

// The mapping from the user setting to an LDL engine is a fixed
// lookup table, so any newly supported engine must be added here
// and in the settings validation.

pub fn get_ldlsolver_config<T>(
    settings: &LinSysSettings<T>,
) -> Result<LDLConstructor<T>, SettingsError>
where
    T: FloatT,
{
    let ldlptr: LDLConstructor<T> = match settings.direct_solve_method.as_str() {
        // QDLDL is the only engine, so "auto" always picks it
        "auto" | "qdldl" => new_qdldl::<T>,
        _ => return Err(SettingsError::BadFieldValue("direct_solve_method")),
    };
    Ok(ldlptr)
}

#[allow(non_snake_case)]
fn new_qdldl<T: FloatT>(
    KKT: &CscMatrix<T>,
    Dsigns: &[i8],
    settings: &LinSysSettings<T>,
) -> Result<BoxedDirectLDLSolver<T>, QDLDLError> {
    let solver = QDLDLDirectLDLSolver::new(KKT, Dsigns, settings)?;
    Ok(Box::new(solver))
}

#[test]
fn test_ldlsolver_config() {
    use crate::linsys::direct::DirectLDLSolver;

    let settings = LinSysSettings::<f64>::default();
    let ctor = get_ldlsolver_config(&settings).unwrap();

    let K = CscMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![1., 1., -1.]);
    let mut ldl = ctor(&K, &[1, -1], &settings).unwrap();
    assert_eq!(ldl.positive_inertia(), 1);

    let mut x = [0.; 2];
    ldl.solve(&mut x, &[2., 0.]);
    assert!((x[0] - 1.).abs() < 1e-14 && (x[1] - 1.).abs() < 1e-14);

    let bad = LinSysSettings::<f64> {
        direct_solve_method: "foo".to_string(),
        ..LinSysSettings::default()
    };
    assert!(get_ldlsolver_config(&bad).is_err());
}
