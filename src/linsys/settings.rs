use crate::algebra::*;
use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::LinSysMethod;

/// Error type returned by settings validation

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
    /// a subsolver error of some kind (e.g. not found)
    #[error("Problem with {solver} solver ({problem})")]
    LinearSolverProblem {
        solver: &'static str,
        problem: &'static str,
    },
}

/// Settings for the KKT linear system backends

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinSysSettings<T: FloatT> {
    ///use a direct factorization of the full KKT system.  Otherwise
    ///use the indirect (PCG) backend on the reduced system
    #[builder(default = "true")]
    pub direct_kkt_solver: bool,

    ///direct linear solver ("auto" or "qdldl")
    #[builder(default = r#""auto".to_string()"#)]
    pub direct_solve_method: String,

    ///scaling of the AMD dense row threshold
    #[builder(default = "1.5")]
    pub amd_dense_scale: f64,

    ///enable KKT dynamic regularization
    #[builder(default = "false")]
    pub dynamic_regularization_enable: bool,

    ///KKT dynamic regularization threshold
    #[builder(default = "(1e-13).as_T()")]
    pub dynamic_regularization_eps: T,

    ///KKT dynamic regularization shift
    #[builder(default = "(2e-7).as_T()")]
    pub dynamic_regularization_delta: T,

    ///KKT direct solve with iterative refinement
    #[builder(default = "true")]
    pub iterative_refinement_enable: bool,

    ///iterative refinement relative tolerance
    #[builder(default = "(1e-13).as_T()")]
    pub iterative_refinement_reltol: T,

    ///iterative refinement absolute tolerance
    #[builder(default = "(1e-12).as_T()")]
    pub iterative_refinement_abstol: T,

    ///iterative refinement maximum iterations
    #[builder(default = "10")]
    pub iterative_refinement_max_iter: u32,

    ///iterative refinement stalling tolerance
    #[builder(default = "(5.0).as_T()")]
    pub iterative_refinement_stop_ratio: T,

    ///maximum PCG iterations per solve.  Zero selects `max(10n, 20)`
    #[builder(default = "0")]
    pub cg_max_iter: u32,

    ///Jacobi preconditioning of the reduced system
    #[builder(default = "true")]
    pub cg_preconditioner_enable: bool,

    ///start PCG from the previous solution when no warm start is given
    #[builder(default = "true")]
    pub warm_start_from_previous: bool,

    ///check matrix formats and symmetry of P on workspace construction,
    ///and reject changed matrix values on update
    #[builder(default = "true")]
    pub check_inputs: bool,
}

impl<T> Default for LinSysSettings<T>
where
    T: FloatT,
{
    fn default() -> LinSysSettings<T> {
        LinSysSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> LinSysSettings<T>
where
    T: FloatT,
{
    /// Checks that the settings are valid.  String fields must name a
    /// supported option and numerical fields must be in range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_direct_solve_method(&self.direct_solve_method)?;

        if !(self.amd_dense_scale > 0.0 && self.amd_dense_scale.is_finite()) {
            return Err(SettingsError::BadFieldValue("amd_dense_scale"));
        }
        if !(self.dynamic_regularization_delta > T::zero()) {
            return Err(SettingsError::BadFieldValue("dynamic_regularization_delta"));
        }
        if !(self.iterative_refinement_stop_ratio > T::zero()) {
            return Err(SettingsError::BadFieldValue(
                "iterative_refinement_stop_ratio",
            ));
        }
        Ok(())
    }

    /// The backend a workspace built with these settings will use
    pub fn method(&self) -> LinSysMethod {
        if self.direct_kkt_solver {
            LinSysMethod::Direct
        } else {
            LinSysMethod::Indirect
        }
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for LinSysSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        LinSysSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> LinSysSettingsBuilder<T>
where
    T: FloatT,
{
    /// check that the specified direct_solve_method is valid
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(ref direct_solve_method) = self.direct_solve_method {
            validate_direct_solve_method(direct_solve_method)?;
        }
        if let Some(scale) = self.amd_dense_scale {
            if !(scale > 0.0 && scale.is_finite()) {
                return Err(SettingsError::BadFieldValue("amd_dense_scale"));
            }
        }
        Ok(())
    }
}

fn validate_direct_solve_method(direct_solve_method: &str) -> Result<(), SettingsError> {
    match direct_solve_method {
        "auto" => Ok(()),
        "qdldl" => Ok(()),
        _ => Err(SettingsError::BadFieldValue("direct_solve_method")),
    }
}

#[test]
fn test_settings_validate() {
    // all standard settings
    LinSysSettingsBuilder::<f64>::default().build().unwrap();

    // fail on unknown direct solve method
    assert!(LinSysSettingsBuilder::<f64>::default()
        .direct_solve_method("foo".to_string())
        .build()
        .is_err());

    // fail on a nonsense AMD scaling
    assert!(LinSysSettingsBuilder::<f64>::default()
        .amd_dense_scale(-1.0)
        .build()
        .is_err());

    // directly construct a bad LinSysSettings and manually check
    let settings = LinSysSettings::<f64> {
        direct_solve_method: "foo".to_string(),
        ..LinSysSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadFieldValue("direct_solve_method"))
    );

    let settings = LinSysSettings::<f64> {
        iterative_refinement_stop_ratio: 0.0,
        ..LinSysSettings::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn test_settings_method() {
    let settings = LinSysSettings::<f64>::default();
    assert_eq!(settings.method(), LinSysMethod::Direct);

    let settings = LinSysSettingsBuilder::<f64>::default()
        .direct_kkt_solver(false)
        .build()
        .unwrap();
    assert_eq!(settings.method(), LinSysMethod::Indirect);
}
