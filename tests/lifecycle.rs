#![allow(non_snake_case)]

use qdsys::algebra::*;
use qdsys::linsys::*;
use std::thread;

mod common;
use common::*;

fn settings_for(method: LinSysMethod) -> LinSysSettings<f64> {
    LinSysSettingsBuilder::default()
        .direct_kkt_solver(method == LinSysMethod::Direct)
        .build()
        .unwrap()
}

const METHODS: [LinSysMethod; 2] = [LinSysMethod::Direct, LinSysMethod::Indirect];

// n = 1, m = 1, P = 0, A = [1]
fn scalar_data() -> (CscMatrix<f64>, CscMatrix<f64>) {
    let A = CscMatrix::from(&[[1.0]]);
    let P = CscMatrix::<f64>::spalloc(1, 1, 0);
    (A, P)
}

#[test]
fn scalar_solve_then_update() {
    for method in METHODS {
        let (A, P) = scalar_data();
        let reg = Regularization::new(1.0, vec![1.0]).unwrap();
        let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method)).unwrap();
        assert_eq!(ws.method(), method);

        // K = [1 1; 1 -1]
        let mut b = [2.0, 0.0];
        assert_eq!(ws.solve(&A, &P, &mut b, None, 1e-10), LinSysStatus::Success);
        assert!((b[0] - 1.0).abs() < 1e-9 && (b[1] - 1.0).abs() < 1e-9);

        // K = [1 1; 1 -2]
        ws.update(&A, &P, &[2.0]).unwrap();
        let mut b = [3.0, 0.0];
        assert_eq!(ws.solve(&A, &P, &mut b, None, 1e-10), LinSysStatus::Success);
        assert!((b[0] - 2.0).abs() < 1e-9 && (b[1] - 1.0).abs() < 1e-9);

        ws.release();
    }
}

#[test]
fn rho_y_length_mismatch_is_rejected() {
    for method in METHODS {
        let (A, P) = scalar_data();

        // on construction
        let reg = Regularization::new(1.0, vec![1.0, 1.0]).unwrap();
        let result = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method));
        assert!(matches!(
            result,
            Err(LinSysError::IncompatibleDimension {
                expected: 1,
                found: 2,
                ..
            })
        ));

        // and on update, leaving the workspace as it was
        let reg = Regularization::new(1.0, vec![1.0]).unwrap();
        let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method)).unwrap();
        assert!(matches!(
            ws.update(&A, &P, &[2.0, 2.0]),
            Err(LinSysError::IncompatibleDimension { .. })
        ));
        assert_eq!(
            ws.update(&A, &P, &[0.0]),
            Err(LinSysError::BadDualRegularizer { index: 0 })
        );
        assert_eq!(
            ws.update(&A, &P, &[f64::NAN]),
            Err(LinSysError::BadDualRegularizer { index: 0 })
        );

        let mut b = [2.0, 0.0];
        assert!(ws.solve(&A, &P, &mut b, None, 1e-10).is_ok());
        assert!((b[0] - 1.0).abs() < 1e-9 && (b[1] - 1.0).abs() < 1e-9);
    }
}

#[test]
fn bad_regularization_is_rejected() {
    assert_eq!(
        Regularization::new(0.0, vec![1.0]),
        Err(LinSysError::BadPrimalRegularizer)
    );
    assert_eq!(
        Regularization::new(1.0, vec![1.0, -1.0]),
        Err(LinSysError::BadDualRegularizer { index: 1 })
    );
}

#[test]
fn bad_matrix_dimensions_are_rejected() {
    let A = CscMatrix::<f64>::spalloc(3, 2, 0);
    let P = CscMatrix::<f64>::spalloc(3, 3, 0);
    let reg = Regularization::new(1.0, vec![1.0; 3]).unwrap();

    for method in METHODS {
        let result = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method));
        assert!(matches!(
            result,
            Err(LinSysError::IncompatibleDimension {
                what: "P rows",
                expected: 2,
                found: 3
            })
        ));
    }
}

#[test]
fn bad_matrix_format_is_rejected() {
    // row index out of range
    let A = CscMatrix::new(1, 1, vec![0, 1], vec![4], vec![1.0]);
    let P = CscMatrix::<f64>::spalloc(1, 1, 0);
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();

    for method in METHODS {
        let result = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method));
        assert!(matches!(result, Err(LinSysError::SparseFormat(_))));
    }
}

#[test]
fn bad_solve_arguments_are_rejected() {
    for method in METHODS {
        let (A, P) = scalar_data();
        let reg = Regularization::new(1.0, vec![1.0]).unwrap();
        let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method)).unwrap();

        let mut b = [2.0, 0.0, 5.0];
        let status = ws.solve(&A, &P, &mut b, None, 1e-8);
        assert_eq!(status, LinSysStatus::InvalidInput);
        assert_eq!(status.code(), -4);
        assert_eq!(b, [2.0, 0.0, 5.0]);

        let mut b = [2.0, 0.0];
        let warm = [1.0];
        assert_eq!(
            ws.solve(&A, &P, &mut b, Some(&warm[..]), 1e-8),
            LinSysStatus::InvalidInput
        );
        for tol in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                ws.solve(&A, &P, &mut b, None, tol),
                LinSysStatus::InvalidInput
            );
        }
        assert_eq!(b, [2.0, 0.0]);
        assert_eq!(ws.info().solves, 0);
    }
}

#[test]
fn mismatched_matrices_are_rejected() {
    for method in METHODS {
        let (A, P) = scalar_data();
        let reg = Regularization::new(1.0, vec![1.0]).unwrap();
        let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method)).unwrap();

        let A2 = CscMatrix::from(&[[1.0, 2.0]]);
        let P2 = CscMatrix::<f64>::spalloc(2, 2, 0);
        let mut b = [2.0, 0.0];
        assert_eq!(
            ws.solve(&A2, &P2, &mut b, None, 1e-8),
            LinSysStatus::InvalidInput
        );
        assert_eq!(
            ws.update(&A2, &P2, &[1.0]),
            Err(LinSysError::MatrixMismatch)
        );

        // same shape, different nonzero count
        let P3 = CscMatrix::from(&[[1.0]]);
        assert_eq!(
            ws.update(&A, &P3, &[1.0]),
            Err(LinSysError::MatrixMismatch)
        );
    }
}

#[test]
fn changed_values_are_rejected() {
    for method in METHODS {
        let (A, P) = scalar_data();
        let reg = Regularization::new(1.0, vec![1.0]).unwrap();
        let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(method)).unwrap();

        let A2 = CscMatrix::from(&[[3.0]]);
        assert_eq!(ws.update(&A2, &P, &[2.0]), Err(LinSysError::MatrixMismatch));

        // the workspace still solves the original system at rho_y = 1
        let mut b = [2.0, 0.0];
        assert_eq!(ws.solve(&A, &P, &mut b, None, 1e-10), LinSysStatus::Success);
        assert!(b.norm_inf_diff(&[1.0, 1.0]) < 1e-8);
    }
}

#[test]
fn asymmetric_p_is_rejected() {
    let A = CscMatrix::from(&[[1.0, 1.0]]);
    // lower triangle only
    let Plower = CscMatrix::from(&[
        [2.0, 0.0], //
        [1.0, 2.0], //
    ]);
    let Pfull = CscMatrix::from(&[
        [2.0, 1.0], //
        [1.0, 2.0], //
    ]);
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();

    for method in METHODS {
        let result = LinSysWorkspace::new(&A, &Plower, &reg, &settings_for(method));
        assert!(matches!(
            result,
            Err(LinSysError::SparseFormat(SparseFormatError::NotSymmetric))
        ));

        let mut ws = LinSysWorkspace::new(&A, &Pfull, &reg, &settings_for(method)).unwrap();
        // M = [4 2; 2 4], x = M \ [6 6], y = x1 + x2
        let mut b = [6.0, 6.0, 0.0];
        assert_eq!(ws.solve(&A, &Pfull, &mut b, None, 1e-10), LinSysStatus::Success);
        assert!(b.norm_inf_diff(&[1.0, 1.0, 2.0]) < 1e-8);
    }
}

#[test]
fn failed_refactor_recovers_on_update() {
    // top left block 1 - 1.5 < 0 makes K singular at rho_y = 2
    let A = CscMatrix::from(&[[1.0]]);
    let P = CscMatrix::from(&[[-1.5]]);
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();
    let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(LinSysMethod::Direct)).unwrap();

    assert!(matches!(
        ws.update(&A, &P, &[2.0]),
        Err(LinSysError::Factorization(_))
    ));
    let mut b = [1.0, 0.0];
    let status = ws.solve(&A, &P, &mut b, None, 1e-8);
    assert_eq!(status, LinSysStatus::FactorizationFailed);
    assert_eq!(status.code(), -3);

    ws.update(&A, &P, &[1.0]).unwrap();
    assert!(ws.solve(&A, &P, &mut b, None, 1e-8).is_ok());
    assert!((b[0] - 2.0).abs() < 1e-9 && (b[1] - 2.0).abs() < 1e-9);
}

#[test]
fn method_names() {
    assert_eq!(LinSysMethod::Direct.name(), "sparse-direct-qdldl");
    assert_eq!(LinSysMethod::Indirect.name(), "sparse-indirect-pcg");
    assert_eq!(LinSysMethod::Indirect.to_string(), "sparse-indirect-pcg");

    assert_eq!(
        settings_for(LinSysMethod::Indirect).method(),
        LinSysMethod::Indirect
    );
    assert_eq!(method_name_of::<f64>(None), None);

    let (A, P) = scalar_data();
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();
    let ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(LinSysMethod::Direct)).unwrap();
    assert_eq!(method_name_of(Some(&ws)), Some("sparse-direct-qdldl"));
}

#[test]
fn summaries() {
    let (A, P) = scalar_data();
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();

    let mut ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(LinSysMethod::Direct)).unwrap();
    ws.update(&A, &P, &[2.0]).unwrap();
    let mut b = [3.0, 0.0];
    assert!(ws.solve(&A, &P, &mut b, None, 1e-8).is_ok());
    let s = ws.summary();
    assert!(s.starts_with("sparse-direct-qdldl"));
    assert!(s.contains("refactors 1"));
    assert!(s.contains("solves 1"));

    let mut ws =
        LinSysWorkspace::new(&A, &P, &reg, &settings_for(LinSysMethod::Indirect)).unwrap();
    let mut b = [2.0, 0.0];
    assert!(ws.solve(&A, &P, &mut b, None, 1e-8).is_ok());
    let s = ws.summary();
    assert!(s.starts_with("sparse-indirect-pcg"));
    assert!(s.contains("avg cg iters 1.00"));
}

#[test]
fn independent_workspaces_in_parallel() {
    let handles: Vec<_> = (0..4)
        .map(|k| {
            thread::spawn(move || {
                let method = METHODS[k % 2];
                let data = KKTProblem::random(20, 10, 0.3, 40 + k as u64);
                let reg = Regularization::new(data.rho_x, data.rho_y.clone()).unwrap();
                let mut ws =
                    LinSysWorkspace::new(&data.A, &data.P, &reg, &settings_for(method)).unwrap();

                let b = data.rhs(k as u64);
                let mut z = b.clone();
                let status = ws.solve(&data.A, &data.P, &mut z, None, 1e-9);
                ws.release();
                (status, data.residual(&data.rho_y, &z, &b) / f64::max(1.0, norm(&b)))
            })
        })
        .collect();

    for h in handles {
        let (status, relres) = h.join().unwrap();
        assert_eq!(status, LinSysStatus::Success);
        assert!(relres < 1e-8);
    }
}

#[test]
fn workspace_moves_between_threads() {
    let (A, P) = scalar_data();
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();
    let ws = LinSysWorkspace::new(&A, &P, &reg, &settings_for(LinSysMethod::Indirect)).unwrap();

    let mut ws = thread::spawn(move || {
        let mut ws = ws;
        let (A, P) = scalar_data();
        let mut b = [2.0, 0.0];
        assert!(ws.solve(&A, &P, &mut b, None, 1e-10).is_ok());
        ws
    })
    .join()
    .unwrap();

    let mut b = [2.0, 0.0];
    assert!(ws.solve(&A, &P, &mut b, None, 1e-10).is_ok());
    assert_eq!(ws.info().solves, 2);
}
