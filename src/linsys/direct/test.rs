use super::*;

// x = [2, 2] solves [-0.5 1; 1 -1] x = [1, 0].  The top left block is
// negative here (P is not PSD), which lets the tests drive the
// factorization into failure by changing only rho_y.
fn indefinite_1x1() -> (CscMatrix<f64>, CscMatrix<f64>) {
    let A = CscMatrix::new(1, 1, vec![0, 1], vec![0], vec![1.]);
    let P = CscMatrix::new(1, 1, vec![0, 1], vec![0], vec![-1.5]);
    (A, P)
}

fn solve_status(ls: &mut DirectLinSys<f64>, A: &CscMatrix<f64>, P: &CscMatrix<f64>, b: &mut [f64]) -> LinSysStatus {
    LinearSystemSolver::solve(ls, A, P, b, None, 1e-8)
}

#[test]
fn test_direct_kkt_values() {
    let A = CscMatrix::from(&[
        [1., 0.], //
        [0., 2.], //
        [3., 0.], //
    ]);
    // P has no entry at (1,1)
    let P = CscMatrix::from(&[
        [4., 1.], //
        [0., 0.], //
    ]);
    let reg = Regularization::new(0.5, vec![1., 2., 3.]).unwrap();
    let ls = DirectLinSys::new(&A, &P, &reg, &LinSysSettings::default()).unwrap();

    let K = ls.kkt();
    assert_eq!(K.size(), (5, 5));
    assert_eq!(K.get_entry((0, 0)), Some(4.5));
    assert_eq!(K.get_entry((0, 1)), Some(1.));
    assert_eq!(K.get_entry((1, 1)), Some(0.5));
    assert_eq!(K.get_entry((0, 4)), Some(3.));
    assert_eq!(K.get_entry((1, 3)), Some(2.));
    assert_eq!(K.get_entry((2, 2)), Some(-1.));
    assert_eq!(K.get_entry((3, 3)), Some(-2.));
    assert_eq!(K.get_entry((4, 4)), Some(-3.));
    assert_eq!(ls.info().factorizations, 1);
    assert!(ls.info().factor_nnz >= 5);
}

#[test]
fn test_direct_full_and_triu_objective_agree() {
    let A = CscMatrix::from(&[
        [1., 1.], //
    ]);
    let Ptriu = CscMatrix::from(&[
        [2., 1.], //
        [0., 3.], //
    ]);
    let Pfull = CscMatrix::from(&[
        [2., 1.], //
        [1., 3.], //
    ]);
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();
    let settings = LinSysSettings::default();

    let mut ls1 = DirectLinSys::new(&A, &Ptriu, &reg, &settings).unwrap();
    let mut ls2 = DirectLinSys::new(&A, &Pfull, &reg, &settings).unwrap();
    assert_eq!(ls1.kkt(), ls2.kkt());

    let mut b1 = [1., -1., 2.];
    let mut b2 = b1;
    assert!(solve_status(&mut ls1, &A, &Ptriu, &mut b1).is_ok());
    assert!(solve_status(&mut ls2, &A, &Pfull, &mut b2).is_ok());
    assert_eq!(b1, b2);
}

#[test]
fn test_direct_refactor_failure_and_recovery() {
    let (A, P) = indefinite_1x1();
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();
    let mut ls = DirectLinSys::new(&A, &P, &reg, &LinSysSettings::default()).unwrap();

    let mut b = [1., 0.];
    assert_eq!(solve_status(&mut ls, &A, &P, &mut b), LinSysStatus::Success);
    assert!([2., 2.].norm_inf_diff(&b) < 1e-12);

    // rho_y = 2 makes K exactly singular
    let result = ls.update(&A, &P, &[2.0]);
    assert!(matches!(
        result,
        Err(LinSysError::Factorization(QDLDLError::ZeroPivot(_)))
    ));
    assert!(!ls.is_usable());

    // failed factors are never used, and b is left alone
    let mut b = [1., 0.];
    assert_eq!(
        solve_status(&mut ls, &A, &P, &mut b),
        LinSysStatus::FactorizationFailed
    );
    assert_eq!(b, [1., 0.]);

    // rho_y = 4 factors, but with both pivots negative
    assert_eq!(
        ls.update(&A, &P, &[4.0]),
        Err(LinSysError::Inertia {
            expected: 1,
            found: 0
        })
    );
    assert!(!ls.is_usable());

    // a good update recovers
    ls.update(&A, &P, &[1.0]).unwrap();
    assert!(ls.is_usable());
    let mut b = [1., 0.];
    assert_eq!(solve_status(&mut ls, &A, &P, &mut b), LinSysStatus::Success);
    assert!([2., 2.].norm_inf_diff(&b) < 1e-12);

    assert_eq!(ls.info().factorizations, 4);
}

#[test]
fn test_direct_bad_inertia_on_init() {
    // top left block -0.5 with rho_y = 4 has no positive pivot
    let (A, P) = indefinite_1x1();
    let reg = Regularization::new(1.0, vec![4.0]).unwrap();
    let result = DirectLinSys::new(&A, &P, &reg, &LinSysSettings::default());
    assert!(matches!(
        result,
        Err(LinSysError::Inertia {
            expected: 1,
            found: 0
        })
    ));
}

#[test]
fn test_direct_update_rejects_changed_data() {
    let (A, P) = indefinite_1x1();
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();
    let mut ls = DirectLinSys::new(&A, &P, &reg, &LinSysSettings::default()).unwrap();

    let mut A2 = A.clone();
    A2.nzval[0] = 3.;
    assert_eq!(ls.update(&A2, &P, &[1.5]), Err(LinSysError::MatrixMismatch));

    let mut P2 = P.clone();
    P2.nzval[0] = 1.;
    assert_eq!(ls.update(&A, &P2, &[1.5]), Err(LinSysError::MatrixMismatch));

    // nothing changed
    assert_eq!(ls.kkt().get_entry((1, 1)), Some(-1.));
    assert_eq!(ls.info().factorizations, 1);
}

#[test]
fn test_direct_update_rejects_changed_full_p() {
    let A = CscMatrix::from(&[[1., 1.]]);
    let P = CscMatrix::from(&[
        [2., 1.], //
        [1., 2.], //
    ]);
    let reg = Regularization::new(1.0, vec![1.0]).unwrap();
    let mut ls = DirectLinSys::new(&A, &P, &reg, &LinSysSettings::default()).unwrap();

    // entry (0,1) in full storage
    let mut P2 = P.clone();
    P2.nzval[2] = 0.5;
    assert_eq!(ls.update(&A, &P2, &[2.0]), Err(LinSysError::MatrixMismatch));
    assert_eq!(ls.info().factorizations, 1);

    ls.update(&A, &P, &[2.0]).unwrap();
    assert_eq!(ls.info().factorizations, 2);
}

#[test]
fn test_direct_without_refinement() {
    let A = CscMatrix::from(&[
        [1., 2.], //
        [0., 1.], //
    ]);
    let P = CscMatrix::<f64>::spalloc(2, 2, 0);
    let reg = Regularization::new(1e-3, vec![1e-3, 1e-3]).unwrap();
    let settings = LinSysSettingsBuilder::default()
        .iterative_refinement_enable(false)
        .build()
        .unwrap();
    let mut ls = DirectLinSys::new(&A, &P, &reg, &settings).unwrap();

    let b0 = [1., 2., 3., 4.];
    let mut b = b0;
    assert!(solve_status(&mut ls, &A, &P, &mut b).is_ok());
    assert_eq!(ls.info().last_iterations, 0);

    // residual against the assembled triu KKT
    let mut r = b0;
    ls.kkt().sym().symv(&mut r, &b, -1., 1.);
    assert!(r.norm_inf() < 1e-10);
    assert!(ls.info().last_residual < 1e-10);
}
