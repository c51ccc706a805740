//! Symbolic frontend end to end: validation, evaluation, fitting.

use proptest::prelude::*;

use hts_fit::{ExpressionError, FitError, evaluate, fit, r_square};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const FOUR_PL: &str = "Bottom + (Top - Bottom)/(1 + exp(Hill*ln(x/IC50)))";

#[test]
fn four_parameter_logistic_recovers_known_parameters() {
    let parameters = names(&["Top", "Bottom", "IC50", "Hill"]);
    // Response decreasing with concentration: Hill > 0 in this form.
    let truth = [100.0, 0.0, 1e-7, 1.0];
    let x: Vec<f64> = (0..8).map(|i| 1e-9 * 10f64.powf(i as f64 * 4.0 / 7.0)).collect();
    let y = evaluate(FOUR_PL, &truth, &parameters, "x", &x).expect("evaluate");

    let initial = [90.0, 5.0, 1e-6, 1.5];
    let result = fit(FOUR_PL, &parameters, "x", &x, &y, &initial).expect("fit");

    assert!((result.parameters[0] - 100.0).abs() < 1.0, "Top");
    assert!((result.parameters[1]).abs() < 1.0, "Bottom");
    let ic50 = result.parameters[2];
    assert!((ic50 - 1e-7).abs() / 1e-7 < 0.05, "IC50 {ic50}");

    let fitted = evaluate(FOUR_PL, &result.parameters, &parameters, "x", &x).expect("evaluate");
    assert!(r_square(&y, &fitted) >= 0.999);
}

#[test]
fn noisy_fit_keeps_high_r_square() {
    let parameters = names(&["Top", "Bottom", "IC50", "Hill"]);
    let truth = [1.0, 0.0, 1e-7, 1.0];
    let x: Vec<f64> = (0..16).map(|i| 1e-9 * 10f64.powf(i as f64 / 4.0)).collect();
    let clean = evaluate(FOUR_PL, &truth, &parameters, "x", &x).expect("evaluate");
    // Deterministic pseudo-noise at sigma ~ 0.01.
    let y: Vec<f64> = clean
        .iter()
        .enumerate()
        .map(|(i, v)| v + 0.01 * ((i as f64 * 12.9898).sin()))
        .collect();

    let result = fit(FOUR_PL, &parameters, "x", &x, &y, &[0.9, 0.05, 1e-6, 1.2]).expect("fit");
    let fitted = evaluate(FOUR_PL, &result.parameters, &parameters, "x", &x).expect("evaluate");
    assert!(r_square(&y, &fitted) >= 0.99);
}

#[test]
fn injection_attempt_never_reaches_the_evaluator() {
    let error = evaluate(
        "__import__('os').system('rm -rf /')",
        &[],
        &[],
        "x",
        &[1.0],
    )
    .expect_err("must reject");
    assert_eq!(
        error,
        ExpressionError::UnknownIdentifier("__import__".to_string())
    );
}

#[test]
fn fit_surfaces_expression_errors() {
    let error = fit("x+", &names(&["a"]), "x", &[1.0, 2.0], &[1.0, 2.0], &[1.0])
        .expect_err("must reject");
    assert!(matches!(
        error,
        FitError::Expression(ExpressionError::OperatorUnmatched)
    ));
}

proptest! {
    /// Every expression the validator accepts is evaluable: a random
    /// composition over the closed vocabulary never produces an
    /// unknown-identifier failure at evaluation time.
    #[test]
    fn accepted_expressions_are_evaluable(
        a in -10.0f64..10.0,
        b in 0.1f64..10.0,
        x in 0.1f64..10.0,
        pick in 0usize..5,
    ) {
        let expressions = [
            "a + b*x",
            "a/(1 + exp(b*ln(x)))",
            "sqrt(x)*a + cos(b)",
            "log(x) + a/b",
            "(a - b)/(x + 1)",
        ];
        let parameters = names(&["a", "b"]);
        let values = evaluate(expressions[pick], &[a, b], &parameters, "x", &[x])
            .expect("accepted expression must evaluate");
        prop_assert_eq!(values.len(), 1);
    }
}
