// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Simplifier behavior on parsed formulas and on degenerate trees

use genseries::io::MAX_NESTING;
use genseries::utils::math;
use genseries::{
    parse_expr, EvalConfig, EvalError, Evaluator, ExprNode, NodeRef, SimplifyConfig, Simplifier,
    SyntaxErrorKind, UnaryOp,
};
use std::thread;
use std::time::{Duration, Instant};

fn simplify(source: &str) -> String {
    let tree = parse_expr(source).unwrap();
    Simplifier::default().simplify(&tree).canonical()
}

fn neg_chain(depth: usize) -> NodeRef {
    (0..depth).fold(ExprNode::var(), |node, _| ExprNode::neg(node))
}

#[test]
fn test_literal_folds() {
    let cases = [
        ("2 + 3", "5"),
        ("2 - 7", "-5"),
        ("6 \\cdot 7", "42"),
        ("\\frac{12}{4}", "3"),
        ("\\frac{7}{2}", "(7 / 2)"),
        ("2^{10}", "1024"),
        ("5!", "120"),
        ("7!!", "105"),
        ("\\sqrt{49}", "7"),
        ("\\sqrt{50}", "sqrt(50)"),
        ("|-9|", "9"),
        ("-(-n)", "n"),
    ];
    for (source, expected) in cases {
        assert_eq!(simplify(source), expected, "simplifying {source:?}");
    }
}

#[test]
fn test_checked_folds_leave_overflow_alone() {
    assert_eq!(simplify("21!"), "fact(21)");
    assert_eq!(simplify("2^{21}"), "(2 ^ 21)");
    assert_eq!(
        simplify("9223372036854775807 + 1"),
        "(9223372036854775807 + 1)"
    );
}

#[test]
fn test_identities() {
    assert_eq!(simplify("n \\cdot 1 + 0"), "n");
    assert_eq!(simplify("0 \\cdot n!"), "0");
    assert_eq!(simplify("n^{1}"), "n");
    assert_eq!(simplify("\\frac{n}{1}"), "n");
}

#[test]
fn test_identity_wrapped_chain_reaches_variable() {
    let mut source = String::from("n");
    for _ in 0..30 {
        source = format!("({source} \\cdot 1 + 0)");
    }
    assert_eq!(simplify(&source), "n");
}

#[test]
fn test_numeric_folding() {
    let simplifier = Simplifier::default();
    let evaluator = Evaluator::with_precision(128);

    let tree = parse_expr("\\sqrt{2} \\cdot \\sqrt{2} \\cdot n").unwrap();
    assert_eq!(simplifier.simplify(&tree).canonical(), "((sqrt(2) * sqrt(2)) * n)");
    assert_eq!(
        simplifier.simplify_numeric(&tree, &evaluator).canonical(),
        "(2 * n)"
    );

    // rounds to zero, stays symbolic
    let tiny = parse_expr("\\frac{1}{7} + n").unwrap();
    assert_eq!(
        simplifier.simplify_numeric(&tiny, &evaluator).canonical(),
        "((1 / 7) + n)"
    );
}

#[test]
fn test_numeric_folding_of_huge_binomial_returns() {
    let simplifier = Simplifier::default();
    let evaluator = Evaluator::with_precision(128);
    let tree = parse_expr("\\binom{10^{2000}}{2000} + n").unwrap();

    let start = Instant::now();
    let folded = simplifier.simplify_numeric(&tree, &evaluator);
    assert!(start.elapsed() < Duration::from_secs(10), "{:?}", start.elapsed());
    assert_eq!(folded.canonical(), "(binom((10 ^ 2000), 2000) + n)");
}

#[test]
fn test_simplified_value_matches_original() {
    let evaluator = Evaluator::with_precision(256);
    let simplifier = Simplifier::default();
    let sources = [
        "(n + 0) \\cdot (2^{3} - 8 + n) - -(n - n)",
        "\\binom{n + 3}{2} \\cdot 1 + 3! \\cdot n",
        "\\frac{(-1)^{n} \\cdot 4}{2 \\cdot n + 1}",
    ];
    for source in sources {
        let tree = parse_expr(source).unwrap();
        let simplified = simplifier.simplify(&tree);
        for n in 1..8 {
            let before = evaluator.evaluate_at(&tree, n).unwrap();
            let after = evaluator.evaluate_at(&simplified, n).unwrap();
            assert_eq!(
                math::to_decimal_string(&before, 60),
                math::to_decimal_string(&after, 60),
                "{source:?} at n={n}"
            );
        }
    }
}

#[test]
fn test_deep_chain_is_total() {
    let simplifier = Simplifier::default();

    let chain = neg_chain(150);
    assert_eq!(simplifier.simplify(&chain).canonical(), "n");
    assert!(Evaluator::default().evaluate_at(&chain, 3).is_ok());

    let deeper = neg_chain(600);
    let shallow_evaluator = Evaluator::new(EvalConfig {
        max_depth: 64,
        ..EvalConfig::default()
    });
    assert!(matches!(
        shallow_evaluator.evaluate_at(&deeper, 3),
        Err(EvalError::TooDeep(64))
    ));
    assert_eq!(simplifier.simplify(&deeper).canonical(), "n");

    let odd = ExprNode::unary(UnaryOp::Abs, neg_chain(301));
    let simplified = simplifier.simplify(&odd);
    assert!(simplified.depth() <= odd.depth());
}

#[test]
fn test_very_deep_chain_on_default_stack() {
    // a plain spawned thread gets the platform default stack
    let handle = thread::spawn(|| {
        let chain = neg_chain(100_000);
        let simplified = Simplifier::default().simplify(&chain);

        // each pass cancels 202 negations above the depth ceiling
        assert_eq!(simplified.depth(), 100_001 - 20 * 202);
        assert_eq!(chain.node_count(), 100_001);
        assert!(simplified.canonical().starts_with("neg(neg("));
        assert_eq!(simplified.to_latex().len(), simplified.depth());

        drop(chain);
        drop(simplified);
    });
    assert!(handle.join().is_ok());
}

#[test]
fn test_pass_budget_bounds_work() {
    let simplifier = Simplifier::new(SimplifyConfig {
        max_depth: 10,
        max_passes: 1,
    });
    let chain = neg_chain(100);
    let once = simplifier.simplify(&chain);
    assert_ne!(once.canonical(), "n");
    assert!(once.depth() < chain.depth());
}

#[test]
fn test_deep_render_fails_to_parse_cleanly() {
    let latex = neg_chain(300).to_latex();
    let err = parse_expr(&latex).unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::NestingTooDeep(MAX_NESTING));

    let shallow = neg_chain(MAX_NESTING / 2).to_latex();
    assert!(parse_expr(&shallow).is_ok());
}
