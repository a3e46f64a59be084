// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! LaTeX rendering / parsing round trips

use genseries::{parse_expr, BinaryOp, ExprNode, NodeRef, Simplifier, UnaryOp};
use proptest::prelude::*;

fn n() -> NodeRef {
    ExprNode::var()
}

fn c(value: i64) -> NodeRef {
    ExprNode::constant(value)
}

fn assert_round_trip(tree: &NodeRef) {
    let latex = tree.to_latex();
    let parsed = parse_expr(&latex)
        .unwrap_or_else(|err| panic!("{latex:?} failed to parse: {err}"));
    assert_eq!(
        parsed.canonical(),
        tree.canonical(),
        "round trip through {latex:?}"
    );
}

#[test]
fn test_every_unary_operator() {
    for op in UnaryOp::ALL {
        for child in [n(), c(3), c(-3), ExprNode::add(n(), c(1)), ExprNode::factorial(n())] {
            assert_round_trip(&ExprNode::unary(op, child));
        }
    }
}

#[test]
fn test_every_binary_operator() {
    let operands = [
        n(),
        c(2),
        c(-2),
        ExprNode::neg(n()),
        ExprNode::sub(n(), c(1)),
        ExprNode::mul(c(2), n()),
        ExprNode::pow(n(), c(2)),
        ExprNode::unary(UnaryOp::AltSign, n()),
    ];
    for op in BinaryOp::ALL {
        for left in &operands {
            for right in &operands {
                assert_round_trip(&ExprNode::binary(op, left.clone(), right.clone()));
            }
        }
    }
}

#[test]
fn test_ambiguous_shapes() {
    let cases = [
        // {-1}^{n} vs (-1)^{n}
        ExprNode::pow(c(-1), n()),
        // -{3} vs -3
        ExprNode::neg(c(3)),
        ExprNode::neg(ExprNode::factorial(c(3))),
        // {n!}! vs n!!
        ExprNode::factorial(ExprNode::factorial(n())),
        ExprNode::unary(UnaryOp::DoubleFactorial, ExprNode::factorial(n())),
        ExprNode::factorial(ExprNode::unary(UnaryOp::DoubleFactorial, n())),
        // nested bars
        ExprNode::unary(
            UnaryOp::Abs,
            ExprNode::add(ExprNode::unary(UnaryOp::Abs, n()), n()),
        ),
        ExprNode::neg(ExprNode::unary(UnaryOp::AltSign, n())),
        ExprNode::neg(c(i64::MIN)),
        c(i64::MIN),
        ExprNode::pow(ExprNode::pow(n(), c(2)), c(3)),
        ExprNode::pow(n(), ExprNode::pow(c(2), c(3))),
        ExprNode::sub(n(), ExprNode::sub(n(), c(-1))),
    ];
    for tree in &cases {
        assert_round_trip(tree);
    }
}

fn arb_tree() -> impl Strategy<Value = NodeRef> {
    let leaf = prop_oneof![
        Just(ExprNode::var()),
        (-20i64..=20).prop_map(ExprNode::constant),
        any::<i64>().prop_map(ExprNode::constant),
    ];
    leaf.prop_recursive(5, 48, 2, |inner| {
        prop_oneof![
            (prop::sample::select(UnaryOp::ALL.to_vec()), inner.clone())
                .prop_map(|(op, child)| ExprNode::unary(op, child)),
            (
                prop::sample::select(BinaryOp::ALL.to_vec()),
                inner.clone(),
                inner
            )
                .prop_map(|(op, left, right)| ExprNode::binary(op, left, right)),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn rendered_latex_parses_back(tree in arb_tree()) {
        let latex = tree.to_latex();
        let parsed = parse_expr(&latex);
        prop_assert!(parsed.is_ok(), "{:?} failed: {:?}", latex, parsed.err());
        if let Ok(parsed) = parsed {
            prop_assert_eq!(parsed.canonical(), tree.canonical());
        }
    }

    #[test]
    fn simplify_is_idempotent(tree in arb_tree()) {
        let simplifier = Simplifier::default();
        let once = simplifier.simplify(&tree);
        let twice = simplifier.simplify(&once);
        prop_assert_eq!(once.canonical(), twice.canonical());
    }

    #[test]
    fn simplified_trees_still_round_trip(tree in arb_tree()) {
        let simplified = Simplifier::default().simplify(&tree);
        let parsed = parse_expr(&simplified.to_latex());
        prop_assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            prop_assert_eq!(parsed.canonical(), simplified.canonical());
        }
    }
}
