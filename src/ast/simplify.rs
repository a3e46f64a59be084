// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Algebraic simplification
//!
//! A pass rewrites the tree bottom-up: children first, then the node-level
//! identities below. Passes repeat until the canonical string stops changing
//! or the pass budget runs out. Numeric simplification additionally replaces
//! variable-free subtrees by the integer they evaluate to.
//!
//! | pattern            | result      |
//! |--------------------|-------------|
//! | `c1 op c2`         | folded `c`  |
//! | `x + 0`, `0 + x`   | `x`         |
//! | `x + (-k)`         | `x - k`     |
//! | `x + neg(y)`       | `x - y`     |
//! | `x - 0`            | `x`         |
//! | `0 - x`            | `neg(x)`    |
//! | `x - (-k)`         | `x + k`     |
//! | `x - neg(y)`       | `x + y`     |
//! | `x - x`            | `0`         |
//! | `x * 0`, `0 * x`   | `0`         |
//! | `x * 1`, `1 * x`   | `x`         |
//! | `x * -1`, `-1 * x` | `neg(x)`    |
//! | `x / 1`            | `x`         |
//! | `0 / x`            | `0`         |
//! | `x / x`            | `1`         |
//! | `x ^ 0`, `1 ^ x`   | `1`         |
//! | `x ^ 1`            | `x`         |
//! | `0 ^ x`            | `0`         |
//! | `neg(neg(x))`      | `x`         |

use super::{BinaryOp, Evaluator, ExprNode, NodeRef, UnaryOp};
use crate::utils::math::{self, Float};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest argument folded by `!` and `!!`; 20! is the last factorial in `i64`
const MAX_FOLDED_FACTORIAL: i64 = 20;
const MAX_FOLDED_EXPONENT: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Nodes deeper than this are left untouched
    pub max_depth: usize,
    /// Pass budget of the fixed-point loop
    pub max_passes: usize,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_passes: 20,
        }
    }
}

/// Fixed-point rewriting engine
#[derive(Debug, Clone, Default)]
pub struct Simplifier {
    config: SimplifyConfig,
}

impl Simplifier {
    pub fn new(config: SimplifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimplifyConfig {
        &self.config
    }

    /// Rewrite until a fixed point or the pass budget is reached
    ///
    /// Unchanged subtrees are shared with the input.
    pub fn simplify(&self, node: &NodeRef) -> NodeRef {
        let mut current = Arc::clone(node);
        let mut current_key = current.canonical();

        for _ in 0..self.config.max_passes {
            let next = self.pass(&current, 0);
            let next_key = next.canonical();
            if next_key == current_key {
                return next;
            }
            current = next;
            current_key = next_key;
        }

        debug!(
            "simplification stopped after {} passes without a fixed point ({} nodes)",
            self.config.max_passes,
            current.node_count()
        );
        current
    }

    /// Simplify, fold variable-free subtrees to integers, simplify again
    pub fn simplify_numeric(&self, node: &NodeRef, evaluator: &Evaluator) -> NodeRef {
        let simplified = self.simplify(node);
        let folded = self.fold_constants(&simplified, evaluator, 0);
        self.simplify(&folded)
    }

    fn pass(&self, node: &NodeRef, depth: usize) -> NodeRef {
        if depth > self.config.max_depth {
            return Arc::clone(node);
        }

        match node.as_ref() {
            ExprNode::Var | ExprNode::Const(_) => Arc::clone(node),
            ExprNode::Unary { op, child } => {
                let child_s = self.pass(child, depth + 1);
                if let Some(rewritten) = self.unary_rule(*op, &child_s) {
                    return rewritten;
                }
                if Arc::ptr_eq(&child_s, child) {
                    Arc::clone(node)
                } else {
                    ExprNode::unary(*op, child_s)
                }
            }
            ExprNode::Binary { op, left, right } => {
                let left_s = self.pass(left, depth + 1);
                let right_s = self.pass(right, depth + 1);
                if let Some(rewritten) = self.binary_rule(*op, &left_s, &right_s, depth) {
                    return rewritten;
                }
                if Arc::ptr_eq(&left_s, left) && Arc::ptr_eq(&right_s, right) {
                    Arc::clone(node)
                } else {
                    ExprNode::binary(*op, left_s, right_s)
                }
            }
        }
    }

    // Build a node from already simplified children, applying node-level rules once more
    fn reduce_unary(&self, op: UnaryOp, child: NodeRef, depth: usize) -> NodeRef {
        if depth > self.config.max_depth {
            return ExprNode::unary(op, child);
        }
        match self.unary_rule(op, &child) {
            Some(rewritten) => rewritten,
            None => ExprNode::unary(op, child),
        }
    }

    fn reduce_binary(&self, op: BinaryOp, left: NodeRef, right: NodeRef, depth: usize) -> NodeRef {
        if depth > self.config.max_depth {
            return ExprNode::binary(op, left, right);
        }
        match self.binary_rule(op, &left, &right, depth) {
            Some(rewritten) => rewritten,
            None => ExprNode::binary(op, left, right),
        }
    }

    fn unary_rule(&self, op: UnaryOp, child: &NodeRef) -> Option<NodeRef> {
        match (op, child.as_ref()) {
            (
                UnaryOp::Neg,
                ExprNode::Unary {
                    op: UnaryOp::Neg,
                    child: inner,
                },
            ) => Some(Arc::clone(inner)),
            (UnaryOp::Neg, ExprNode::Const(c)) => c.checked_neg().map(ExprNode::constant),
            (UnaryOp::Factorial, ExprNode::Const(c)) if (0..=MAX_FOLDED_FACTORIAL).contains(c) => {
                Some(ExprNode::constant(falling_product(*c, 1)))
            }
            (UnaryOp::DoubleFactorial, ExprNode::Const(c))
                if (0..=MAX_FOLDED_FACTORIAL).contains(c) =>
            {
                Some(ExprNode::constant(falling_product(*c, 2)))
            }
            (UnaryOp::AltSign, ExprNode::Const(c)) if *c >= 0 => {
                Some(ExprNode::constant(if c % 2 == 0 { 1 } else { -1 }))
            }
            (UnaryOp::Abs, ExprNode::Const(c)) => c.checked_abs().map(ExprNode::constant),
            (UnaryOp::Sqrt, ExprNode::Const(c)) if *c >= 0 => {
                exact_sqrt(*c).map(ExprNode::constant)
            }
            _ => None,
        }
    }

    fn binary_rule(
        &self,
        op: BinaryOp,
        left: &NodeRef,
        right: &NodeRef,
        depth: usize,
    ) -> Option<NodeRef> {
        let lc = left.as_const();
        let rc = right.as_const();

        if let (Some(a), Some(b)) = (lc, rc) {
            if let Some(folded) = fold_pair(op, a, b) {
                return Some(ExprNode::constant(folded));
            }
        }

        match op {
            BinaryOp::Add => {
                if rc == Some(0) {
                    return Some(Arc::clone(left));
                }
                if lc == Some(0) {
                    return Some(Arc::clone(right));
                }
                if let Some(k) = rc.filter(|k| *k < 0).and_then(i64::checked_neg) {
                    return Some(self.reduce_binary(
                        BinaryOp::Sub,
                        Arc::clone(left),
                        ExprNode::constant(k),
                        depth + 1,
                    ));
                }
                if let ExprNode::Unary {
                    op: UnaryOp::Neg,
                    child,
                } = right.as_ref()
                {
                    return Some(self.reduce_binary(
                        BinaryOp::Sub,
                        Arc::clone(left),
                        Arc::clone(child),
                        depth + 1,
                    ));
                }
            }
            BinaryOp::Sub => {
                if rc == Some(0) {
                    return Some(Arc::clone(left));
                }
                if lc == Some(0) {
                    return Some(self.reduce_unary(UnaryOp::Neg, Arc::clone(right), depth + 1));
                }
                if let Some(k) = rc.filter(|k| *k < 0).and_then(i64::checked_neg) {
                    return Some(self.reduce_binary(
                        BinaryOp::Add,
                        Arc::clone(left),
                        ExprNode::constant(k),
                        depth + 1,
                    ));
                }
                if let ExprNode::Unary {
                    op: UnaryOp::Neg,
                    child,
                } = right.as_ref()
                {
                    return Some(self.reduce_binary(
                        BinaryOp::Add,
                        Arc::clone(left),
                        Arc::clone(child),
                        depth + 1,
                    ));
                }
                if left.structurally_eq(right) {
                    return Some(ExprNode::constant(0));
                }
            }
            BinaryOp::Mul => {
                if rc == Some(0) || lc == Some(0) {
                    return Some(ExprNode::constant(0));
                }
                if rc == Some(1) {
                    return Some(Arc::clone(left));
                }
                if lc == Some(1) {
                    return Some(Arc::clone(right));
                }
                if rc == Some(-1) {
                    return Some(self.reduce_unary(UnaryOp::Neg, Arc::clone(left), depth + 1));
                }
                if lc == Some(-1) {
                    return Some(self.reduce_unary(UnaryOp::Neg, Arc::clone(right), depth + 1));
                }
            }
            BinaryOp::Div => {
                if rc == Some(1) {
                    return Some(Arc::clone(left));
                }
                if lc == Some(0) {
                    return Some(ExprNode::constant(0));
                }
                if left.structurally_eq(right) {
                    return Some(ExprNode::constant(1));
                }
            }
            BinaryOp::Pow => {
                if rc == Some(0) || lc == Some(1) {
                    return Some(ExprNode::constant(1));
                }
                if rc == Some(1) {
                    return Some(Arc::clone(left));
                }
                if lc == Some(0) {
                    return Some(ExprNode::constant(0));
                }
            }
            BinaryOp::Binomial => {}
        }

        None
    }

    fn fold_constants(&self, node: &NodeRef, evaluator: &Evaluator, depth: usize) -> NodeRef {
        if depth > self.config.max_depth {
            return Arc::clone(node);
        }

        if !node.contains_var_within(self.config.max_depth) {
            if node.as_const().is_some() {
                return Arc::clone(node);
            }
            return match evaluator.evaluate_at(node, 0) {
                Ok(value) => match fold_to_integer(&value) {
                    Some(folded) => ExprNode::constant(folded),
                    None => Arc::clone(node),
                },
                Err(err) => {
                    trace!("kept {node} unfolded: {err}");
                    Arc::clone(node)
                }
            };
        }

        match node.as_ref() {
            ExprNode::Var | ExprNode::Const(_) => Arc::clone(node),
            ExprNode::Unary { op, child } => {
                let child_f = self.fold_constants(child, evaluator, depth + 1);
                if Arc::ptr_eq(&child_f, child) {
                    Arc::clone(node)
                } else {
                    ExprNode::unary(*op, child_f)
                }
            }
            ExprNode::Binary { op, left, right } => {
                let left_f = self.fold_constants(left, evaluator, depth + 1);
                let right_f = self.fold_constants(right, evaluator, depth + 1);
                if Arc::ptr_eq(&left_f, left) && Arc::ptr_eq(&right_f, right) {
                    Arc::clone(node)
                } else {
                    ExprNode::binary(*op, left_f, right_f)
                }
            }
        }
    }
}

/// Integer replacement for a numerically evaluated constant subtree
///
/// Exact integers are kept as they are. Other values round half away from
/// zero, unless the rounded value is 0 or lands on an `i64` bound.
fn fold_to_integer(value: &Float) -> Option<i64> {
    if let Some(exact) = math::to_i64_exact(value) {
        return Some(exact);
    }
    let rounded = math::to_i64_exact(&math::round_half_away(value))?;
    if rounded == 0 || rounded == i64::MIN || rounded == i64::MAX {
        return None;
    }
    Some(rounded)
}

/// Checked folding of two literals; `None` leaves the node alone
fn fold_pair(op: BinaryOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => None,
        BinaryOp::Div => match a.checked_rem(b) {
            Some(0) => a.checked_div(b),
            _ => None,
        },
        BinaryOp::Pow if (0..=MAX_FOLDED_EXPONENT).contains(&b) => {
            (0..b).try_fold(1i64, |acc, _| acc.checked_mul(a))
        }
        BinaryOp::Pow | BinaryOp::Binomial => None,
    }
}

fn falling_product(k: i64, step: i64) -> i64 {
    let mut product = 1i64;
    let mut i = k;
    while i >= 2 {
        product *= i;
        i -= step;
    }
    product
}

fn exact_sqrt(value: i64) -> Option<i64> {
    let estimate = (value as f64).sqrt() as i64;
    (estimate.saturating_sub(1)..=estimate + 1)
        .find(|root| *root >= 0 && root.checked_mul(*root) == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simplify(node: NodeRef) -> String {
        Simplifier::default().simplify(&node).canonical()
    }

    fn c(value: i64) -> NodeRef {
        ExprNode::constant(value)
    }

    fn n() -> NodeRef {
        ExprNode::var()
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(simplify(ExprNode::add(c(3), c(4))), "7");
        assert_eq!(simplify(ExprNode::pow(c(2), c(10))), "1024");
        assert_eq!(simplify(ExprNode::factorial(c(20))), "2432902008176640000");
        assert_eq!(simplify(ExprNode::factorial(c(21))), "fact(21)");
        assert_eq!(simplify(ExprNode::div(c(7), c(2))), "(7 / 2)");
        assert_eq!(simplify(ExprNode::div(c(8), c(2))), "4");
        assert_eq!(simplify(ExprNode::unary(UnaryOp::DoubleFactorial, c(7))), "105");
        assert_eq!(simplify(ExprNode::unary(UnaryOp::AltSign, c(3))), "-1");
        assert_eq!(simplify(ExprNode::unary(UnaryOp::Sqrt, c(49))), "7");
        assert_eq!(simplify(ExprNode::unary(UnaryOp::Sqrt, c(50))), "sqrt(50)");
    }

    #[test]
    fn test_folding_skips_overflow() {
        assert_eq!(simplify(ExprNode::neg(c(i64::MIN))), "neg(-9223372036854775808)");
        assert_eq!(
            simplify(ExprNode::add(c(i64::MAX), c(1))),
            "(9223372036854775807 + 1)"
        );
        assert_eq!(simplify(ExprNode::pow(c(10), c(19))), "(10 ^ 19)");
        assert_eq!(simplify(ExprNode::div(c(5), c(0))), "(5 / 0)");
    }

    #[test]
    fn test_identities() {
        assert_eq!(simplify(ExprNode::add(n(), c(0))), "n");
        assert_eq!(simplify(ExprNode::mul(c(1), n())), "n");
        assert_eq!(simplify(ExprNode::mul(n(), c(0))), "0");
        assert_eq!(simplify(ExprNode::mul(n(), c(-1))), "neg(n)");
        assert_eq!(simplify(ExprNode::sub(c(0), n())), "neg(n)");
        assert_eq!(simplify(ExprNode::add(n(), c(-3))), "(n - 3)");
        assert_eq!(simplify(ExprNode::sub(n(), c(-3))), "(n + 3)");
        assert_eq!(simplify(ExprNode::add(n(), ExprNode::neg(n()))), "0");
        assert_eq!(simplify(ExprNode::pow(n(), c(1))), "n");
        assert_eq!(simplify(ExprNode::pow(n(), c(0))), "1");
        assert_eq!(simplify(ExprNode::neg(ExprNode::neg(n()))), "n");

        let square = || ExprNode::pow(n(), c(2));
        assert_eq!(simplify(ExprNode::div(square(), square())), "1");
        assert_eq!(simplify(ExprNode::sub(square(), square())), "0");
    }

    #[test]
    fn test_cascading_rewrites() {
        // ((n * 1) + (2 * 3)) - 6 -> (n + 6) - 6
        let tree = ExprNode::sub(
            ExprNode::add(ExprNode::mul(n(), c(1)), ExprNode::mul(c(2), c(3))),
            c(6),
        );
        assert_eq!(simplify(tree), "((n + 6) - 6)");

        // 1 * (0 - (n - n)) -> 0
        let collapse = ExprNode::mul(c(1), ExprNode::sub(c(0), ExprNode::sub(n(), n())));
        assert_eq!(simplify(collapse), "0");
    }

    #[test]
    fn test_unchanged_subtrees_are_shared() {
        let shared = ExprNode::factorial(n());
        let tree = ExprNode::add(ExprNode::mul(c(2), c(3)), Arc::clone(&shared));
        let simplified = Simplifier::default().simplify(&tree);
        match simplified.as_ref() {
            ExprNode::Binary { right, .. } => assert!(Arc::ptr_eq(right, &shared)),
            other => panic!("unexpected shape {other}"),
        }
    }

    #[test]
    fn test_idempotent() {
        let tree = ExprNode::div(
            ExprNode::sub(ExprNode::mul(c(4), n()), ExprNode::neg(c(2))),
            ExprNode::pow(ExprNode::add(n(), c(0)), c(1)),
        );
        let simplifier = Simplifier::default();
        let once = simplifier.simplify(&tree);
        let twice = simplifier.simplify(&once);
        assert_eq!(once.canonical(), twice.canonical());
        assert_eq!(once.canonical(), "(((4 * n) + 2) / n)");
    }

    #[test]
    fn test_numeric_folding() {
        let simplifier = Simplifier::default();
        let evaluator = Evaluator::with_precision(128);

        // sqrt(50) rounds to 7
        let root = ExprNode::mul(ExprNode::unary(UnaryOp::Sqrt, c(50)), n());
        assert_eq!(simplifier.simplify_numeric(&root, &evaluator).canonical(), "(7 * n)");

        // ln(2) rounds to 1, then 1 * n -> n
        let ln = ExprNode::mul(ExprNode::unary(UnaryOp::Ln, c(2)), n());
        assert_eq!(simplifier.simplify_numeric(&ln, &evaluator).canonical(), "n");

        // 1/3 rounds to 0 and is kept
        let third = ExprNode::add(n(), ExprNode::div(c(1), c(3)));
        assert_eq!(
            simplifier.simplify_numeric(&third, &evaluator).canonical(),
            "(n + (1 / 3))"
        );

        // an evaluation error leaves the subtree alone
        let undefined = ExprNode::add(n(), ExprNode::unary(UnaryOp::Ln, c(0)));
        assert_eq!(
            simplifier.simplify_numeric(&undefined, &evaluator).canonical(),
            "(n + ln(0))"
        );
    }

    #[test]
    fn test_pass_budget() {
        let simplifier = Simplifier::new(SimplifyConfig {
            max_passes: 0,
            ..SimplifyConfig::default()
        });
        let tree = ExprNode::add(c(1), c(2));
        assert_eq!(simplifier.simplify(&tree).canonical(), "(1 + 2)");
    }
}
