// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rendering: LaTeX output and the canonical string form
//!
//! The LaTeX form re-parses to a structurally equal tree. The canonical form
//! (`Display`) is fully parenthesized and is the only equality key used by
//! the engine.
//!
//! Both renderers walk the tree with an explicit work stack, so trees of any
//! depth render without growing the call stack.

use super::{BinaryOp, ExprNode, UnaryOp};
use std::fmt;

// Binding strength of the outermost construct of a rendered node
const ADDITIVE: u8 = 1;
const MULTIPLICATIVE: u8 = 2;
const PREFIX: u8 = 3;
const POSTFIX: u8 = 4;
const PRIMARY: u8 = 5;

/// Pending output of a stack-driven render
enum Piece<'a> {
    Node(&'a ExprNode),
    Text(&'static str),
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(node) => node,
            };
            match node {
                ExprNode::Var => f.write_str("n")?,
                ExprNode::Const(value) => write!(f, "{value}")?,
                ExprNode::Unary { op, child } => {
                    f.write_str(op.name())?;
                    f.write_str("(")?;
                    stack.extend([Piece::Text(")"), Piece::Node(child)]);
                }
                ExprNode::Binary {
                    op: BinaryOp::Binomial,
                    left,
                    right,
                } => {
                    f.write_str("binom(")?;
                    stack.extend([
                        Piece::Text(")"),
                        Piece::Node(right),
                        Piece::Text(", "),
                        Piece::Node(left),
                    ]);
                }
                ExprNode::Binary { op, left, right } => {
                    f.write_str("(")?;
                    stack.extend([
                        Piece::Text(")"),
                        Piece::Node(right),
                        Piece::Text(" "),
                        Piece::Text(op.symbol()),
                        Piece::Text(" "),
                        Piece::Node(left),
                    ]);
                }
            }
        }
        Ok(())
    }
}

impl ExprNode {
    /// Render as LaTeX accepted by the parser
    pub fn to_latex(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Node(node) => expand_latex(node, &mut out, &mut stack),
            }
        }
        out
    }
}

fn precedence(node: &ExprNode) -> u8 {
    match node {
        ExprNode::Binary {
            op: BinaryOp::Add | BinaryOp::Sub,
            ..
        } => ADDITIVE,
        ExprNode::Binary {
            op: BinaryOp::Mul, ..
        } => MULTIPLICATIVE,
        ExprNode::Unary {
            op: UnaryOp::Neg, ..
        } => PREFIX,
        ExprNode::Const(value) if *value < 0 => PREFIX,
        ExprNode::Unary {
            op: UnaryOp::Factorial | UnaryOp::DoubleFactorial,
            ..
        }
        | ExprNode::Binary {
            op: BinaryOp::Pow, ..
        } => POSTFIX,
        _ => PRIMARY,
    }
}

fn is_factorial(node: &ExprNode) -> bool {
    matches!(
        node,
        ExprNode::Unary {
            op: UnaryOp::Factorial | UnaryOp::DoubleFactorial,
            ..
        }
    )
}

/// Delimiters around the operand of `!`, `!!` or `^`
///
/// Negative literals are braced so `{-1}^{n}` never reads as the `(-1)^{…}`
/// sign prefix, and stacked factorials are braced so `{n!}!` stays distinct
/// from `n!!`.
fn postfix_delimiters(node: &ExprNode, factorial_op: bool) -> Option<(&'static str, &'static str)> {
    let braced = matches!(node, ExprNode::Const(value) if *value < 0)
        || (factorial_op && is_factorial(node));
    if braced {
        Some(("{", "}"))
    } else if precedence(node) < POSTFIX {
        Some(("(", ")"))
    } else {
        None
    }
}

/// Whether the LaTeX of `node` begins with a digit
fn starts_with_digit(mut node: &ExprNode) -> bool {
    loop {
        node = match node {
            ExprNode::Const(value) => return *value >= 0,
            ExprNode::Unary {
                op: UnaryOp::Factorial | UnaryOp::DoubleFactorial,
                child,
            } if postfix_delimiters(child, true).is_none() => child.as_ref(),
            ExprNode::Binary {
                op: BinaryOp::Pow,
                left,
                ..
            } if postfix_delimiters(left, false).is_none() => left.as_ref(),
            ExprNode::Binary {
                op: BinaryOp::Add | BinaryOp::Sub,
                left,
                ..
            } => left.as_ref(),
            ExprNode::Binary {
                op: BinaryOp::Mul,
                left,
                ..
            } if precedence(left) >= MULTIPLICATIVE => left.as_ref(),
            _ => return false,
        };
    }
}

fn push_wrapped<'a>(
    stack: &mut Vec<Piece<'a>>,
    delimiters: Option<(&'static str, &'static str)>,
    node: &'a ExprNode,
) {
    match delimiters {
        Some((open, close)) => stack.extend([Piece::Text(close), Piece::Node(node), Piece::Text(open)]),
        None => stack.push(Piece::Node(node)),
    }
}

fn parens_below(node: &ExprNode, min_precedence: u8) -> Option<(&'static str, &'static str)> {
    (precedence(node) < min_precedence).then_some(("(", ")"))
}

// Writes the leading text of `node` and pushes the rest in reverse order
fn expand_latex<'a>(node: &'a ExprNode, out: &mut String, stack: &mut Vec<Piece<'a>>) {
    match node {
        ExprNode::Var => out.push('n'),
        ExprNode::Const(value) => out.push_str(&value.to_string()),
        ExprNode::Unary { op, child } => expand_unary(*op, child, out, stack),
        ExprNode::Binary { op, left, right } => {
            let (symbol, left_min, right_min) = match op {
                BinaryOp::Add => (" + ", ADDITIVE, MULTIPLICATIVE),
                BinaryOp::Sub => (" - ", ADDITIVE, MULTIPLICATIVE),
                BinaryOp::Mul => (" \\cdot ", MULTIPLICATIVE, PREFIX),
                BinaryOp::Div | BinaryOp::Binomial => {
                    out.push_str(if *op == BinaryOp::Div { "\\frac{" } else { "\\binom{" });
                    stack.extend([
                        Piece::Text("}"),
                        Piece::Node(right),
                        Piece::Text("}{"),
                        Piece::Node(left),
                    ]);
                    return;
                }
                BinaryOp::Pow => {
                    stack.extend([Piece::Text("}"), Piece::Node(right), Piece::Text("^{")]);
                    push_wrapped(stack, postfix_delimiters(left, false), left);
                    return;
                }
            };
            push_wrapped(stack, parens_below(right, right_min), right);
            stack.push(Piece::Text(symbol));
            push_wrapped(stack, parens_below(left, left_min), left);
        }
    }
}

fn expand_unary<'a>(op: UnaryOp, child: &'a ExprNode, out: &mut String, stack: &mut Vec<Piece<'a>>) {
    let (open, close) = match op {
        UnaryOp::Neg => {
            out.push('-');
            let delimiters = parens_below(child, PREFIX).or_else(|| {
                // `-3` would re-parse as a negative literal
                starts_with_digit(child).then_some(("{", "}"))
            });
            push_wrapped(stack, delimiters, child);
            return;
        }
        UnaryOp::Factorial | UnaryOp::DoubleFactorial => {
            stack.push(Piece::Text(if op == UnaryOp::Factorial { "!" } else { "!!" }));
            push_wrapped(stack, postfix_delimiters(child, true), child);
            return;
        }
        UnaryOp::AltSign => ("(-1)^{", "}"),
        UnaryOp::Fibonacci => ("F_{", "}"),
        UnaryOp::Sin => ("\\sin{(", ")}"),
        UnaryOp::Cos => ("\\cos{(", ")}"),
        UnaryOp::Ln => ("\\ln{(", ")}"),
        UnaryOp::Floor => ("\\lfloor ", " \\rfloor"),
        UnaryOp::Ceil => ("\\lceil ", " \\rceil"),
        UnaryOp::Abs => ("|", "|"),
        UnaryOp::Sqrt => ("\\sqrt{", "}"),
    };
    out.push_str(open);
    stack.extend([Piece::Text(close), Piece::Node(child)]);
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, ExprNode, UnaryOp};

    #[test]
    fn test_canonical_form() {
        let tree = ExprNode::binary(
            BinaryOp::Binomial,
            ExprNode::var(),
            ExprNode::unary(UnaryOp::Neg, ExprNode::constant(-2)),
        );
        assert_eq!(tree.to_string(), "binom(n, neg(-2))");
    }

    #[test]
    fn test_latex_basic() {
        let tree = ExprNode::div(
            ExprNode::unary(UnaryOp::AltSign, ExprNode::var()),
            ExprNode::add(
                ExprNode::mul(ExprNode::constant(2), ExprNode::var()),
                ExprNode::constant(1),
            ),
        );
        assert_eq!(tree.to_latex(), "\\frac{(-1)^{n}}{2 \\cdot n + 1}");
    }

    #[test]
    fn test_latex_parenthesizes_lower_precedence() {
        let tree = ExprNode::mul(
            ExprNode::sub(ExprNode::var(), ExprNode::constant(1)),
            ExprNode::add(ExprNode::var(), ExprNode::constant(1)),
        );
        assert_eq!(tree.to_latex(), "(n - 1) \\cdot (n + 1)");

        let right_nested = ExprNode::sub(
            ExprNode::var(),
            ExprNode::sub(ExprNode::var(), ExprNode::constant(1)),
        );
        assert_eq!(right_nested.to_latex(), "n - (n - 1)");
    }

    #[test]
    fn test_latex_disambiguates_negatives() {
        let neg_literal_base = ExprNode::pow(ExprNode::constant(-1), ExprNode::var());
        assert_eq!(neg_literal_base.to_latex(), "{-1}^{n}");

        let negated_literal = ExprNode::neg(ExprNode::constant(3));
        assert_eq!(negated_literal.to_latex(), "-{3}");

        let negated_power = ExprNode::neg(ExprNode::pow(ExprNode::constant(2), ExprNode::var()));
        assert_eq!(negated_power.to_latex(), "-{2^{n}}");

        let power_of_negation = ExprNode::pow(ExprNode::neg(ExprNode::var()), ExprNode::constant(2));
        assert_eq!(power_of_negation.to_latex(), "(-n)^{2}");
    }

    #[test]
    fn test_deep_chain_renders_iteratively() {
        let chain = (0..100_000).fold(ExprNode::var(), |node, _| ExprNode::neg(node));

        let canonical = chain.canonical();
        assert!(canonical.starts_with("neg(neg("));
        assert_eq!(canonical.len(), 100_000 * "neg()".len() + 1);

        let latex = chain.to_latex();
        assert_eq!(latex.len(), 100_001);
        assert!(latex.ends_with("--n"));
    }

    #[test]
    fn test_latex_digit_lead_through_postfix() {
        let tree = ExprNode::neg(ExprNode::factorial(ExprNode::mul(
            ExprNode::constant(2),
            ExprNode::var(),
        )));
        assert_eq!(tree.to_latex(), "-(2 \\cdot n)!");

        let tree = ExprNode::neg(ExprNode::mul(
            ExprNode::factorial(ExprNode::constant(3)),
            ExprNode::var(),
        ));
        assert_eq!(tree.to_latex(), "-(3! \\cdot n)");

        let tree = ExprNode::neg(ExprNode::pow(
            ExprNode::factorial(ExprNode::constant(3)),
            ExprNode::var(),
        ));
        assert_eq!(tree.to_latex(), "-{3!^{n}}");
    }

    #[test]
    fn test_latex_stacked_factorials() {
        let stacked = ExprNode::factorial(ExprNode::factorial(ExprNode::var()));
        assert_eq!(stacked.to_latex(), "{n!}!");

        let double = ExprNode::unary(UnaryOp::DoubleFactorial, ExprNode::var());
        assert_eq!(double.to_latex(), "n!!");
    }
}
