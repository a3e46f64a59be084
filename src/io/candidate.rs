// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Series parser: `[COEFF] \sum_{VAR=START}^{\infty} BODY`
//!
//! The body is split at its outermost fractions into a numerator and a
//! denominator; a coefficient written before `\sum` is folded into both.

use super::parser::{
    parse_expr, LatexParser, SyntaxError, SyntaxErrorKind, CANONICAL_VAR,
};
use crate::ast::{BinaryOp, ExprNode, NodeRef};
use crate::series::Candidate;
use log::trace;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SUM_PREFIX: &str = "\\sum_{";

/// How a summation variable other than `n` is bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substitution {
    /// Replace every occurrence of the letter after `VAR=` with `n`
    ///
    /// Also rewrites the letter inside command names, so `i` corrupts
    /// `\infty` and `\sin`.
    #[default]
    Textual,
    /// Parse the body with the letter itself bound to the variable
    Scoped,
}

/// Parse a series formula with textual variable substitution
pub fn parse_candidate(source: &str) -> Result<Candidate, SyntaxError> {
    parse_candidate_with(source, Substitution::default())
}

pub fn parse_candidate_with(
    source: &str,
    substitution: Substitution,
) -> Result<Candidate, SyntaxError> {
    let mut text = source.split_whitespace().collect::<Vec<_>>().join(" ");

    let sum_idx = text
        .find(SUM_PREFIX)
        .ok_or_else(|| SyntaxError::new(SyntaxErrorKind::MissingSum, &text, 0))?;
    let var_pos = sum_idx + SUM_PREFIX.len();

    let var = match text.as_bytes().get(var_pos..var_pos + 2) {
        Some(&[letter, b'=']) if letter.is_ascii_alphabetic() => letter,
        _ => {
            return Err(SyntaxError::new(
                SyntaxErrorKind::InvalidSumVariable,
                &text,
                var_pos,
            ))
        }
    };

    let mut body_var = CANONICAL_VAR;
    if var != CANONICAL_VAR {
        match substitution {
            Substitution::Textual => {
                let tail = text[var_pos + 2..].replace(var as char, "n");
                text = format!("{}n={}", &text[..var_pos], tail);
            }
            Substitution::Scoped => body_var = var,
        }
    }

    let prefix = text[..sum_idx].trim();
    let coefficient = if prefix.is_empty() {
        None
    } else {
        Some(split_fraction(&parse_expr(prefix)?))
    };

    let mut parser = LatexParser::with_var(&text, body_var);
    parser.seek(var_pos + 2);
    parser.skip_spaces();
    let start = parser.parse_integer()?;
    parser.expect("}")?;
    parser.expect("^")?;
    parser.skip_spaces();
    if parser.eat("{") {
        parser.expect("\\infty")?;
        parser.expect("}")?;
    } else {
        parser.expect("\\infty")?;
    }

    parser.skip_spaces();
    if parser.is_at_end() {
        return Err(parser.error(SyntaxErrorKind::MissingBody));
    }
    let body = parser.parse_expr()?;
    parser.finish()?;

    let (mut numerator, mut denominator) = split_fraction(&body);
    if let Some((coeff_num, coeff_den)) = coefficient {
        numerator = multiply_skipping_one(coeff_num, numerator);
        denominator = multiply_skipping_one(coeff_den, denominator);
    }

    let candidate = Candidate::new(numerator, denominator, start);
    trace!("parsed series {candidate}");
    Ok(candidate)
}

/// Split a tree at its outermost fractions into (numerator, denominator)
///
/// `a/b` gives `(a, b)`; a product splits both factors and multiplies the
/// parts; anything else is its own numerator over `1`.
pub fn split_fraction(node: &NodeRef) -> (NodeRef, NodeRef) {
    match node.as_ref() {
        ExprNode::Binary {
            op: BinaryOp::Div,
            left,
            right,
        } => (Arc::clone(left), Arc::clone(right)),
        ExprNode::Binary {
            op: BinaryOp::Mul,
            left,
            right,
        } => {
            let (left_num, left_den) = split_fraction(left);
            let (right_num, right_den) = split_fraction(right);
            (
                multiply_skipping_one(left_num, right_num),
                multiply_skipping_one(left_den, right_den),
            )
        }
        _ => (Arc::clone(node), ExprNode::constant(1)),
    }
}

/// Product of two trees, dropping a literal `1` factor
pub fn multiply_skipping_one(left: NodeRef, right: NodeRef) -> NodeRef {
    if left.is_const(1) {
        right
    } else if right.is_const(1) {
        left
    } else {
        ExprNode::mul(left, right)
    }
}
