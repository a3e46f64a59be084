// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! genseries
//!
//! Symbolic expression engine for genetic search of closed-form series.
//! Parses LaTeX series formulas into immutable expression trees, renders
//! them back to LaTeX and to a canonical string, simplifies them
//! algebraically and numerically, and evaluates them at arbitrary precision.

pub mod ast;
pub mod cli;
pub mod config;
pub mod io;
pub mod series;
pub mod utils;

pub use ast::{
    BinaryOp, EvalConfig, EvalError, Evaluator, ExprNode, NodeRef, SimplifyConfig, Simplifier,
    UnaryOp,
};
pub use config::EngineConfig;
pub use io::{parse_candidate, parse_expr, SyntaxError, SyntaxErrorKind};
pub use series::Candidate;

/// Parse a series formula and simplify it with default settings
pub fn simplify_latex(source: &str) -> Result<Candidate, SyntaxError> {
    let candidate = parse_candidate(source)?;
    Ok(candidate.simplified(&Simplifier::default()))
}
