// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - LaTeX parsing of expressions and series

mod candidate;
mod parser;

pub use candidate::{
    multiply_skipping_one, parse_candidate, parse_candidate_with, split_fraction, Substitution,
};
pub use parser::{
    parse_expr, LatexParser, SyntaxError, SyntaxErrorKind, CANONICAL_VAR, MAX_NESTING,
};
