// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Abstract Syntax Tree module
//!
//! Expression trees for series terms, their renderings, evaluation and
//! simplification.

mod evaluator;
mod node;
mod render;
mod simplify;

pub use evaluator::{EvalConfig, EvalError, Evaluator};
pub use node::{set_const, BinaryOp, ConstHandle, ExprNode, NodeRef, UnaryOp, DEFAULT_VAR_SCAN_DEPTH};
pub use simplify::{SimplifyConfig, Simplifier};
