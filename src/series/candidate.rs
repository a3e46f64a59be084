// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Series candidates: Σ_{n=start}^{∞} numerator / denominator

use crate::ast::{set_const, ConstHandle, Evaluator, ExprNode, NodeRef, Simplifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tree of a candidate a constant lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Numerator,
    Denominator,
}

/// Address of a tunable constant inside a candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstLeaf {
    pub side: Side,
    pub handle: ConstHandle,
}

/// A closed-form series `Σ_{n=start}^{∞} numerator / denominator`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub numerator: NodeRef,
    pub denominator: NodeRef,
    pub start: i64,
}

impl Candidate {
    pub fn new(numerator: NodeRef, denominator: NodeRef, start: i64) -> Self {
        Self {
            numerator,
            denominator,
            start,
        }
    }

    pub fn tree(&self, side: Side) -> &NodeRef {
        match side {
            Side::Numerator => &self.numerator,
            Side::Denominator => &self.denominator,
        }
    }

    fn tree_mut(&mut self, side: Side) -> &mut NodeRef {
        match side {
            Side::Numerator => &mut self.numerator,
            Side::Denominator => &mut self.denominator,
        }
    }

    /// `\sum_{n=START}^{\infty} \frac{NUM}{DEN}`
    pub fn to_latex(&self) -> String {
        format!(
            "\\sum_{{n={}}}^{{\\infty}} \\frac{{{}}}{{{}}}",
            self.start,
            self.numerator.to_latex(),
            self.denominator.to_latex()
        )
    }

    /// Canonical string form, the equality key of candidates
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Combined node count of both trees
    pub fn complexity(&self) -> usize {
        self.numerator.node_count() + self.denominator.node_count()
    }

    /// Every constant leaf, numerator first
    pub fn const_leaves(&self) -> Vec<ConstLeaf> {
        [Side::Numerator, Side::Denominator]
            .into_iter()
            .flat_map(|side| {
                self.tree(side)
                    .const_handles()
                    .into_iter()
                    .map(move |handle| ConstLeaf { side, handle })
            })
            .collect()
    }

    pub fn const_value(&self, leaf: &ConstLeaf) -> Option<i64> {
        self.tree(leaf.side).const_at(&leaf.handle)
    }

    /// Overwrite a constant leaf; subtrees shared with other candidates are copied first
    pub fn set_const(&mut self, leaf: &ConstLeaf, value: i64) -> bool {
        set_const(self.tree_mut(leaf.side), &leaf.handle, value)
    }

    pub fn simplified(&self, simplifier: &Simplifier) -> Candidate {
        Candidate::new(
            simplifier.simplify(&self.numerator),
            simplifier.simplify(&self.denominator),
            self.start,
        )
    }

    pub fn simplified_numeric(&self, simplifier: &Simplifier, evaluator: &Evaluator) -> Candidate {
        Candidate::new(
            simplifier.simplify_numeric(&self.numerator, evaluator),
            simplifier.simplify_numeric(&self.denominator, evaluator),
            self.start,
        )
    }

    /// Term of the series as a single tree
    pub fn term(&self) -> NodeRef {
        ExprNode::div(self.numerator.clone(), self.denominator.clone())
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sum(n={}, {} / {})",
            self.start, self.numerator, self.denominator
        )
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.numerator.structurally_eq(&other.numerator)
            && self.denominator.structurally_eq(&other.denominator)
    }
}

impl Eq for Candidate {}
