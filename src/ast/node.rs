// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Expression node definitions

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Shared, immutable reference to a node
pub type NodeRef = Arc<ExprNode>;

/// Depth ceiling used by [`ExprNode::contains_var`]
pub const DEFAULT_VAR_SCAN_DEPTH: usize = 100;

/// A node of a series-term expression tree
///
/// Trees are immutable: every transformation builds a new tree and shares
/// untouched subtrees through [`NodeRef`]. Two trees are equal when their
/// canonical strings are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprNode {
    /// The bound index variable `n`
    Var,

    /// Exact integer literal
    Const(i64),

    Unary {
        op: UnaryOp,
        child: NodeRef,
    },

    Binary {
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
    },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Factorial,
    DoubleFactorial,
    /// (-1)^x
    AltSign,
    Fibonacci,
    Sin,
    Cos,
    Ln,
    Floor,
    Ceil,
    Abs,
    Sqrt,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 12] = [
        UnaryOp::Neg,
        UnaryOp::Factorial,
        UnaryOp::DoubleFactorial,
        UnaryOp::AltSign,
        UnaryOp::Fibonacci,
        UnaryOp::Sin,
        UnaryOp::Cos,
        UnaryOp::Ln,
        UnaryOp::Floor,
        UnaryOp::Ceil,
        UnaryOp::Abs,
        UnaryOp::Sqrt,
    ];

    /// Name used in the canonical string form
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Factorial => "fact",
            UnaryOp::DoubleFactorial => "dfact",
            UnaryOp::AltSign => "altsign",
            UnaryOp::Fibonacci => "fib",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Ln => "ln",
            UnaryOp::Floor => "floor",
            UnaryOp::Ceil => "ceil",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Binomial,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 6] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Pow,
        BinaryOp::Binomial,
    ];

    /// Infix symbol used in the canonical string form
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Binomial => "binom",
        }
    }
}

/// Address of a constant leaf inside a tree
///
/// A handle is the sequence of child indices from the root (0 = unary child
/// or left operand, 1 = right operand). Handles are only meaningful for the
/// tree they were taken from; a stale handle is simply rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstHandle {
    path: Vec<u8>,
}

impl ConstHandle {
    /// Depth of the addressed leaf
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

impl ExprNode {
    pub fn var() -> NodeRef {
        Arc::new(ExprNode::Var)
    }

    pub fn constant(value: i64) -> NodeRef {
        Arc::new(ExprNode::Const(value))
    }

    pub fn unary(op: UnaryOp, child: NodeRef) -> NodeRef {
        Arc::new(ExprNode::Unary { op, child })
    }

    pub fn binary(op: BinaryOp, left: NodeRef, right: NodeRef) -> NodeRef {
        Arc::new(ExprNode::Binary { op, left, right })
    }

    pub fn add(left: NodeRef, right: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::Add, left, right)
    }

    pub fn sub(left: NodeRef, right: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::Sub, left, right)
    }

    pub fn mul(left: NodeRef, right: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::Mul, left, right)
    }

    pub fn div(left: NodeRef, right: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::Div, left, right)
    }

    pub fn pow(base: NodeRef, exponent: NodeRef) -> NodeRef {
        Self::binary(BinaryOp::Pow, base, exponent)
    }

    pub fn neg(child: NodeRef) -> NodeRef {
        Self::unary(UnaryOp::Neg, child)
    }

    pub fn factorial(child: NodeRef) -> NodeRef {
        Self::unary(UnaryOp::Factorial, child)
    }

    /// Value of a `Const` node
    pub fn as_const(&self) -> Option<i64> {
        match self {
            ExprNode::Const(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_const(&self, value: i64) -> bool {
        self.as_const() == Some(value)
    }

    /// Canonical string form, the structural-equality key
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Structural equality through canonical rendering
    pub fn structurally_eq(&self, other: &ExprNode) -> bool {
        std::ptr::eq(self, other) || self.canonical() == other.canonical()
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            match node {
                ExprNode::Var | ExprNode::Const(_) => {}
                ExprNode::Unary { child, .. } => stack.push(child.as_ref()),
                ExprNode::Binary { left, right, .. } => stack.extend([right.as_ref(), left.as_ref()]),
            }
        }
        count
    }

    /// Length of the longest root-to-leaf path, counting nodes
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match node {
                ExprNode::Var | ExprNode::Const(_) => {}
                ExprNode::Unary { child, .. } => stack.push((child.as_ref(), depth + 1)),
                ExprNode::Binary { left, right, .. } => {
                    stack.extend([(right.as_ref(), depth + 1), (left.as_ref(), depth + 1)])
                }
            }
        }
        deepest
    }

    /// Whether the bound variable occurs in the tree
    ///
    /// Conservatively answers `true` for trees deeper than
    /// [`DEFAULT_VAR_SCAN_DEPTH`].
    pub fn contains_var(&self) -> bool {
        self.contains_var_within(DEFAULT_VAR_SCAN_DEPTH)
    }

    /// [`ExprNode::contains_var`] with an explicit depth ceiling
    pub fn contains_var_within(&self, max_depth: usize) -> bool {
        self.scan_var(0, max_depth)
    }

    fn scan_var(&self, depth: usize, max_depth: usize) -> bool {
        if depth > max_depth {
            return true;
        }
        match self {
            ExprNode::Var => true,
            ExprNode::Const(_) => false,
            ExprNode::Unary { child, .. } => child.scan_var(depth + 1, max_depth),
            ExprNode::Binary { left, right, .. } => {
                left.scan_var(depth + 1, max_depth) || right.scan_var(depth + 1, max_depth)
            }
        }
    }

    /// Handles to every constant leaf, in pre-order
    pub fn const_handles(&self) -> Vec<ConstHandle> {
        enum Walk<'a> {
            Enter(&'a ExprNode, Option<u8>),
            Leave,
        }

        let mut handles = Vec::new();
        let mut path = Vec::new();
        let mut stack = vec![Walk::Enter(self, None)];
        while let Some(step) = stack.pop() {
            let (node, index) = match step {
                Walk::Leave => {
                    path.pop();
                    continue;
                }
                Walk::Enter(node, index) => (node, index),
            };
            if let Some(index) = index {
                path.push(index);
                stack.push(Walk::Leave);
            }
            match node {
                ExprNode::Var => {}
                ExprNode::Const(_) => handles.push(ConstHandle { path: path.clone() }),
                ExprNode::Unary { child, .. } => stack.push(Walk::Enter(child.as_ref(), Some(0))),
                ExprNode::Binary { left, right, .. } => stack.extend([
                    Walk::Enter(right.as_ref(), Some(1)),
                    Walk::Enter(left.as_ref(), Some(0)),
                ]),
            }
        }
        handles
    }

    /// Read the constant addressed by a handle
    pub fn const_at(&self, handle: &ConstHandle) -> Option<i64> {
        let mut node = self;
        for &step in &handle.path {
            node = match (node, step) {
                (ExprNode::Unary { child, .. }, 0) => child.as_ref(),
                (ExprNode::Binary { left, .. }, 0) => left.as_ref(),
                (ExprNode::Binary { right, .. }, 1) => right.as_ref(),
                _ => return None,
            };
        }
        node.as_const()
    }
}

/// Overwrite the constant addressed by `handle`
///
/// Nodes along the path are cloned when shared with another tree, so no
/// other holder of the original subtrees observes the change. Returns
/// `false` for a stale handle.
pub fn set_const(root: &mut NodeRef, handle: &ConstHandle, value: i64) -> bool {
    if root.const_at(handle).is_none() {
        return false;
    }

    let mut node: &mut NodeRef = root;
    for &step in &handle.path {
        node = match (Arc::make_mut(node), step) {
            (ExprNode::Unary { child, .. }, 0) => child,
            (ExprNode::Binary { left, .. }, 0) => left,
            (ExprNode::Binary { right, .. }, 1) => right,
            _ => return false,
        };
    }

    match Arc::make_mut(node) {
        ExprNode::Const(slot) => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// Shared leaf left behind in a node whose child was detached for dropping
fn detached_leaf() -> NodeRef {
    static LEAF: OnceLock<NodeRef> = OnceLock::new();
    Arc::clone(LEAF.get_or_init(|| Arc::new(ExprNode::Var)))
}

impl ExprNode {
    // Moves out every child this node owns exclusively
    fn detach_owned_children(&mut self, out: &mut Vec<NodeRef>) {
        let mut detach = |slot: &mut NodeRef| {
            if Arc::get_mut(slot).is_some() {
                out.push(std::mem::replace(slot, detached_leaf()));
            }
        };
        match self {
            ExprNode::Var | ExprNode::Const(_) => {}
            ExprNode::Unary { child, .. } => detach(child),
            ExprNode::Binary { left, right, .. } => {
                detach(left);
                detach(right);
            }
        }
    }
}

// Long chains would otherwise be released by one nested drop per level
impl Drop for ExprNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_owned_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            if let Some(inner) = Arc::get_mut(&mut node) {
                inner.detach_owned_children(&mut pending);
            }
        }
    }
}

impl PartialEq for ExprNode {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other)
    }
}

impl Eq for ExprNode {}
