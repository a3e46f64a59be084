// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! AST Evaluator - computes the value of a term at a given index
//!
//! All arithmetic runs on arbitrary precision binary floats. Operations whose
//! result would be undefined (division by zero, logarithm of a non-positive
//! value, factorial of a fraction) or astronomically large report an
//! [`EvalError`] instead of producing a sentinel value.

use super::{BinaryOp, ExprNode, UnaryOp};
use crate::utils::math::{self, Float};
use dashu::base::SquareRoot;
use dashu::integer::IBig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Refuse powers and binomials whose result would need more binary digits than this
const MAX_RESULT_BITS: f64 = (1u64 << 40) as f64;

/// Binomials whose exact numerator stays under this many bits use integer arithmetic
const EXACT_BINOMIAL_BITS: usize = 1 << 16;

/// Extra bits carried through the rounded binomial product
const BINOMIAL_GUARD_BITS: usize = 64;

/// Evaluation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{op} is undefined for {value}")]
    Domain { op: &'static str, value: String },

    #[error("{op} overflow: {reason}")]
    Overflow { op: &'static str, reason: String },

    #[error("expression nesting exceeds {0} levels")]
    TooDeep(usize),
}

/// Evaluator limits and precision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Working precision in bits
    pub precision: usize,
    pub max_depth: usize,
    /// Largest argument accepted by factorials, Fibonacci and binomials
    pub max_integer_argument: u64,
    /// Largest |exponent| accepted by integer powers
    pub max_exponent: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            precision: 512,
            max_depth: 512,
            max_integer_argument: 10_000,
            max_exponent: 1_000_000,
        }
    }
}

/// Arbitrary precision evaluator
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn with_precision(precision: usize) -> Self {
        Self::new(EvalConfig {
            precision,
            ..EvalConfig::default()
        })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Effective working precision in bits
    pub fn precision(&self) -> usize {
        self.config.precision.max(math::MIN_PRECISION)
    }

    /// Evaluate a tree with the bound variable set to `n`
    pub fn evaluate(&self, node: &ExprNode, n: &Float) -> Result<Float, EvalError> {
        let n = n.clone().with_precision(self.precision()).value();
        self.eval(node, &n, 0)
    }

    /// Evaluate a tree at an integer index
    pub fn evaluate_at(&self, node: &ExprNode, n: i64) -> Result<Float, EvalError> {
        self.eval(node, &math::from_i64(n, self.precision()), 0)
    }

    /// Whether the value of a tree depends on the bound variable
    pub fn depends_on_var(&self, node: &ExprNode) -> bool {
        node.contains_var_within(self.config.max_depth)
    }

    fn eval(&self, node: &ExprNode, n: &Float, depth: usize) -> Result<Float, EvalError> {
        if depth > self.config.max_depth {
            return Err(EvalError::TooDeep(self.config.max_depth));
        }

        match node {
            ExprNode::Var => Ok(n.clone()),
            ExprNode::Const(value) => Ok(math::from_i64(*value, self.precision())),
            ExprNode::Unary { op, child } => {
                let x = self.eval(child, n, depth + 1)?;
                self.apply_unary(*op, x)
            }
            ExprNode::Binary { op, left, right } => {
                let a = self.eval(left, n, depth + 1)?;
                let b = self.eval(right, n, depth + 1)?;
                self.apply_binary(*op, a, b)
            }
        }
    }

    fn apply_unary(&self, op: UnaryOp, x: Float) -> Result<Float, EvalError> {
        let precision = self.precision();
        match op {
            UnaryOp::Neg => Ok(-x),
            UnaryOp::Abs => Ok(math::abs(&x)),
            UnaryOp::Floor => Ok(x.floor()),
            UnaryOp::Ceil => Ok(x.ceil()),
            UnaryOp::Sqrt => {
                if x < Float::ZERO {
                    Err(domain("sqrt", &x))
                } else if x == Float::ZERO {
                    Ok(x)
                } else {
                    Ok(x.sqrt())
                }
            }
            UnaryOp::Ln => {
                if x <= Float::ZERO {
                    Err(domain("ln", &x))
                } else {
                    Ok(x.ln())
                }
            }
            UnaryOp::Sin => math::sin(&x, precision).ok_or_else(|| overflow("sin", "argument too large")),
            UnaryOp::Cos => math::cos(&x, precision).ok_or_else(|| overflow("cos", "argument too large")),
            UnaryOp::Factorial => {
                let k = self.bounded_integer("factorial", &x)?;
                if k < 0 {
                    return Err(domain("factorial", &x));
                }
                Ok(self.falling_product(k, 1))
            }
            UnaryOp::DoubleFactorial => {
                let k = self.bounded_integer("double factorial", &x)?;
                if k < 0 {
                    return Err(domain("double factorial", &x));
                }
                Ok(self.falling_product(k, 2))
            }
            UnaryOp::AltSign => {
                if !math::is_integral(&x) {
                    return Err(domain("altsign", &x));
                }
                let half = &x / &math::from_i64(2, precision);
                let sign = if math::is_integral(&half) { 1 } else { -1 };
                Ok(math::from_i64(sign, precision))
            }
            UnaryOp::Fibonacci => {
                let k = self.bounded_integer("fibonacci", &x)?;
                let magnitude = fibonacci(k.unsigned_abs());
                // F(-k) = (-1)^(k+1) F(k)
                let value = if k < 0 && k % 2 == 0 { -magnitude } else { magnitude };
                Ok(math::from_ibig(value, precision))
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, a: Float, b: Float) -> Result<Float, EvalError> {
        match op {
            BinaryOp::Add => Ok(&a + &b),
            BinaryOp::Sub => Ok(&a - &b),
            BinaryOp::Mul => Ok(&a * &b),
            BinaryOp::Div => {
                if b == Float::ZERO {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(&a / &b)
                }
            }
            BinaryOp::Pow => self.power(a, b),
            BinaryOp::Binomial => self.binomial(a, b),
        }
    }

    /// Integer argument of a combinatorial function, bounded in magnitude
    fn bounded_integer(&self, op: &'static str, x: &Float) -> Result<i64, EvalError> {
        if !math::is_integral(x) {
            return Err(domain(op, x));
        }
        let limit = self.config.max_integer_argument;
        match math::to_i64_exact(x) {
            Some(k) if k.unsigned_abs() <= limit => Ok(k),
            _ => Err(overflow(op, format!("argument exceeds {limit}"))),
        }
    }

    /// k * (k - step) * (k - 2 step) * ... down to 2; 1 for k < 2
    fn falling_product(&self, k: i64, step: i64) -> Float {
        let precision = self.precision();
        let mut product = IBig::ONE;
        let mut i = k;
        while i >= 2 {
            product *= IBig::from(i);
            i -= step;
        }
        math::from_ibig(product, precision)
    }

    fn power(&self, base: Float, exponent: Float) -> Result<Float, EvalError> {
        let precision = self.precision();

        if math::is_integral(&exponent) {
            let limit = self.config.max_exponent;
            let e = match math::to_i64_exact(&exponent) {
                Some(e) if e.unsigned_abs() <= limit => e,
                _ => return Err(overflow("pow", format!("exponent exceeds {limit}"))),
            };

            if base == Float::ZERO {
                return match e.signum() {
                    -1 => Err(EvalError::DivisionByZero),
                    0 => Ok(math::from_i64(1, precision)),
                    _ => Ok(math::from_i64(0, precision)),
                };
            }

            check_magnitude(&base, e.unsigned_abs() as f64)?;
            let magnitude = base.powi(IBig::from(e.unsigned_abs()));
            return Ok(if e < 0 {
                &math::from_i64(1, precision) / &magnitude
            } else {
                magnitude
            });
        }

        if base > Float::ZERO {
            let approx_exponent = exponent.to_f64().value().abs();
            check_magnitude(&base, approx_exponent)?;
            Ok(base.powf(&exponent))
        } else if base == Float::ZERO && exponent > Float::ZERO {
            Ok(math::from_i64(0, precision))
        } else {
            Err(domain("pow", &base))
        }
    }

    fn binomial(&self, top: Float, bottom: Float) -> Result<Float, EvalError> {
        if !math::is_integral(&top) {
            return Err(domain("binomial", &top));
        }
        if !math::is_integral(&bottom) {
            return Err(domain("binomial", &bottom));
        }

        let k = match math::to_i64_exact(&bottom) {
            Some(k) => k,
            None => return Err(overflow("binomial", "lower argument out of range")),
        };
        if k < 0 {
            return Ok(math::from_i64(0, self.precision()));
        }
        let limit = self.config.max_integer_argument;
        if k.unsigned_abs() > limit {
            return Err(overflow("binomial", format!("argument exceeds {limit}")));
        }

        let top_bits = math::integer_bits(&top);
        if (top_bits as f64 + 1.0) * k as f64 > MAX_RESULT_BITS {
            return Err(overflow("binomial", "result magnitude out of range"));
        }

        // Generalized C(top, k) = top (top - 1) ... (top - k + 1) / k!
        if top_bits.saturating_mul(k as usize) <= EXACT_BINOMIAL_BITS {
            let top = math::to_ibig(&top);
            let mut numerator = IBig::ONE;
            let mut denominator = IBig::ONE;
            for i in 0..k {
                numerator *= &top - IBig::from(i);
                denominator *= IBig::from(i + 1);
            }
            return Ok(math::from_ibig(numerator / denominator, self.precision()));
        }

        // Large arguments: running product of (top - i) / (i + 1) at working precision
        let work = self.precision() + BINOMIAL_GUARD_BITS;
        let top = top.with_precision(work).value();
        let mut value = math::from_i64(1, work);
        for i in 0..k {
            let factor = &top - &math::from_i64(i, work);
            value = &(&value * &factor) / &math::from_i64(i + 1, work);
        }
        Ok(value.with_precision(self.precision()).value())
    }
}

fn fibonacci(k: u64) -> IBig {
    let (mut a, mut b) = (IBig::ZERO, IBig::ONE);
    for _ in 0..k {
        let next = &a + &b;
        a = b;
        b = next;
    }
    a
}

fn check_magnitude(base: &Float, exponent: f64) -> Result<(), EvalError> {
    let approx = math::abs(base).to_f64().value();
    let bits = if approx == 0.0 || !approx.is_finite() {
        f64::INFINITY
    } else {
        approx.log2().abs() * exponent
    };

    if bits > MAX_RESULT_BITS {
        Err(overflow("pow", "result magnitude out of range"))
    } else {
        Ok(())
    }
}

fn domain(op: &'static str, value: &Float) -> EvalError {
    EvalError::Domain {
        op,
        value: value.to_f64().value().to_string(),
    }
}

fn overflow(op: &'static str, reason: impl Into<String>) -> EvalError {
    EvalError::Overflow {
        op,
        reason: reason.into(),
    }
}
