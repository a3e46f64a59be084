// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Partial sums of a candidate series

use super::Candidate;
use crate::ast::{EvalError, Evaluator};
use crate::utils::math::{self, Float};
use thiserror::Error;

/// Evaluation failure at a specific term
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("term n={index}: {source}")]
pub struct TermError {
    pub index: i64,
    #[source]
    pub source: EvalError,
}

/// Σ_{n=start}^{start+terms-1} numerator(n) / denominator(n)
#[derive(Debug, Clone)]
pub struct PartialSum {
    pub value: Float,
    pub terms: usize,
    /// Last term added, a rough size of the remaining tail
    pub last_term: Float,
}

/// Sum the first `terms` terms of a series
///
/// Stops at the first term that cannot be evaluated. A request for zero terms
/// yields the empty sum.
pub fn partial_sum(
    candidate: &Candidate,
    terms: usize,
    evaluator: &Evaluator,
) -> Result<PartialSum, TermError> {
    let precision = evaluator.precision();
    let mut value = math::from_i64(0, precision);
    let mut last_term = math::from_i64(0, precision);

    for offset in 0..terms {
        let index = candidate
            .start
            .checked_add(offset as i64)
            .ok_or(TermError {
                index: candidate.start,
                source: EvalError::Overflow {
                    op: "index",
                    reason: "term index out of range".to_string(),
                },
            })?;

        let term = evaluate_term(candidate, index, evaluator)
            .map_err(|source| TermError { index, source })?;
        value = &value + &term;
        last_term = term;
    }

    Ok(PartialSum {
        value,
        terms,
        last_term,
    })
}

fn evaluate_term(candidate: &Candidate, index: i64, evaluator: &Evaluator) -> Result<Float, EvalError> {
    let numerator = evaluator.evaluate_at(&candidate.numerator, index)?;
    let denominator = evaluator.evaluate_at(&candidate.denominator, index)?;
    if denominator == Float::ZERO {
        return Err(EvalError::DivisionByZero);
    }
    Ok(&numerator / &denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_candidate;

    #[test]
    fn test_geometric_series() {
        let candidate = parse_candidate("\\sum_{n=0}^{\\infty} \\frac{1}{2^{n}}").unwrap();
        let sum = partial_sum(&candidate, 10, &Evaluator::with_precision(128)).unwrap();
        assert_eq!(sum.terms, 10);
        assert_eq!(math::to_decimal_string(&sum.value, 10), "1.9980468750");
        assert_eq!(math::to_decimal_string(&sum.last_term, 10), "0.0019531250");
    }

    #[test]
    fn test_zero_denominator_stops_the_sum() {
        let candidate = parse_candidate("\\sum_{n=-1}^{\\infty} \\frac{1}{n}").unwrap();
        let err = partial_sum(&candidate, 5, &Evaluator::default()).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.source, EvalError::DivisionByZero);
    }

    #[test]
    fn test_empty_sum() {
        let candidate = parse_candidate("\\sum_{n=1}^{\\infty} \\frac{1}{n}").unwrap();
        let sum = partial_sum(&candidate, 0, &Evaluator::default()).unwrap();
        assert_eq!(sum.value, Float::ZERO);
    }
}
