// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parallel batch processing of candidates using rayon
//!
//! Candidates are independent, so a population is processed with parallel
//! iterators. Results keep the input order.

use super::{partial_sum, Candidate, PartialSum, TermError};
use crate::ast::{Evaluator, Simplifier};
use rayon::prelude::*;

/// Simplify a population, with numeric folding when an evaluator is given
pub fn simplify_all(
    candidates: &[Candidate],
    simplifier: &Simplifier,
    evaluator: Option<&Evaluator>,
) -> Vec<Candidate> {
    candidates
        .par_iter()
        .map(|candidate| match evaluator {
            Some(evaluator) => candidate.simplified_numeric(simplifier, evaluator),
            None => candidate.simplified(simplifier),
        })
        .collect()
}

/// Partial sums of a population
pub fn sum_all(
    candidates: &[Candidate],
    terms: usize,
    evaluator: &Evaluator,
) -> Vec<Result<PartialSum, TermError>> {
    candidates
        .par_iter()
        .map(|candidate| partial_sum(candidate, terms, evaluator))
        .collect()
}
