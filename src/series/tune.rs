// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Constant-tuning mutations
//!
//! Both operators pick the numerator or the denominator with equal odds, then
//! a random constant leaf on that side. A zero result is replaced by 1 so a
//! tuned constant never collapses a product or a denominator.

use super::{Candidate, ConstLeaf, Side};
use rand::Rng;

fn pick_leaf<R: Rng + ?Sized>(candidate: &Candidate, rng: &mut R) -> Option<ConstLeaf> {
    let side = if rng.gen_bool(0.5) {
        Side::Numerator
    } else {
        Side::Denominator
    };
    let mut handles = candidate.tree(side).const_handles();
    if handles.is_empty() {
        return None;
    }
    let handle = handles.swap_remove(rng.gen_range(0..handles.len()));
    Some(ConstLeaf { side, handle })
}

fn nonzero(value: i64) -> i64 {
    if value == 0 {
        1
    } else {
        value
    }
}

/// Shift a random constant by a non-zero delta in `±[1, max_delta]`
///
/// Returns `false` when the chosen side has no constants.
pub fn perturb_const<R: Rng + ?Sized>(candidate: &mut Candidate, rng: &mut R, max_delta: i64) -> bool {
    let Some(leaf) = pick_leaf(candidate, rng) else {
        return false;
    };
    let Some(current) = candidate.const_value(&leaf) else {
        return false;
    };

    let magnitude = rng.gen_range(1..=max_delta.max(1));
    let delta = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
    candidate.set_const(&leaf, nonzero(current.saturating_add(delta)))
}

/// Replace a random constant by a value in `[-max_abs, max_abs]`
///
/// Returns `false` when the chosen side has no constants.
pub fn replace_const<R: Rng + ?Sized>(candidate: &mut Candidate, rng: &mut R, max_abs: i64) -> bool {
    let Some(leaf) = pick_leaf(candidate, rng) else {
        return false;
    };
    let bound = max_abs.saturating_abs();
    let value = rng.gen_range(-bound..=bound);
    candidate.set_const(&leaf, nonzero(value))
}
