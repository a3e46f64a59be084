// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Series candidates and the operations the search runs on them

mod batch;
mod candidate;
mod sum;
mod tune;

pub use batch::{simplify_all, sum_all};
pub use candidate::{Candidate, ConstLeaf, Side};
pub use sum::{partial_sum, PartialSum, TermError};
pub use tune::{perturb_const, replace_const};
