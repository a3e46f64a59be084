// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem for the genseries tool

pub mod reporter;

pub use reporter::{CandidateReport, Reporter, SimplifyReport, SumReport, DISPLAY_DIGITS};
