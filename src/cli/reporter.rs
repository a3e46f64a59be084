// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::series::{Candidate, PartialSum};
use crate::utils::math::{self, Float};
use colored::*;
use serde::Serialize;
use std::time::Duration;

/// Decimal places shown for sums and targets
pub const DISPLAY_DIGITS: usize = 30;

/// Machine-readable view of a candidate
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub latex: String,
    pub canonical: String,
    pub numerator: String,
    pub denominator: String,
    pub start: i64,
    pub complexity: usize,
    pub tree: Candidate,
}

impl CandidateReport {
    pub fn new(candidate: &Candidate) -> Self {
        Self {
            latex: candidate.to_latex(),
            canonical: candidate.canonical(),
            numerator: candidate.numerator.canonical(),
            denominator: candidate.denominator.canonical(),
            start: candidate.start,
            complexity: candidate.complexity(),
            tree: candidate.clone(),
        }
    }
}

/// Before and after of one simplification
#[derive(Debug, Clone, Serialize)]
pub struct SimplifyReport {
    pub input: CandidateReport,
    pub output: CandidateReport,
}

/// Partial sum, optionally compared against a target value
#[derive(Debug, Clone, Serialize)]
pub struct SumReport {
    pub latex: String,
    pub terms: usize,
    pub value: String,
    pub last_term: String,
    pub target: Option<String>,
    pub abs_error: Option<f64>,
    pub correct_digits: Option<f64>,
}

impl SumReport {
    pub fn new(candidate: &Candidate, sum: &PartialSum, target: Option<&Float>) -> Self {
        let (target_text, abs_error, correct_digits) = match target {
            Some(target) => (
                Some(math::to_decimal_string(target, DISPLAY_DIGITS)),
                Some(math::abs(&(&sum.value - target)).to_f64().value()),
                math::correct_digits(&sum.value, target),
            ),
            None => (None, None, None),
        };

        Self {
            latex: candidate.to_latex(),
            terms: sum.terms,
            value: math::to_decimal_string(&sum.value, DISPLAY_DIGITS),
            last_term: format!("{:e}", sum.last_term.to_f64().value()),
            target: target_text,
            abs_error,
            correct_digits,
        }
    }
}

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a parsed candidate
    pub fn report_candidate(candidate: &Candidate) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Series:".bold(), candidate.to_latex().cyan());
        println!("{}", "━".repeat(80).bright_black());
        Self::print_field("Start", &candidate.start.to_string());
        Self::print_field("Numerator", &candidate.numerator.canonical());
        Self::print_field("Denominator", &candidate.denominator.canonical());
        Self::print_field("Nodes", &candidate.complexity().to_string());
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report a simplification result
    pub fn report_simplified(before: &Candidate, after: &Candidate) {
        let unchanged = before == after;
        println!("\n{} {}", "Input:".bold(), before.to_latex().cyan());
        if unchanged {
            println!("  {} {}", "=".bright_black(), "already simplified".bright_black());
        } else {
            println!(
                "  {} {} {}",
                "→".green(),
                after.to_latex().green(),
                format!("({} → {} nodes)", before.complexity(), after.complexity()).bright_black()
            );
        }
    }

    /// Report a partial sum
    pub fn report_sum(report: &SumReport, duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Series:".bold(), report.latex.cyan());
        println!("{}", "━".repeat(80).bright_black());
        Self::print_field("Terms", &report.terms.to_string());
        Self::print_field("Value", &report.value);
        Self::print_field("Last term", &report.last_term);

        if let Some(target) = &report.target {
            Self::print_field("Target", target);
        }
        if let Some(error) = report.abs_error {
            Self::print_field("Abs error", &format!("{error:e}"));
        }
        match (report.target.is_some(), report.correct_digits) {
            (true, Some(digits)) => Self::print_digits(digits),
            (true, None) => Self::print_field("Digits", "exact at working precision"),
            _ => {}
        }

        Self::print_field("Time", &Self::format_duration(duration));
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    fn print_field(name: &str, value: &str) {
        println!("  {} {}", format!("{}:", name).bright_black(), value);
    }

    /// Correct digits, colored by how close the sum gets
    fn print_digits(digits: f64) {
        let text = format!("{digits:.1}");
        let colored_text = if digits >= 15.0 {
            text.green()
        } else if digits >= 5.0 {
            text.yellow()
        } else {
            text.red()
        };
        println!("  {} {}", "Digits:".bright_black(), colored_text);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
