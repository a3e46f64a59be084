// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! genseries CLI

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use genseries::cli::{CandidateReport, Reporter, SimplifyReport, SumReport};
use genseries::io::{parse_candidate_with, Substitution};
use genseries::series::{partial_sum, simplify_all, Candidate};
use genseries::utils::math;
use genseries::{EngineConfig, Evaluator};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "genseries")]
#[command(about = "Expression engine for genetic series search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./genseries.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct FormulaArgs {
    /// Series formula, e.g. '\sum_{n=0}^{\infty} \frac{1}{n!}'
    #[arg(short, long, conflicts_with = "file")]
    formula: Option<String>,

    /// File holding the formula
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Bind the summation letter in place instead of rewriting it to n
    #[arg(long)]
    scoped: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a series and print its canonical form
    Parse {
        #[command(flatten)]
        input: FormulaArgs,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Simplify one or more series
    Simplify {
        /// Series formula; may be repeated
        #[arg(short, long = "formula")]
        formulas: Vec<String>,

        /// File with one formula per line ('#' starts a comment)
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Bind the summation letter in place instead of rewriting it to n
        #[arg(long)]
        scoped: bool,

        /// Also fold variable-free subtrees numerically
        #[arg(long)]
        numeric: bool,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Sum the first terms of a series
    Eval {
        #[command(flatten)]
        input: FormulaArgs,

        /// Number of terms (defaults to series.max_terms)
        #[arg(short, long)]
        terms: Option<usize>,

        /// Working precision in bits
        #[arg(short, long)]
        precision: Option<usize>,

        /// Decimal value to compare the partial sum against
        #[arg(long, value_name = "DECIMAL", allow_hyphen_values = true)]
        target_value: Option<String>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(err) = run(&cli) {
        Reporter::report_error(&format!("{err:#}"));
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    if let Commands::Version = cli.command {
        println!("genseries v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    debug!("configuration: {config:?}");

    match &cli.command {
        Commands::Parse { input, json } => parse_command(input, *json),
        Commands::Simplify {
            formulas,
            file,
            scoped,
            numeric,
            json,
        } => simplify_command(&config, formulas, file.as_deref(), *scoped, *numeric, *json),
        Commands::Eval {
            input,
            terms,
            precision,
            target_value,
            json,
        } => eval_command(
            &config,
            input,
            *terms,
            *precision,
            target_value.as_deref(),
            *json,
        ),
        Commands::Version => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let mut config = EngineConfig::from_file(path)?;
            config.apply_env()?;
            Ok(config)
        }
        None => EngineConfig::load(),
    }
}

fn substitution(scoped: bool) -> Substitution {
    if scoped {
        Substitution::Scoped
    } else {
        Substitution::Textual
    }
}

fn read_formula(input: &FormulaArgs) -> Result<String> {
    match (&input.formula, &input.file) {
        (Some(formula), _) => Ok(formula.clone()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read formula file: {:?}", path)),
        (None, None) => bail!("either --formula or --file is required"),
    }
}

fn parse_formula(source: &str, scoped: bool) -> Result<Candidate> {
    parse_candidate_with(source, substitution(scoped))
        .with_context(|| format!("Failed to parse formula: {}", source.trim()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

fn parse_command(input: &FormulaArgs, json: bool) -> Result<()> {
    let source = read_formula(input)?;
    let candidate = parse_formula(&source, input.scoped)?;

    if json {
        print_json(&CandidateReport::new(&candidate))
    } else {
        Reporter::report_candidate(&candidate);
        Ok(())
    }
}

fn simplify_command(
    config: &EngineConfig,
    formulas: &[String],
    file: Option<&Path>,
    scoped: bool,
    numeric: bool,
    json: bool,
) -> Result<()> {
    let mut sources = formulas.to_vec();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read formula file: {:?}", path))?;
        sources.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }
    if sources.is_empty() {
        bail!("no formulas given; use --formula or --file");
    }

    let candidates = sources
        .iter()
        .map(|source| parse_formula(source, scoped))
        .collect::<Result<Vec<_>>>()?;

    let simplifier = config.simplifier();
    let fold_evaluator = numeric.then(|| config.fold_evaluator());

    let start = Instant::now();
    let simplified = simplify_all(&candidates, &simplifier, fold_evaluator.as_ref());
    info!(
        "simplified {} formulas in {:.2?}",
        candidates.len(),
        start.elapsed()
    );

    if json {
        let reports: Vec<SimplifyReport> = candidates
            .iter()
            .zip(&simplified)
            .map(|(before, after)| SimplifyReport {
                input: CandidateReport::new(before),
                output: CandidateReport::new(after),
            })
            .collect();
        return print_json(&reports);
    }

    for (before, after) in candidates.iter().zip(&simplified) {
        Reporter::report_simplified(before, after);
    }
    Ok(())
}

fn eval_command(
    config: &EngineConfig,
    input: &FormulaArgs,
    terms: Option<usize>,
    precision: Option<usize>,
    target_value: Option<&str>,
    json: bool,
) -> Result<()> {
    let source = read_formula(input)?;
    let candidate = parse_formula(&source, input.scoped)?;

    let mut eval_config = config.eval.clone();
    if let Some(precision) = precision {
        eval_config.precision = precision;
    }
    let evaluator = Evaluator::new(eval_config);
    let terms = terms.unwrap_or(config.series.max_terms);
    if terms == 0 {
        Reporter::report_warning("summing zero terms yields the empty sum");
    }

    let target = target_value
        .map(|text| {
            math::parse_decimal(text, evaluator.precision())
                .ok_or_else(|| anyhow!("Invalid target value: {text:?}"))
        })
        .transpose()?;

    let start = Instant::now();
    let sum = partial_sum(&candidate, terms, &evaluator).context("Failed to evaluate series")?;
    let elapsed = start.elapsed();
    let report = SumReport::new(&candidate, &sum, target.as_ref());

    if json {
        print_json(&report)
    } else {
        Reporter::report_sum(&report, elapsed);
        if target.is_none() {
            Reporter::report_info("pass --target-value to measure correct digits");
        }
        Ok(())
    }
}
