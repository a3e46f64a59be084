// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration system

use crate::ast::{EvalConfig, Evaluator, SimplifyConfig, Simplifier};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read by [`EngineConfig::load`] when present in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "genseries.toml";

/// Series evaluation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Terms summed by `eval` when none are requested
    pub max_terms: usize,
    /// Precision in bits used for numeric constant folding
    pub fold_precision: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            max_terms: 4096,
            fold_precision: 128,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub simplify: SimplifyConfig,
    pub eval: EvalConfig,
    pub series: SeriesConfig,
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `GENSERIES_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(precision) = env_usize("GENSERIES_PRECISION")? {
            self.eval.precision = precision;
        }
        if let Some(terms) = env_usize("GENSERIES_MAX_TERMS")? {
            self.series.max_terms = terms;
        }
        if let Some(passes) = env_usize("GENSERIES_MAX_PASSES")? {
            self.simplify.max_passes = passes;
        }
        if let Some(depth) = env_usize("GENSERIES_MAX_DEPTH")? {
            self.simplify.max_depth = depth;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn simplifier(&self) -> Simplifier {
        Simplifier::new(self.simplify.clone())
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(self.eval.clone())
    }

    /// Evaluator used for numeric constant folding
    pub fn fold_evaluator(&self) -> Evaluator {
        Evaluator::new(EvalConfig {
            precision: self.series.fold_precision,
            ..self.eval.clone()
        })
    }
}

fn env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {name}: {value:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.simplify.max_depth, 100);
        assert_eq!(config.simplify.max_passes, 20);
        assert_eq!(config.eval.precision, 512);
        assert_eq!(config.series.max_terms, 4096);
        assert_eq!(config.fold_evaluator().precision(), 128);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: EngineConfig = toml::from_str("[eval]\nprecision = 256\n").unwrap();
        assert_eq!(config.eval.precision, 256);
        assert_eq!(config.eval.max_depth, 512);
        assert_eq!(config.simplify, SimplifyConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genseries.toml");

        let mut config = EngineConfig::default();
        config.simplify.max_passes = 7;
        config.series.fold_precision = 96;
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EngineConfig::from_file(dir.path().join("absent.toml")).is_err());
    }
}
