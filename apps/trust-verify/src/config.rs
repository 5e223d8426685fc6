// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load trust-verify settings from TOML with environment overrides.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

/// Config file read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "trust-verify.toml";
/// Environment variable overriding the report format.
pub const FORMAT_ENV: &str = "TRUST_VERIFY_FORMAT";
/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "TRUST_VERIFY_LOG";

/// Report rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Machine readable JSON.
    #[default]
    Json,
    /// One line per rule and fault.
    Text,
}

impl ReportFormat {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(anyhow!("unknown report format '{other}'")),
        }
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `env_logger` filter, e.g. `info` or `trust_verifier=debug`.
    pub level: Option<String>,
}

/// `[report]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Output format.
    pub format: ReportFormat,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Json,
            pretty: true,
        }
    }
}

/// Settings for a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Report settings.
    pub report: ReportConfig,
}

impl VerifierConfig {
    /// Load settings from `path`, or from [`DEFAULT_CONFIG_PATH`] when it
    /// exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Apply overrides looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = lookup(FORMAT_ENV).filter(|value| !value.trim().is_empty()) {
            self.report.format =
                ReportFormat::parse(&format).with_context(|| format!("invalid {FORMAT_ENV}"))?;
        }
        if let Some(level) = lookup(LOG_ENV).filter(|value| !value.trim().is_empty()) {
            self.logging.level = Some(level.trim().to_owned());
        }
        Ok(())
    }
}
