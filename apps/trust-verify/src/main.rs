// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for host measurement log verification.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! CLI entry point for `trust-verify`.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use trust_verify::{
    build_rules, evaluate, load_flavors, load_manifest, ReportFormat, ReportStatus, VerifierConfig,
};
use trust_verifier::measurement::{measurement_entries, replay_digest};
use trust_verifier::{DigestAlgorithm, FLAVOR_REPLAY_ALGORITHM};

const RUST_LOG_ENV: &str = "RUST_LOG";
const EXIT_UNTRUSTED: u8 = 2;
const EXIT_EVALUATION_ERROR: u8 = 3;

#[derive(Debug, Parser)]
#[command(author, version, about = "Application measurement log trust verifier")]
struct Cli {
    /// TOML settings file (defaults to ./trust-verify.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate flavors against a host manifest and print a trust report.
    Verify(VerifyArgs),
    /// Replay a measurement log and print its cumulative hash.
    Replay(ReplayArgs),
}

#[derive(Debug, Parser)]
struct VerifyArgs {
    /// Host manifest JSON.
    #[arg(long)]
    manifest: PathBuf,
    /// Flavor JSON (one object or an array).
    #[arg(long)]
    flavors: PathBuf,
    /// Override the configured report format.
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,
}

#[derive(Debug, Parser)]
struct ReplayArgs {
    /// XML measurement log.
    #[arg(long)]
    log: PathBuf,
    /// Replay algorithm.
    #[arg(long, default_value_t = FLAVOR_REPLAY_ALGORITHM)]
    algorithm: DigestAlgorithm,
    /// Also print every measured entry in document order.
    #[arg(long, default_value_t = false)]
    entries: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("trust-verify: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = VerifierConfig::load(cli.config.as_deref())?;
    init_logging(cli.verbose, config.logging.level.as_deref());
    match cli.command {
        Command::Verify(args) => verify(args, &config),
        Command::Replay(args) => replay(args),
    }
}

fn init_logging(verbose: bool, configured: Option<&str>) {
    let filter = log_filter(verbose, std::env::var(RUST_LOG_ENV).ok(), configured);
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&filter).format_timestamp_millis();
    let _ = builder.try_init();
}

/// `--verbose` wins, then `RUST_LOG`, then the configured level (which
/// already folds in `TRUST_VERIFY_LOG`), then `warn`.
fn log_filter(verbose: bool, rust_log: Option<String>, configured: Option<&str>) -> String {
    if verbose {
        return LevelFilter::Debug.as_str().to_owned();
    }
    rust_log
        .filter(|value| !value.trim().is_empty())
        .or_else(|| configured.map(str::to_owned))
        .unwrap_or_else(|| LevelFilter::Warn.as_str().to_owned())
}

fn verify(args: VerifyArgs, config: &VerifierConfig) -> Result<ExitCode> {
    let manifest = load_manifest(&args.manifest)?;
    let flavors = load_flavors(&args.flavors)?;
    info!(
        "evaluating {} flavors against {} measurement logs",
        flavors.len(),
        manifest.measurement_xmls.len()
    );
    let rules = build_rules(flavors);
    let report = evaluate(&manifest, &rules);

    let format = args.format.unwrap_or(config.report.format);
    let rendered = match format {
        ReportFormat::Json if config.report.pretty => {
            serde_json::to_string_pretty(&report).context("encode report")?
        }
        ReportFormat::Json => serde_json::to_string(&report).context("encode report")?,
        ReportFormat::Text => report.render_text(),
    };
    println!("{}", rendered.trim_end());

    Ok(match report.status {
        ReportStatus::Trusted => ExitCode::SUCCESS,
        ReportStatus::Untrusted => ExitCode::from(EXIT_UNTRUSTED),
        ReportStatus::Error => ExitCode::from(EXIT_EVALUATION_ERROR),
    })
}

fn replay(args: ReplayArgs) -> Result<ExitCode> {
    let xml = fs::read(&args.log).with_context(|| format!("read log {}", args.log.display()))?;
    if args.entries {
        let entries = measurement_entries(&xml)
            .with_context(|| format!("scan log {}", args.log.display()))?;
        for entry in entries {
            println!("{} {} {}", entry.measurement_type, entry.path, entry.hash_hex);
        }
    }
    let digest = replay_digest(&xml, args.algorithm)
        .with_context(|| format!("replay log {}", args.log.display()))?;
    println!("{}{}", args.algorithm.prefix(), hex::encode(digest));
    Ok(ExitCode::SUCCESS)
}
