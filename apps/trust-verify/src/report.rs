// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Aggregate rule outcomes for one host into a trust report.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt::Write as _;

use log::{debug, error};
use serde::Serialize;
use trust_verifier::{HostManifest, Rule, RuleResult};

/// Overall verdict for a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every rule was evaluated and none recorded a fault.
    Trusted,
    /// At least one rule recorded a fault.
    Untrusted,
    /// No rule recorded a fault but at least one could not be evaluated.
    Error,
}

/// Outcome of one rule.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The rule ran; its result carries any faults.
    Evaluated(RuleResult),
    /// The rule could not be evaluated.
    EvaluationError {
        /// Rule name.
        rule: String,
        /// Error rendered as text.
        error: String,
    },
}

/// Trust report for one host manifest.
#[derive(Debug, Clone, Serialize)]
pub struct TrustReport {
    /// Overall verdict.
    pub status: ReportStatus,
    /// Per-rule outcomes in rule order.
    pub outcomes: Vec<RuleOutcome>,
}

/// Apply every rule to `manifest` and aggregate the outcomes.
pub fn evaluate(manifest: &HostManifest, rules: &[Box<dyn Rule>]) -> TrustReport {
    let outcomes: Vec<RuleOutcome> = rules
        .iter()
        .map(|rule| match rule.apply(manifest) {
            Ok(result) => {
                debug!(
                    "rule {} trusted={} faults={}",
                    rule.name(),
                    result.trusted(),
                    result.faults().len()
                );
                RuleOutcome::Evaluated(result)
            }
            Err(err) => {
                error!("rule {} could not be evaluated: {err}", rule.name());
                RuleOutcome::EvaluationError {
                    rule: rule.name().to_owned(),
                    error: err.to_string(),
                }
            }
        })
        .collect();

    let untrusted = outcomes
        .iter()
        .any(|outcome| matches!(outcome, RuleOutcome::Evaluated(result) if !result.trusted()));
    let errored = outcomes
        .iter()
        .any(|outcome| matches!(outcome, RuleOutcome::EvaluationError { .. }));
    let status = if untrusted {
        ReportStatus::Untrusted
    } else if errored {
        ReportStatus::Error
    } else {
        ReportStatus::Trusted
    };
    TrustReport { status, outcomes }
}

impl TrustReport {
    /// Render one line per rule outcome plus one line per fault.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "status: {:?}", self.status);
        for outcome in &self.outcomes {
            match outcome {
                RuleOutcome::Evaluated(result) => {
                    let rule = result.rule();
                    let _ = writeln!(
                        out,
                        "{} flavor={} trusted={}",
                        rule.name,
                        rule.flavor_id.as_deref().unwrap_or("-"),
                        result.trusted()
                    );
                    for fault in result.faults() {
                        let _ = writeln!(out, "  fault {fault}");
                    }
                }
                RuleOutcome::EvaluationError { rule, error } => {
                    let _ = writeln!(out, "{rule} error: {error}");
                }
            }
        }
        out
    }
}
