// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Rule evaluation results shared with the trust report.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use log::warn;
use serde::{Deserialize, Serialize};

use crate::fault::{Fault, FaultKind};

/// Flavor part a rule evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlavorPart {
    /// Application and data measurements.
    Software,
}

/// Identity of the rule that produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    /// Rule name.
    pub name: String,
    /// Flavor the rule was built for.
    pub flavor_id: Option<String>,
    /// Label of that flavor.
    pub flavor_label: Option<String>,
    /// Value the rule expects, rendered as text.
    pub expected_value: Option<String>,
    /// Flavor parts the rule covers.
    pub markers: Vec<FlavorPart>,
}

/// Outcome of applying one rule to one host manifest.
///
/// `trusted` is false exactly when at least one fault was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    trusted: bool,
    rule: RuleInfo,
    faults: Vec<Fault>,
}

impl RuleResult {
    /// Start a trusted result with no faults.
    #[must_use]
    pub fn new(rule: RuleInfo) -> Self {
        Self {
            trusted: true,
            rule,
            faults: Vec::new(),
        }
    }

    /// Record a fault and mark the result untrusted.
    pub fn add_fault(&mut self, fault: Fault) {
        warn!("rule {} fault: {fault}", self.rule.name);
        self.trusted = false;
        self.faults.push(fault);
    }

    /// Whether every check passed.
    #[must_use]
    pub fn trusted(&self) -> bool {
        self.trusted
    }

    /// Rule identity.
    #[must_use]
    pub fn rule(&self) -> &RuleInfo {
        &self.rule
    }

    /// Faults in the order they were recorded.
    #[must_use]
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// True when a fault of `kind` was recorded.
    #[must_use]
    pub fn has_fault(&self, kind: FaultKind) -> bool {
        self.faults.iter().any(|fault| fault.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> RuleInfo {
        RuleInfo {
            name: "TestRule".to_owned(),
            flavor_id: None,
            flavor_label: None,
            expected_value: None,
            markers: vec![FlavorPart::Software],
        }
    }

    #[test]
    fn faults_and_trust_are_coupled() {
        let mut result = RuleResult::new(info());
        assert!(result.trusted());
        assert!(result.faults().is_empty());

        result.add_fault(Fault::log_invalid("first"));
        result.add_fault(Fault::log_invalid("first"));
        assert!(!result.trusted());
        assert_eq!(result.faults().len(), 2);
        assert!(result.has_fault(FaultKind::LogInvalid));
        assert!(!result.has_fault(FaultKind::ValueMismatch));
    }

    #[test]
    fn markers_serialise_upper_case() {
        let json = serde_json::to_value(RuleResult::new(info())).expect("serialize");
        assert_eq!(json["rule"]["markers"][0], "SOFTWARE");
        assert_eq!(json["trusted"], true);
    }
}
