// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Host tooling helpers for evaluating measurement log rules.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Helpers behind the `trust-verify` CLI: input loading, rule construction
//! and report aggregation.

pub mod config;
pub mod report;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use trust_verifier::{Flavor, HostManifest, Rule, XmlMeasurementLogIntegrity};

pub use config::{ReportFormat, VerifierConfig};
pub use report::{evaluate, ReportStatus, RuleOutcome, TrustReport};

/// Load a host manifest from JSON.
pub fn load_manifest(path: &Path) -> Result<HostManifest> {
    let bytes = fs::read(path).with_context(|| format!("read manifest {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse manifest {}", path.display()))
}

/// Load flavors from JSON: either a single flavor object or an array.
pub fn load_flavors(path: &Path) -> Result<Vec<Flavor>> {
    let bytes = fs::read(path).with_context(|| format!("read flavors {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse flavors {}", path.display()))?;
    let flavors = if value.is_array() {
        serde_json::from_value::<Vec<Flavor>>(value)
    } else {
        serde_json::from_value::<Flavor>(value).map(|flavor| vec![flavor])
    }
    .with_context(|| format!("invalid flavor in {}", path.display()))?;
    if flavors.is_empty() {
        bail!("flavors file {} lists no flavors", path.display());
    }
    Ok(flavors)
}

/// One measurement log integrity rule per flavor, in flavor order.
#[must_use]
pub fn build_rules(flavors: Vec<Flavor>) -> Vec<Box<dyn Rule>> {
    flavors
        .into_iter()
        .map(|flavor| Box::new(XmlMeasurementLogIntegrity::new(flavor)) as Box<dyn Rule>)
        .collect()
}
