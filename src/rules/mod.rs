// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Trust rule contract shared by every host evidence rule.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Trust rules.
//!
//! A rule is built once for a flavor and then applied to any number of host
//! manifests. Failed checks are reported as faults inside the result; an
//! `Err` means the rule could not be evaluated at all.

mod xml_measurement_log_integrity;

pub use xml_measurement_log_integrity::XmlMeasurementLogIntegrity;

use thiserror::Error;

use crate::manifest::HostManifest;
use crate::measurement::MeasurementLogError;
use crate::result::RuleResult;

/// Failures that prevent a rule from producing a result.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The associated measurement log could not be replayed.
    #[error("replay of the measurement log for flavor {flavor_id} failed: {source}")]
    Replay {
        /// Flavor whose log was replayed.
        flavor_id: String,
        /// Underlying log failure.
        #[source]
        source: MeasurementLogError,
    },
}

/// A check applied to host evidence.
///
/// Implementations hold no mutable state, so one instance may be applied to
/// many manifests concurrently.
pub trait Rule: Send + Sync {
    /// Stable rule name reported in results.
    fn name(&self) -> &str;

    /// Evaluate the rule against `manifest`.
    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, RuleError>;
}
