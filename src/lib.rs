// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Host trust rules for application measurement logs.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Trust evaluation of application measurement logs.
//!
//! A host reports an XML measurement log per application flavor and a
//! SHA-256 PCR 15 event log. [`rules::XmlMeasurementLogIntegrity`] replays the
//! log, compares the result with the host summary and the flavor, and checks
//! the PCR 15 event the host extended for that flavor.

/// Application flavor baselines.
pub mod flavor;
/// Trust faults.
pub mod fault;
/// Host manifest evidence.
pub mod manifest;
pub mod measurement;
/// Rule results.
pub mod result;
pub mod rules;

pub use digest_alg::{DigestAlgorithm, DigestError};
pub use fault::{Fault, FaultKind};
pub use flavor::{Flavor, FlavorError, FLAVOR_REPLAY_ALGORITHM};
pub use manifest::{EventLogEntry, HostManifest, PcrIndex, PcrManifest, PcrManifestError};
pub use measurement::{MeasurementEntry, MeasurementLogError, MeasurementType};
pub use result::{FlavorPart, RuleInfo, RuleResult};
pub use rules::{Rule, RuleError, XmlMeasurementLogIntegrity};
