// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Trust faults reported by measurement log rules.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::manifest::PcrIndex;

/// Stable fault kinds matched by report consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// The host reported no measurement log, or none for the flavor.
    LogMissing,
    /// A host measurement log could not be interpreted.
    LogInvalid,
    /// Two hashes that should agree did not.
    ValueMismatch,
    /// The host reported no event log for the PCR the rule reads.
    PcrEventLogMissing,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LogMissing => "LogMissing",
            Self::LogInvalid => "LogInvalid",
            Self::ValueMismatch => "ValueMismatch",
            Self::PcrEventLogMissing => "PcrEventLogMissing",
        };
        f.write_str(name)
    }
}

/// A specific trust check that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Fault kind.
    pub kind: FaultKind,
    /// Human readable diagnostic.
    pub description: String,
    /// Value the check expected, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Value the check observed, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Flavor whose evidence was missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<String>,
    /// PCR whose event log was missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcr_index: Option<PcrIndex>,
}

impl Fault {
    fn bare(kind: FaultKind, description: String) -> Self {
        Self {
            kind,
            description,
            expected: None,
            actual: None,
            flavor_id: None,
            pcr_index: None,
        }
    }

    /// No measurement log exists for `flavor_id`.
    #[must_use]
    pub fn log_missing(flavor_id: &str) -> Self {
        Self {
            flavor_id: Some(flavor_id.to_owned()),
            ..Self::bare(
                FaultKind::LogMissing,
                format!("Host report does not contain an XML measurement log for flavor {flavor_id}."),
            )
        }
    }

    /// A host measurement log failed to parse.
    #[must_use]
    pub fn log_invalid(reason: &str) -> Self {
        Self::bare(
            FaultKind::LogInvalid,
            format!("Host report XML measurement log is invalid: {reason}"),
        )
    }

    /// Two compared hashes disagree.
    #[must_use]
    pub fn value_mismatch(description: String, expected: Option<&str>, actual: Option<&str>) -> Self {
        Self {
            expected: expected.map(str::to_owned),
            actual: actual.map(str::to_owned),
            ..Self::bare(FaultKind::ValueMismatch, description)
        }
    }

    /// The PCR event log for `index` is absent.
    #[must_use]
    pub fn pcr_event_log_missing(index: PcrIndex) -> Self {
        Self {
            pcr_index: Some(index),
            ..Self::bare(
                FaultKind::PcrEventLogMissing,
                format!("Host report does not include a PCR event log for PCR {index}"),
            )
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)?;
        if let Some(expected) = &self.expected {
            write!(f, " (expected {expected}")?;
            match &self.actual {
                Some(actual) => write!(f, ", actual {actual})")?,
                None => f.write_str(")")?,
            }
        } else if let Some(actual) = &self.actual {
            write!(f, " (actual {actual})")?;
        }
        Ok(())
    }
}
