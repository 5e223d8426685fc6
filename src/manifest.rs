// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Host manifest evidence consumed by trust rules (measurement logs, PCR event logs).
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

use digest_alg::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest PCR index in a TPM 2.0 PC client bank.
pub const MAX_PCR_INDEX: u8 = 23;

/// Platform configuration register index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PcrIndex(u8);

impl PcrIndex {
    /// PCR extended with application measurements during launch.
    pub const PCR15: PcrIndex = PcrIndex(15);

    /// Validate a raw index.
    pub fn new(index: u8) -> Result<Self, PcrManifestError> {
        if index > MAX_PCR_INDEX {
            return Err(PcrManifestError::IndexOutOfRange(index));
        }
        Ok(Self(index))
    }

    /// Raw register number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PcrIndex {
    type Error = PcrManifestError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PcrIndex> for u8 {
    fn from(value: PcrIndex) -> Self {
        value.0
    }
}

impl fmt::Display for PcrIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One event recorded against a PCR bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Register the event was extended into.
    pub pcr_index: PcrIndex,
    /// Bank the event value belongs to.
    pub digest_algorithm: DigestAlgorithm,
    /// Event label, e.g. `<flavor label>-<flavor id>` for application flavors.
    pub label: String,
    /// Hex digest extended by the event.
    pub value: String,
}

/// Errors raised by PCR manifest lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PcrManifestError {
    /// No event log exists for the requested bank and register.
    #[error("no {algorithm} event log for PCR {index}")]
    NotFound {
        /// Requested bank.
        algorithm: DigestAlgorithm,
        /// Requested register.
        index: PcrIndex,
    },
    /// Register number outside the bank.
    #[error("PCR index {0} exceeds 23")]
    IndexOutOfRange(u8),
}

/// PCR event logs reported by a host, across every bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcrManifest {
    /// Events in the order the host reported them.
    #[serde(default)]
    pub event_logs: Vec<EventLogEntry>,
}

impl PcrManifest {
    /// Return the ordered events for `(algorithm, index)`.
    ///
    /// An absent pair is reported as [`PcrManifestError::NotFound`].
    pub fn get_pcr_event_log(
        &self,
        algorithm: DigestAlgorithm,
        index: PcrIndex,
    ) -> Result<Vec<&EventLogEntry>, PcrManifestError> {
        let events: Vec<&EventLogEntry> = self
            .event_logs
            .iter()
            .filter(|event| event.digest_algorithm == algorithm && event.pcr_index == index)
            .collect();
        if events.is_empty() {
            return Err(PcrManifestError::NotFound { algorithm, index });
        }
        Ok(events)
    }
}

/// Runtime evidence collected from an attested host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
    /// Raw XML measurement logs, one per measured application flavor.
    #[serde(default)]
    pub measurement_xmls: Vec<String>,
    /// PCR event logs.
    #[serde(default)]
    pub pcr_manifest: PcrManifest,
}
