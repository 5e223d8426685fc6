// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Application flavor trust baselines referenced by measurement log rules.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use digest_alg::{DigestAlgorithm, DigestError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Algorithm used to replay application measurement logs.
pub const FLAVOR_REPLAY_ALGORITHM: DigestAlgorithm = DigestAlgorithm::Sha384;

/// Errors raised while constructing a flavor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlavorError {
    /// The flavor id was empty.
    #[error("flavor id must not be empty")]
    MissingId,
    /// The expected cumulative hash was not a SHA-384 digest.
    #[error("flavor {id} cumulative hash is invalid: {source}")]
    InvalidCumulativeHash {
        /// Flavor the hash belongs to.
        id: String,
        /// Digest validation failure.
        #[source]
        source: DigestError,
    },
}

/// Expected state an application measurement log is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FlavorDocument", into = "FlavorDocument")]
pub struct Flavor {
    id: String,
    label: String,
    cumulative_hash: String,
}

impl Flavor {
    /// Build a flavor, validating the expected cumulative hash.
    ///
    /// The id and hash are stored lower-case: hosts label PCR 15 events with
    /// the canonical lower-case id, and replayed hashes are rendered
    /// lower-case.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        cumulative_hash: &str,
    ) -> Result<Self, FlavorError> {
        let id = id.into().to_ascii_lowercase();
        if id.trim().is_empty() {
            return Err(FlavorError::MissingId);
        }
        let raw = FLAVOR_REPLAY_ALGORITHM
            .decode_digest(cumulative_hash)
            .map_err(|source| FlavorError::InvalidCumulativeHash {
                id: id.clone(),
                source,
            })?;
        Ok(Self {
            id,
            label: label.into(),
            cumulative_hash: hex::encode(raw),
        })
    }

    /// Flavor identifier, lower-case.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable flavor label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Expected SHA-384 cumulative hash, lower-case hex.
    #[must_use]
    pub fn cumulative_hash(&self) -> &str {
        &self.cumulative_hash
    }

    /// Label under which the host extends this flavor into PCR 15.
    #[must_use]
    pub fn pcr_event_label(&self) -> String {
        format!("{}-{}", self.label, self.id)
    }
}

/// Serialized flavor form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlavorDocument {
    id: String,
    label: String,
    cumulative_hash: String,
}

impl TryFrom<FlavorDocument> for Flavor {
    type Error = FlavorError;

    fn try_from(doc: FlavorDocument) -> Result<Self, Self::Error> {
        Flavor::new(doc.id, doc.label, &doc.cumulative_hash)
    }
}

impl From<Flavor> for FlavorDocument {
    fn from(flavor: Flavor) -> Self {
        Self {
            id: flavor.id,
            label: flavor.label,
            cumulative_hash: flavor.cumulative_hash,
        }
    }
}
