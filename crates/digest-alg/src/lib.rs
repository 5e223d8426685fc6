// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Digest algorithm selection, zero digests and PCR-style hash extension.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Digest algorithms recognised by the trust rules.
//!
//! Every algorithm is a plain `Copy` value. Selection by name is
//! case-insensitive and fails closed: an unknown name is an error at the
//! point of lookup, never a zero digest later on.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use thiserror::Error;

/// Hash algorithms supported by measurement logs and PCR banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DigestAlgorithm {
    /// MD5 (16-byte digest).
    Md5,
    /// SHA-1 (20-byte digest).
    Sha1,
    /// SHA-256 (32-byte digest).
    Sha256,
    /// SHA-384 (48-byte digest).
    Sha384,
    /// SHA-512 (64-byte digest).
    Sha512,
}

/// Errors raised while selecting an algorithm or validating a digest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The algorithm name did not match any supported algorithm.
    #[error("unsupported digest algorithm '{0}'")]
    Unsupported(String),
    /// The digest text was not valid hex.
    #[error("digest '{value}' is not valid hex")]
    InvalidHex {
        /// Offending input.
        value: String,
    },
    /// The digest had the wrong length for its algorithm.
    #[error("{algorithm} digest must be {expected} bytes (got {actual})")]
    InvalidLength {
        /// Algorithm the digest was checked against.
        algorithm: DigestAlgorithm,
        /// Expected byte length.
        expected: usize,
        /// Decoded byte length.
        actual: usize,
    },
}

impl DigestAlgorithm {
    /// Every supported algorithm, in ascending digest size.
    pub const ALL: [DigestAlgorithm; 5] = [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ];

    /// Resolve an algorithm from its name, ignoring ASCII case.
    ///
    /// Both `SHA384` and `SHA-384` spellings are accepted.
    pub fn from_name(name: &str) -> Result<Self, DigestError> {
        let trimmed = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|alg| {
                trimmed.eq_ignore_ascii_case(alg.name())
                    || trimmed.eq_ignore_ascii_case(alg.dashed_name())
            })
            .ok_or_else(|| DigestError::Unsupported(name.to_owned()))
    }

    /// Canonical upper-case name, e.g. `SHA384`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        }
    }

    const fn dashed_name(self) -> &'static str {
        match self {
            Self::Md5 => "MD-5",
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Lower-case name followed by a colon, e.g. `sha256:`.
    #[must_use]
    pub fn prefix(self) -> String {
        format!("{}:", self.name().to_ascii_lowercase())
    }

    /// Digest output size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// All-zero digest of the algorithm's size; the seed of every PCR.
    #[must_use]
    pub fn zero(self) -> Vec<u8> {
        vec![0u8; self.size()]
    }

    /// One-shot digest of `data`.
    #[must_use]
    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::digest(data).to_vec(),
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Emulate a PCR extend.
    ///
    /// Pseudocode: `ACC := H(ACC || data)`
    #[must_use]
    pub fn extend(self, accumulator: &[u8], data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => chain::<Md5>(accumulator, data),
            Self::Sha1 => chain::<Sha1>(accumulator, data),
            Self::Sha256 => chain::<Sha256>(accumulator, data),
            Self::Sha384 => chain::<Sha384>(accumulator, data),
            Self::Sha512 => chain::<Sha512>(accumulator, data),
        }
    }

    /// Decode a hex digest and check it has this algorithm's length.
    pub fn decode_digest(self, value: &str) -> Result<Vec<u8>, DigestError> {
        let raw = hex::decode(value.trim()).map_err(|_| DigestError::InvalidHex {
            value: value.to_owned(),
        })?;
        if raw.len() != self.size() {
            return Err(DigestError::InvalidLength {
                algorithm: self,
                expected: self.size(),
                actual: raw.len(),
            });
        }
        Ok(raw)
    }
}

fn chain<D: Digest>(accumulator: &[u8], data: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(accumulator);
    hasher.update(data);
    hasher.finalize().to_vec()
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl TryFrom<String> for DigestAlgorithm {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value)
    }
}

impl From<DigestAlgorithm> for String {
    fn from(value: DigestAlgorithm) -> Self {
        value.name().to_owned()
    }
}
