// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Ordered extraction and replay of XML file/dir/symlink measurement logs.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! XML measurement logs.
//!
//! A measurement log is a `<Measurement>` document whose `File`, `Dir` and
//! `Symlink` children carry hex digests. The order of those children is the
//! order in which they were extended, so every reader here is a streaming
//! token scan; nothing is deserialised into a map.

mod extract;
mod header;
mod replay;

pub use extract::{measurement_entries, ordered_measurements, MeasurementEntry, MeasurementType};
pub use header::{parse_header, MeasurementHeader};
pub use replay::{replay, replay_digest, replay_measurements};

use thiserror::Error;

/// Errors raised while reading or replaying a measurement log.
#[derive(Debug, Error)]
pub enum MeasurementLogError {
    /// The XML tokenizer failed before reaching the end of the input.
    #[error("measurement log is malformed at byte {position}: {source}")]
    Malformed {
        /// Reader offset when the failure was detected.
        position: u64,
        /// Tokenizer failure.
        #[source]
        source: quick_xml::Error,
    },
    /// A CDATA section was not valid UTF-8.
    #[error("measurement log text at byte {position} is not utf-8")]
    InvalidUtf8 {
        /// Reader offset of the section.
        position: u64,
    },
    /// The document carried no root element.
    #[error("measurement log is empty")]
    Empty,
    /// The root element was not `<Measurement>`.
    #[error("measurement log root element is '{0}', expected 'Measurement'")]
    UnexpectedRoot(String),
    /// A measurement value could not be hex-decoded during replay.
    #[error("measurement #{index} '{value}' is not valid hex: {source}")]
    InvalidMeasurement {
        /// Zero-based position in document order.
        index: usize,
        /// Captured text.
        value: String,
        /// Decoder failure.
        #[source]
        source: hex::FromHexError,
    },
}

impl MeasurementLogError {
    pub(crate) fn malformed(position: usize, source: quick_xml::Error) -> Self {
        Self::Malformed {
            position: position as u64,
            source,
        }
    }
}
