// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Stream File/Dir/Symlink digests out of a measurement log in document order.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::MeasurementLogError;

/// Kind of filesystem object a measurement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementType {
    /// Regular file contents.
    File,
    /// Directory listing.
    Dir,
    /// Symbolic link target.
    Symlink,
}

impl MeasurementType {
    /// Map an element local name to a measurement type.
    #[must_use]
    pub fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"File" => Some(Self::File),
            b"Dir" => Some(Self::Dir),
            b"Symlink" => Some(Self::Symlink),
            _ => None,
        }
    }

    /// Element name used in measurement logs.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Dir => "Dir",
            Self::Symlink => "Symlink",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One measured object, in the order it appeared in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementEntry {
    /// `Path` attribute of the element, empty when absent.
    pub path: String,
    /// Element kind.
    pub measurement_type: MeasurementType,
    /// Hex digest text exactly as captured.
    pub hash_hex: String,
}

/// Return the hex digests of every `File`, `Dir` and `Symlink` element in
/// document order.
pub fn ordered_measurements(xml: &[u8]) -> Result<Vec<String>, MeasurementLogError> {
    Ok(measurement_entries(xml)?
        .into_iter()
        .map(|entry| entry.hash_hex)
        .collect())
}

/// Scan the log and return each measured object in document order.
///
/// A start tag named `File`, `Dir` or `Symlink` arms the scanner; only the
/// text token that immediately follows is captured. Any other token disarms
/// it. Running off the end of the input returns whatever was captured.
pub fn measurement_entries(xml: &[u8]) -> Result<Vec<MeasurementEntry>, MeasurementLogError> {
    let mut reader = Reader::from_reader(xml);
    let mut pending: Option<(MeasurementType, String)> = None;
    let mut entries = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|err| MeasurementLogError::malformed(reader.buffer_position(), err))?;
        match event {
            Event::Start(start) => {
                pending = match MeasurementType::from_tag(start.local_name().as_ref()) {
                    Some(kind) => Some((kind, path_attribute(&start, &reader)?)),
                    None => None,
                };
            }
            Event::Text(text) => {
                if let Some((measurement_type, path)) = pending.take() {
                    let hash_hex = text
                        .unescape()
                        .map_err(|err| {
                            MeasurementLogError::malformed(reader.buffer_position(), err)
                        })?
                        .into_owned();
                    entries.push(MeasurementEntry {
                        path,
                        measurement_type,
                        hash_hex,
                    });
                }
            }
            Event::CData(data) => {
                if let Some((measurement_type, path)) = pending.take() {
                    let hash_hex = std::str::from_utf8(&data)
                        .map_err(|_| MeasurementLogError::InvalidUtf8 {
                            position: reader.buffer_position() as u64,
                        })?
                        .to_owned();
                    entries.push(MeasurementEntry {
                        path,
                        measurement_type,
                        hash_hex,
                    });
                }
            }
            Event::Eof => break,
            _ => pending = None,
        }
    }

    Ok(entries)
}

fn path_attribute(
    start: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<String, MeasurementLogError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| {
            MeasurementLogError::malformed(reader.buffer_position(), err.into())
        })?;
        if attr.key.local_name().as_ref() == b"Path" {
            let value = attr
                .unescape_value()
                .map_err(|err| MeasurementLogError::malformed(reader.buffer_position(), err))?;
            return Ok(value.into_owned());
        }
    }
    Ok(String::new())
}
