// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Read the identity and cumulative hash summary of a measurement log.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::MeasurementLogError;

const ROOT_TAG: &[u8] = b"Measurement";
const CUMULATIVE_HASH_TAG: &[u8] = b"CumulativeHash";

/// Identity and summary fields of a `<Measurement>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementHeader {
    /// `Label` attribute: the flavor label the log was measured for.
    pub label: String,
    /// `Uuid` attribute: the flavor id the log was measured for.
    pub uuid: String,
    /// Text of the `<CumulativeHash>` child as reported by the host.
    pub cumulative_hash: Option<String>,
}

impl MeasurementHeader {
    /// True when the log was produced for the given flavor.
    ///
    /// Ids compare ignoring ASCII case; labels compare exactly.
    #[must_use]
    pub fn belongs_to(&self, flavor_id: &str, flavor_label: &str) -> bool {
        self.uuid.eq_ignore_ascii_case(flavor_id) && self.label == flavor_label
    }
}

/// Parse the root attributes and `<CumulativeHash>` of a measurement log.
///
/// The whole document is scanned so that a malformed tail is reported even
/// when the summary fields come first.
pub fn parse_header(xml: &[u8]) -> Result<MeasurementHeader, MeasurementLogError> {
    let mut reader = Reader::from_reader(xml);
    let mut header: Option<MeasurementHeader> = None;
    let mut depth = 0usize;
    let mut in_cumulative = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| MeasurementLogError::malformed(reader.buffer_position(), err))?;
        match event {
            Event::Start(start) => {
                if header.is_none() {
                    header = Some(read_root(&start, &reader)?);
                } else if depth == 1 && start.local_name().as_ref() == CUMULATIVE_HASH_TAG {
                    in_cumulative = true;
                    if let Some(header) = header.as_mut() {
                        header.cumulative_hash.get_or_insert_with(String::new);
                    }
                }
                depth += 1;
            }
            Event::Empty(start) => {
                if header.is_none() {
                    header = Some(read_root(&start, &reader)?);
                } else if depth == 1 && start.local_name().as_ref() == CUMULATIVE_HASH_TAG {
                    if let Some(header) = header.as_mut() {
                        header.cumulative_hash.get_or_insert_with(String::new);
                    }
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                in_cumulative = false;
            }
            Event::Text(text) if in_cumulative => {
                let value = text
                    .unescape()
                    .map_err(|err| MeasurementLogError::malformed(reader.buffer_position(), err))?;
                if let Some(hash) = header.as_mut().and_then(|h| h.cumulative_hash.as_mut()) {
                    hash.push_str(value.trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    header.ok_or(MeasurementLogError::Empty)
}

fn read_root(
    start: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<MeasurementHeader, MeasurementLogError> {
    let name = start.local_name();
    if name.as_ref() != ROOT_TAG {
        return Err(MeasurementLogError::UnexpectedRoot(
            String::from_utf8_lossy(name.as_ref()).into_owned(),
        ));
    }
    let mut header = MeasurementHeader::default();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| {
            MeasurementLogError::malformed(reader.buffer_position(), err.into())
        })?;
        let value = attr
            .unescape_value()
            .map_err(|err| MeasurementLogError::malformed(reader.buffer_position(), err))?
            .into_owned();
        match attr.key.local_name().as_ref() {
            b"Label" => header.label = value,
            b"Uuid" => header.uuid = value,
            _ => {}
        }
    }
    Ok(header)
}
