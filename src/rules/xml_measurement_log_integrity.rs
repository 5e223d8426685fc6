// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Verify an application flavor's XML measurement log by replay and PCR 15 cross-check.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use digest_alg::DigestAlgorithm;
use log::{debug, info};

use super::{Rule, RuleError};
use crate::fault::Fault;
use crate::flavor::{Flavor, FlavorError, FLAVOR_REPLAY_ALGORITHM};
use crate::manifest::{HostManifest, PcrIndex};
use crate::measurement::{parse_header, replay_digest, MeasurementHeader, MeasurementLogError};
use crate::result::{FlavorPart, RuleInfo, RuleResult};

const RULE_NAME: &str = "com.intel.mtwilson.core.verifier.policy.rule.XmlMeasurementLogIntegrity";

/// Bank the host extends the application cumulative hash into.
const PCR_BANK: DigestAlgorithm = DigestAlgorithm::Sha256;

/// Replays a host's XML measurement log for one flavor and compares the
/// cumulative hash with the host's own summary, the flavor, and the PCR 15
/// event log.
///
/// Checks run in order and stop at the first fault:
/// 1. the manifest carries measurement logs;
/// 2. one of them belongs to the flavor (a log that fails to parse is
///    `LogInvalid`, no match is `LogMissing`);
/// 3. the log replays (a replay failure is returned as an error);
/// 4. calculated == host summary, calculated == flavor, PCR 15 holds an event
///    labelled `<label>-<id>` whose value is `SHA256(calculated)`.
#[derive(Debug, Clone)]
pub struct XmlMeasurementLogIntegrity {
    flavor: Flavor,
}

impl XmlMeasurementLogIntegrity {
    /// Build the rule for `flavor`.
    #[must_use]
    pub fn new(flavor: Flavor) -> Self {
        Self { flavor }
    }

    /// Build the rule from raw flavor fields.
    pub fn from_parts(
        flavor_id: &str,
        flavor_label: &str,
        expected_cumulative_hash: &str,
    ) -> Result<Self, FlavorError> {
        Flavor::new(flavor_id, flavor_label, expected_cumulative_hash).map(Self::new)
    }

    fn rule_info(&self) -> RuleInfo {
        RuleInfo {
            name: RULE_NAME.to_owned(),
            flavor_id: Some(self.flavor.id().to_owned()),
            flavor_label: Some(self.flavor.label().to_owned()),
            expected_value: Some(self.flavor.cumulative_hash().to_owned()),
            markers: vec![FlavorPart::Software],
        }
    }

    fn associated_log<'m>(
        &self,
        manifest: &'m HostManifest,
    ) -> Result<Option<(MeasurementHeader, &'m str)>, MeasurementLogError> {
        for (position, xml) in manifest.measurement_xmls.iter().enumerate() {
            let header = parse_header(xml.as_bytes())?;
            if header.belongs_to(self.flavor.id(), self.flavor.label()) {
                debug!(
                    "flavor {} matched measurement log #{position}",
                    self.flavor.id()
                );
                return Ok(Some((header, xml.as_str())));
            }
        }
        Ok(None)
    }

    fn compare(
        &self,
        manifest: &HostManifest,
        header: &MeasurementHeader,
        calculated: &[u8],
        result: &mut RuleResult,
    ) {
        let calculated_hex = hex::encode(calculated);
        let reported = header.cumulative_hash.as_deref().unwrap_or_default();

        if !calculated_hex.eq_ignore_ascii_case(reported) {
            result.add_fault(Fault::value_mismatch(
                format!(
                    "Host XML measurement log replays to '{calculated_hex}' but the host reported cumulative hash '{reported}'"
                ),
                Some(calculated_hex.as_str()),
                Some(reported),
            ));
            return;
        }

        let expected = self.flavor.cumulative_hash();
        if calculated_hex != expected {
            result.add_fault(Fault::value_mismatch(
                format!(
                    "Host XML measurement log final hash with value '{calculated_hex}' does not match expected value '{expected}'"
                ),
                Some(expected),
                Some(calculated_hex.as_str()),
            ));
            return;
        }

        let events = match manifest
            .pcr_manifest
            .get_pcr_event_log(PCR_BANK, PcrIndex::PCR15)
        {
            Ok(events) => events,
            Err(err) => {
                debug!("flavor {}: {err}", self.flavor.id());
                result.add_fault(Fault::pcr_event_log_missing(PcrIndex::PCR15));
                return;
            }
        };

        let label = self.flavor.pcr_event_label();
        let Some(event) = events.iter().find(|event| event.label == label) else {
            result.add_fault(Fault::value_mismatch(
                format!("The PCR event log did not contain a measurement with label '{label}'"),
                None,
                Some(calculated_hex.as_str()),
            ));
            return;
        };

        // PCR 15 records the SHA-256 digest of the raw SHA-384 cumulative hash.
        let bridged = hex::encode(PCR_BANK.hash(calculated));
        if !bridged.eq_ignore_ascii_case(&event.value) {
            result.add_fault(Fault::value_mismatch(
                format!(
                    "Host XML measurement log final hash with value '{calculated_hex}' (SHA256 '{bridged}') does not match the PCR event log measurement '{}'",
                    event.value
                ),
                Some(event.value.as_str()),
                Some(bridged.as_str()),
            ));
        }
    }
}

impl Rule for XmlMeasurementLogIntegrity {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, RuleError> {
        let mut result = RuleResult::new(self.rule_info());

        if manifest.measurement_xmls.is_empty() {
            result.add_fault(Fault::log_missing(self.flavor.id()));
            return Ok(result);
        }

        let (header, xml) = match self.associated_log(manifest) {
            Ok(Some(found)) => found,
            Ok(None) => {
                result.add_fault(Fault::log_missing(self.flavor.id()));
                return Ok(result);
            }
            Err(err) => {
                result.add_fault(Fault::log_invalid(&err.to_string()));
                return Ok(result);
            }
        };

        let calculated = replay_digest(xml.as_bytes(), FLAVOR_REPLAY_ALGORITHM).map_err(|source| {
            RuleError::Replay {
                flavor_id: self.flavor.id().to_owned(),
                source,
            }
        })?;

        self.compare(manifest, &header, &calculated, &mut result);
        if result.trusted() {
            info!("flavor {} measurement log verified", self.flavor.id());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;
    use crate::manifest::{EventLogEntry, PcrManifest};
    use crate::measurement::replay;

    const ID: &str = "7a9ac586-40f9-43b2-976b-26667431efca";
    const LABEL: &str = "app";
    const BODY: &str = r#"<File Path="/bin/a">aa01</File><Dir Path="/etc">bb02</Dir>"#;

    fn log_with_summary(summary: &str) -> String {
        format!(
            r#"<Measurement Label="{LABEL}" Uuid="{ID}" DigestAlg="SHA384">{BODY}<CumulativeHash>{summary}</CumulativeHash></Measurement>"#
        )
    }

    fn calculated() -> String {
        replay(log_with_summary("").as_bytes(), FLAVOR_REPLAY_ALGORITHM).expect("replay")
    }

    fn pcr_value(hash: &str) -> String {
        hex::encode(PCR_BANK.hash(&hex::decode(hash).expect("hex")))
    }

    fn manifest(summary: &str, events: Vec<EventLogEntry>) -> HostManifest {
        HostManifest {
            measurement_xmls: vec![log_with_summary(summary)],
            pcr_manifest: PcrManifest { event_logs: events },
        }
    }

    fn pcr15(label: &str, value: String) -> EventLogEntry {
        EventLogEntry {
            pcr_index: PcrIndex::PCR15,
            digest_algorithm: PCR_BANK,
            label: label.to_owned(),
            value,
        }
    }

    #[test]
    fn rule_info_describes_flavor() {
        let hash = calculated();
        let rule = XmlMeasurementLogIntegrity::from_parts(ID, LABEL, &hash).expect("rule");
        let result = rule.apply(&HostManifest::default()).expect("apply");
        assert_eq!(
            result.rule().name,
            "com.intel.mtwilson.core.verifier.policy.rule.XmlMeasurementLogIntegrity"
        );
        assert_eq!(result.rule().expected_value.as_deref(), Some(hash.as_str()));
        assert_eq!(result.rule().markers, vec![FlavorPart::Software]);
        assert!(rule.name().ends_with(".XmlMeasurementLogIntegrity"));
    }

    #[test]
    fn host_summary_mismatch_stops_before_flavor_check() {
        let hash = calculated();
        let rule = XmlMeasurementLogIntegrity::from_parts(ID, LABEL, &"00".repeat(48)).expect("rule");
        let result = rule
            .apply(&manifest(&"11".repeat(48), vec![]))
            .expect("apply");
        assert_eq!(result.faults().len(), 1);
        let fault = &result.faults()[0];
        assert_eq!(fault.kind, FaultKind::ValueMismatch);
        assert_eq!(fault.expected.as_deref(), Some(hash.as_str()));
        assert_eq!(fault.actual, Some("11".repeat(48)));
    }

    #[test]
    fn missing_label_is_value_mismatch() {
        let hash = calculated();
        let rule = XmlMeasurementLogIntegrity::from_parts(ID, LABEL, &hash).expect("rule");
        let events = vec![pcr15("other-flavor", pcr_value(&hash))];
        let result = rule.apply(&manifest(&hash, events)).expect("apply");
        assert_eq!(result.faults().len(), 1);
        let fault = &result.faults()[0];
        assert_eq!(fault.kind, FaultKind::ValueMismatch);
        assert_eq!(fault.expected, None);
        assert_eq!(fault.actual.as_deref(), Some(hash.as_str()));
    }

    #[test]
    fn pcr_value_mismatch_reports_bridged_hash() {
        let hash = calculated();
        let rule = XmlMeasurementLogIntegrity::from_parts(ID, LABEL, &hash).expect("rule");
        let label = format!("{LABEL}-{ID}");
        let events = vec![pcr15(&label, "ee".repeat(32))];
        let result = rule.apply(&manifest(&hash, events)).expect("apply");
        assert_eq!(result.faults().len(), 1);
        let fault = &result.faults()[0];
        assert_eq!(fault.kind, FaultKind::ValueMismatch);
        assert_eq!(fault.expected, Some("ee".repeat(32)));
        assert_eq!(fault.actual, Some(pcr_value(&hash)));
    }

    #[test]
    fn pcr_bridge_is_a_hash_not_a_truncation() {
        let hash = calculated();
        assert_ne!(pcr_value(&hash), hash[..64]);
    }

    #[test]
    fn unparsable_log_is_log_invalid() {
        let rule = XmlMeasurementLogIntegrity::from_parts(ID, LABEL, &calculated()).expect("rule");
        let manifest = HostManifest {
            measurement_xmls: vec!["<Measurement><File>aa</Dir></Measurement>".to_owned()],
            ..HostManifest::default()
        };
        let result = rule.apply(&manifest).expect("apply");
        assert_eq!(result.faults().len(), 1);
        assert_eq!(result.faults()[0].kind, FaultKind::LogInvalid);
    }
}
