// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Fold ordered measurements into a cumulative hash with PCR extend semantics.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use digest_alg::DigestAlgorithm;
use log::debug;

use super::{ordered_measurements, MeasurementLogError};

/// Replay a raw measurement log and return the hex cumulative hash.
pub fn replay(xml: &[u8], algorithm: DigestAlgorithm) -> Result<String, MeasurementLogError> {
    replay_digest(xml, algorithm).map(hex::encode)
}

/// Replay a raw measurement log and return the cumulative hash bytes.
pub fn replay_digest(
    xml: &[u8],
    algorithm: DigestAlgorithm,
) -> Result<Vec<u8>, MeasurementLogError> {
    let measurements = ordered_measurements(xml)?;
    fold(&measurements, algorithm)
}

/// Extend every measurement, in order, into an all-zero accumulator and
/// return the hex result.
///
/// Pseudocode: `ACC := H(ACC || unhex(m))` for each `m`.
/// The first value that is not hex aborts the replay.
pub fn replay_measurements<S: AsRef<str>>(
    measurements: &[S],
    algorithm: DigestAlgorithm,
) -> Result<String, MeasurementLogError> {
    fold(measurements, algorithm).map(hex::encode)
}

fn fold<S: AsRef<str>>(
    measurements: &[S],
    algorithm: DigestAlgorithm,
) -> Result<Vec<u8>, MeasurementLogError> {
    let mut cumulative = algorithm.zero();
    for (index, measurement) in measurements.iter().enumerate() {
        let value = measurement.as_ref();
        let bytes = hex::decode(value).map_err(|source| MeasurementLogError::InvalidMeasurement {
            index,
            value: value.to_owned(),
            source,
        })?;
        cumulative = algorithm.extend(&cumulative, &bytes);
    }
    debug!(
        "replayed {} measurements with {algorithm}",
        measurements.len()
    );
    Ok(cumulative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_replays_to_zero() {
        let hash = replay(b"<Measurement/>", DigestAlgorithm::Sha384).expect("replay");
        assert_eq!(hash, hex::encode(DigestAlgorithm::Sha384.zero()));
    }

    #[test]
    fn single_measurement_is_one_extend() {
        let alg = DigestAlgorithm::Sha384;
        let hash = replay_measurements(&["abcd"], alg).expect("replay");
        assert_eq!(hash, hex::encode(alg.extend(&alg.zero(), &[0xab, 0xcd])));
    }

    #[test]
    fn order_changes_result() {
        let alg = DigestAlgorithm::Sha384;
        let forward = replay_measurements(&["01", "02"], alg).expect("replay");
        let reverse = replay_measurements(&["02", "01"], alg).expect("replay");
        assert_ne!(forward, reverse);
    }

    #[test]
    fn invalid_hex_aborts() {
        let xml = b"<Measurement><File>aa</File><File>not-hex</File><File>bb</File></Measurement>";
        let err = replay(xml, DigestAlgorithm::Sha384).expect_err("bad hex");
        match err {
            MeasurementLogError::InvalidMeasurement { index, value, .. } => {
                assert_eq!(index, 1);
                assert_eq!(value, "not-hex");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn digest_and_hex_forms_agree() {
        let xml = b"<Measurement><File>0102</File><Dir>03</Dir></Measurement>";
        let raw = replay_digest(xml, DigestAlgorithm::Sha384).expect("replay");
        assert_eq!(raw.len(), 48);
        assert_eq!(hex::encode(raw), replay(xml, DigestAlgorithm::Sha384).expect("replay"));
    }

    #[test]
    fn follows_requested_algorithm() {
        let sha256 = replay_measurements(&["aa"], DigestAlgorithm::Sha256).expect("replay");
        let sha384 = replay_measurements(&["aa"], DigestAlgorithm::Sha384).expect("replay");
        assert_eq!(sha256.len(), 64);
        assert_eq!(sha384.len(), 96);
    }
}
