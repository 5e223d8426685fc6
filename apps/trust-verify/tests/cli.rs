// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate trust-verify input loading, reporting and exit codes.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::json;
use tempfile::TempDir;
use trust_verifier::measurement::replay_measurements;
use trust_verifier::{DigestAlgorithm, FLAVOR_REPLAY_ALGORITHM};
use trust_verify::{
    build_rules, evaluate, load_flavors, load_manifest, ReportFormat, ReportStatus, VerifierConfig,
};

const FLAVOR_ID: &str = "7a2f1c0e-5d44-4b8e-9a61-0c3f2d9e8b17";
const FLAVOR_LABEL: &str = "sample_app";
const MEASUREMENTS: [&str; 2] = [
    "6dfac9416f228a4a0c68966c15d79d4936bb2554a577ebac598f5f80b1b7de4910092721ff57f161eaef0509eaf5fa3f",
    "f993884f152b4729d0d64c54ad61ceaac40b2bd0aee21f73313f3fffebbdfe9f1e98ba792488ae9e0ef5c5a55af66e27",
];

fn cumulative() -> String {
    replay_measurements(&MEASUREMENTS, FLAVOR_REPLAY_ALGORITHM).expect("replay reference")
}

fn log_xml(summary: &str) -> String {
    format!(
        "<Measurement Label=\"{FLAVOR_LABEL}\" Uuid=\"{FLAVOR_ID}\" DigestAlg=\"SHA384\">\
         <File Path=\"/opt/app/bin\">{}</File>\
         <Dir Path=\"/opt/app/lib\">{}</Dir>\
         <CumulativeHash>{summary}</CumulativeHash></Measurement>",
        MEASUREMENTS[0], MEASUREMENTS[1]
    )
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn manifest_json(summary: &str) -> String {
    let raw = hex::decode(cumulative()).expect("hex");
    let bridged = hex::encode(DigestAlgorithm::Sha256.hash(&raw));
    json!({
        "measurement_xmls": [log_xml(summary)],
        "pcr_manifest": {
            "event_logs": [{
                "pcr_index": 15,
                "digest_algorithm": "SHA256",
                "label": format!("{FLAVOR_LABEL}-{FLAVOR_ID}"),
                "value": bridged,
            }]
        }
    })
    .to_string()
}

fn flavor_json(hash: &str) -> serde_json::Value {
    json!({ "id": FLAVOR_ID, "label": FLAVOR_LABEL, "cumulative_hash": hash })
}

#[test]
fn loads_single_and_listed_flavors() {
    let dir = TempDir::new().expect("tempdir");
    let single = write(dir.path(), "one.json", &flavor_json(&cumulative()).to_string());
    let listed = write(
        dir.path(),
        "many.json",
        &json!([flavor_json(&cumulative()), flavor_json(&"ab".repeat(48))]).to_string(),
    );
    assert_eq!(load_flavors(&single).expect("single flavor").len(), 1);
    let flavors = load_flavors(&listed).expect("flavor list");
    assert_eq!(flavors.len(), 2);
    assert_eq!(flavors[0].id(), FLAVOR_ID);
}

#[test]
fn rejects_flavor_with_short_hash() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "bad.json", &flavor_json("abcd").to_string());
    let err = load_flavors(&path).expect_err("short hash rejected");
    assert!(format!("{err:#}").contains("invalid flavor"));
}

#[test]
fn rejects_empty_flavor_list() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "empty.json", "[]");
    assert!(load_flavors(&path).is_err());
}

#[test]
fn manifest_round_trips_from_disk() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "manifest.json", &manifest_json(&cumulative()));
    let manifest = load_manifest(&path).expect("load manifest");
    assert_eq!(manifest.measurement_xmls.len(), 1);
    assert_eq!(manifest.pcr_manifest.event_logs[0].pcr_index.get(), 15);
}

#[test]
fn manifest_with_out_of_range_pcr_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let text = manifest_json(&cumulative()).replace("\"pcr_index\":15", "\"pcr_index\":24");
    let path = write(dir.path(), "manifest.json", &text);
    assert!(load_manifest(&path).is_err());
}

#[test]
fn evaluates_trusted_and_untrusted_hosts() {
    let dir = TempDir::new().expect("tempdir");
    let flavors_path = write(dir.path(), "flavor.json", &flavor_json(&cumulative()).to_string());

    let good = write(dir.path(), "good.json", &manifest_json(&cumulative()));
    let report = evaluate(
        &load_manifest(&good).expect("manifest"),
        &build_rules(load_flavors(&flavors_path).expect("flavors")),
    );
    assert_eq!(report.status, ReportStatus::Trusted);

    let tampered = write(dir.path(), "bad.json", &manifest_json(&"cd".repeat(48)));
    let report = evaluate(
        &load_manifest(&tampered).expect("manifest"),
        &build_rules(load_flavors(&flavors_path).expect("flavors")),
    );
    assert_eq!(report.status, ReportStatus::Untrusted);
    assert!(report.render_text().contains("ValueMismatch"));
}

#[test]
fn config_file_selects_text_reports() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        dir.path(),
        "trust-verify.toml",
        "[logging]\nlevel = \"info\"\n[report]\nformat = \"text\"\npretty = false\n",
    );
    let config = VerifierConfig::from_file(&path).expect("config");
    assert_eq!(config.report.format, ReportFormat::Text);
    assert!(!config.report.pretty);
    assert_eq!(config.logging.level.as_deref(), Some("info"));
}

#[test]
fn binary_exit_code_reflects_verdict() {
    let dir = TempDir::new().expect("tempdir");
    let flavors = write(dir.path(), "flavor.json", &flavor_json(&cumulative()).to_string());
    let good = write(dir.path(), "good.json", &manifest_json(&cumulative()));
    let bad = write(dir.path(), "bad.json", &manifest_json(&"cd".repeat(48)));

    let run = |manifest: &Path| {
        Command::new(env!("CARGO_BIN_EXE_trust-verify"))
            .current_dir(dir.path())
            .env_remove("TRUST_VERIFY_FORMAT")
            .arg("verify")
            .arg("--manifest")
            .arg(manifest)
            .arg("--flavors")
            .arg(&flavors)
            .output()
            .expect("run trust-verify")
    };

    let output = run(&good);
    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["status"], "trusted");

    let output = run(&bad);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn replay_command_prints_prefixed_hash() {
    let dir = TempDir::new().expect("tempdir");
    let log = write(dir.path(), "log.xml", &log_xml(&cumulative()));
    let output = Command::new(env!("CARGO_BIN_EXE_trust-verify"))
        .current_dir(dir.path())
        .args(["replay", "--entries", "--log"])
        .arg(&log)
        .output()
        .expect("run trust-verify");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("File /opt/app/bin "));
    assert_eq!(lines[2], format!("sha384:{}", cumulative()));
}
