use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use depaudit::rules::RuleStore;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;

fn bin() -> Command {
    cargo_bin_cmd!("depaudit")
}

fn fixture_bundle_path(dir: &std::path::Path) -> std::path::PathBuf {
    let doc = json!({
        "packages": {
            "autobahn": {
                "20.12.3": { "cryptography": [[">=", "2.5"]] }
            },
            "cryptography": {
                "2.9": {},
                "3.0": {},
                "3.4": {}
            }
        },
        "rules": [
            [
                [["cryptography", ">=~", "2.0"], "and", ["cryptography", "<~", "3.3"]],
                { "$cve": "CVE-2020-0001", "$vuln": true }
            ]
        ]
    });
    let store = RuleStore::from_json(&doc).expect("valid fixture");
    let path = dir.join("rules.bundle");
    depaudit::bundle::save(&store, &path).expect("write fixture bundle");
    path
}

#[test]
fn no_requirements_exits_with_code_two() {
    bin().assert().code(2).stderr(predicate::str::contains("no requirements"));
}

#[test]
fn vulnerable_requirement_exits_one_with_reasoning() {
    let dir = tempdir().unwrap();
    let bundle = fixture_bundle_path(dir.path());

    bin()
        .args(["--bundle", bundle.to_str().unwrap(), "cryptography>=2.0,<3.3"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("CVE-2020-0001"));
}

#[test]
fn transitive_dependency_surfaces_the_same_cve() {
    let dir = tempdir().unwrap();
    let bundle = fixture_bundle_path(dir.path());

    bin()
        .args(["--bundle", bundle.to_str().unwrap(), "autobahn>=20.0,<21.0"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("CVE-2020-0001"));
}

#[test]
fn clean_requirement_exits_zero() {
    let dir = tempdir().unwrap();
    let bundle = fixture_bundle_path(dir.path());

    bin()
        .args(["--bundle", bundle.to_str().unwrap(), "cryptography>=3.4"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("CVE").not());
}

#[test]
fn json_format_reports_structured_findings() {
    let dir = tempdir().unwrap();
    let bundle = fixture_bundle_path(dir.path());

    bin()
        .args([
            "--bundle",
            bundle.to_str().unwrap(),
            "--format",
            "json",
            "cryptography>=2.0,<3.3",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"vulnerable\":true"))
        .stdout(predicate::str::contains("\"cve\":\"CVE-2020-0001\""));
}

#[test]
fn missing_bundle_file_fails_with_nonzero_exit() {
    bin()
        .args(["--bundle", "/nonexistent/rules.bundle", "autobahn"])
        .assert()
        .failure();
}

#[test]
fn dashr_requirements_file_is_resolved_recursively() {
    let dir = tempdir().unwrap();
    let bundle = fixture_bundle_path(dir.path());
    let reqs = dir.path().join("requirements.txt");
    std::fs::write(&reqs, "cryptography>=2.0,<3.3\n").unwrap();

    bin()
        .args(["--bundle", bundle.to_str().unwrap(), "-r", reqs.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("CVE-2020-0001"));
}
