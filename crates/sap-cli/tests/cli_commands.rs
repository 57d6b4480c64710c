use std::path::PathBuf;
use std::process::Command;

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join(relative)
}

fn sap2() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sap2"))
}

#[test]
fn decoders_lists_builtin_methods() {
    let output = sap2()
        .args(["decoders", "--json"])
        .output()
        .expect("spawn sap2");
    assert!(output.status.success());
    let listing: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("decoder listing is JSON");
    assert!(listing.get("duration_based_morse_like").is_some());
    assert!(listing.get("phase_delta").is_some());
    assert!(listing.get("spectral_stability_encoding").is_some());
}

#[test]
fn evaluate_prints_reports_per_channel() {
    let output = sap2()
        .args(["evaluate", "--config"])
        .arg(fixture_path("run.yaml"))
        .output()
        .expect("spawn sap2");
    assert!(output.status.success());
    let reports: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("reports are JSON");
    assert_eq!(
        reports["ch4"]["duration_based_morse_like"]["status"],
        "partially_applicable"
    );
    assert_eq!(
        reports["ch4"]["duration_based_morse_like"]["unstable_inputs"]["events"],
        "2 < 3"
    );
}

#[test]
fn run_writes_artefacts_to_the_override_dir() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let output = sap2()
        .args(["--log-level", "warn", "run", "--config"])
        .arg(fixture_path("run.yaml"))
        .arg("--out")
        .arg(temp.path())
        .args(["--concurrency", "3", "--invoke-partial"])
        .output()
        .expect("spawn sap2");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.starts_with("channels=4 "));
    assert!(stdout.contains("partial_policy=invoke"));
    for file in ["pipeline_run.json", "report.md", "applicability.csv"] {
        assert!(temp.path().join(file).is_file(), "{file} missing");
    }
}

#[test]
fn missing_config_fails() {
    let output = sap2()
        .args(["run", "--config", "/nonexistent/sap2/run.yaml"])
        .output()
        .expect("spawn sap2");
    assert!(!output.status.success());
}
