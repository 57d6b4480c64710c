use std::fs;
use std::path::PathBuf;

use sap_core::serde::from_json_slice;
use sap_decode::DecoderRegistry;
use sap_engine::{load_run_config, ExperimentStatus, PipelineRunResult, RunConfig};
use sap_render::{
    render_applicability_csv, render_markdown, run_and_export, run_and_export_with_opts,
};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join(relative)
}

fn fixture_config(out_dir: PathBuf) -> RunConfig {
    let mut config = load_run_config(fixture_path("run.yaml")).expect("load fixture config");
    config.out_dir = out_dir;
    config
}

#[test]
fn fixture_run_exports_every_artefact() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let config = fixture_config(temp.path().to_path_buf());
    let registry = DecoderRegistry::with_builtin();

    let (run, paths) = run_and_export(&config, &registry).expect("run and export");

    assert!(paths.json.is_file());
    assert!(paths.markdown.is_file());
    assert!(paths.csv.is_file());
    let reloaded: PipelineRunResult =
        from_json_slice(&fs::read(&paths.json).expect("read json")).expect("parse json");
    assert_eq!(reloaded, run);

    assert_eq!(run.sat_source(), "sat-pass-0412");
    assert_eq!(run.matrix_schema_version(), "2025.1");
    let morse = run
        .experiment("ch1", "duration_based_morse_like")
        .expect("morse ran on ch1");
    assert_eq!(morse.status, ExperimentStatus::Ok);
    assert!(morse
        .hypotheses()
        .iter()
        .any(|hypothesis| hypothesis.representation == "SOS"));
    let spectral = run
        .experiment("ch2", "spectral_stability_encoding")
        .expect("spectral ran on ch2");
    assert_eq!(spectral.hypotheses()[0].representation, "00011101");
    let phase = run.experiment("ch3", "phase_delta").expect("phase ran on ch3");
    assert_eq!(phase.hypotheses()[0].representation, "011010");
    let profile = run
        .experiment("ch3", "symbol_frequency_profile")
        .expect("undecoded method dispatched");
    assert_eq!(profile.status, ExperimentStatus::Skipped);
    assert!(run.channel("ch4").expect("ch4").experiments.is_empty());
}

#[test]
fn repeated_runs_render_identical_bytes() {
    let registry = DecoderRegistry::with_builtin();
    let first_dir = tempfile::tempdir().expect("tmp dir");
    let second_dir = tempfile::tempdir().expect("tmp dir");
    let first_config = fixture_config(first_dir.path().to_path_buf());
    let second_config = fixture_config(second_dir.path().to_path_buf());
    let mut parallel = second_config.run_opts();
    parallel.concurrency = 4;

    let (_, first) = run_and_export(&first_config, &registry).expect("serial run");
    let (_, second) =
        run_and_export_with_opts(&second_config, &registry, &parallel).expect("parallel run");

    for (a, b) in [
        (&first.json, &second.json),
        (&first.markdown, &second.markdown),
        (&first.csv, &second.csv),
    ] {
        assert_eq!(
            fs::read(a).expect("read first"),
            fs::read(b).expect("read second")
        );
    }
}

#[test]
fn csv_rows_follow_method_then_channel() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let config = fixture_config(temp.path().to_path_buf());
    let (run, _) =
        run_and_export(&config, &DecoderRegistry::with_builtin()).expect("run and export");

    let text = String::from_utf8(render_applicability_csv(&run).expect("csv")).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "method_id,channel,status,missing_inputs,unstable_inputs,experiment_status"
    );
    assert_eq!(lines[1], "duration_based_morse_like,ch1,applicable,,,ok");
    assert_eq!(lines[2], "duration_based_morse_like,ch2,not_applicable,events,,");
    assert_eq!(
        lines[4],
        "duration_based_morse_like,ch4,partially_applicable,,events: 2 < 3,"
    );
    assert_eq!(lines.len(), 1 + 4 * 4);

    let keys: Vec<(&str, &str)> = lines[1..]
        .iter()
        .map(|line| {
            let mut fields = line.split(',');
            (
                fields.next().expect("method"),
                fields.next().expect("channel"),
            )
        })
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn markdown_mirrors_run_contents() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let config = fixture_config(temp.path().to_path_buf());
    let (run, _) =
        run_and_export(&config, &DecoderRegistry::with_builtin()).expect("run and export");

    let text = render_markdown(&run, "Pass report");

    assert!(text.starts_with("# Pass report\n\n- SAT source: `sat-pass-0412`\n"));
    assert!(text.contains("- Matrix schema_version: `2025.1`"));
    assert!(text.contains("## Channel: ch1"));
    assert!(text.contains("| `duration_based_morse_like` | `applicable` | 0 | 0 |"));
    assert!(text.contains("| `symbol_frequency_profile` | `skipped` | no decoder registered for method `symbol_frequency_profile` |"));
    assert!(text.contains("- Hypothesis #1 [symbols] (confidence=1.000)"));
    assert!(text.contains("  - preview: `SOS`"));
    assert!(text.contains("| `phase_delta` | ch3 | `applicable` | `ok` |"));
    assert!(text.contains("| `phase_delta` | ch4 | `not_applicable` | - |"));
    assert!(!text.contains("Interrupted"));
}
