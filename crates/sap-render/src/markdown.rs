//! Human readable run report.
//!
//! Presentation only: every value is read from the frozen run result and
//! rows are ordered by key, never by completion order.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use sap_core::errors::SapError;
use sap_decode::Hypothesis;
use sap_engine::{ExperimentResult, PipelineRunResult};
use serde_json::Value;

const TOP_HYPOTHESES: usize = 3;
const PREVIEW_CHARS: usize = 80;

/// Renders the markdown report.
pub fn render_markdown(run: &PipelineRunResult, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {title}");
    out.push('\n');
    let _ = writeln!(out, "- SAT source: `{}`", run.sat_source());
    let _ = writeln!(out, "- Matrix schema_version: `{}`", run.matrix_schema_version());
    if run.interrupted() {
        out.push_str("- Interrupted: `true` (unrun units are absent)\n");
    }
    out.push('\n');

    if run.channels().is_empty() {
        out.push_str("_No channels produced._\n");
        return out;
    }

    render_overview(&mut out, run);

    for (name, channel) in run.channels() {
        let _ = writeln!(out, "## Channel: {name}");
        out.push('\n');

        if channel.applicability.is_empty() {
            out.push_str("_No applicability reports._\n\n");
        } else {
            out.push_str("### Applicability\n\n");
            out.push_str("| method_id | status | missing_inputs | unstable_inputs |\n");
            out.push_str("|---|---:|---:|---:|\n");
            for (method_id, report) in &channel.applicability {
                let _ = writeln!(
                    out,
                    "| `{method_id}` | `{}` | {} | {} |",
                    report.status,
                    report.missing_inputs.len(),
                    report.unstable_inputs.len()
                );
            }
            out.push('\n');
        }

        if channel.experiments.is_empty() {
            out.push_str("_No experiments executed._\n\n");
            continue;
        }
        out.push_str("### Experiments\n\n");
        out.push_str("| method_id | status | diagnostics |\n");
        out.push_str("|---|---:|---|\n");
        for (method_id, experiment) in &channel.experiments {
            let _ = writeln!(
                out,
                "| `{method_id}` | `{}` | {} |",
                experiment.status,
                escape_cell(&experiment.diagnostics.join("; "))
            );
        }
        out.push('\n');
        render_hypotheses(&mut out, channel.experiments.values());
    }
    out
}

fn render_overview(out: &mut String, run: &PipelineRunResult) {
    out.push_str("## Overview\n\n");
    out.push_str("| method_id | channel | applicability | experiment |\n");
    out.push_str("|---|---|---|---|\n");
    for report in run.reports_by_method() {
        let experiment = run
            .experiment(&report.channel, &report.method_id)
            .map(|experiment| format!("`{}`", experiment.status))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "| `{}` | {} | `{}` | {experiment} |",
            report.method_id, report.channel, report.status
        );
    }
    out.push('\n');
}

fn render_hypotheses<'a>(out: &mut String, experiments: impl Iterator<Item = &'a ExperimentResult>) {
    let mut section = String::new();
    for experiment in experiments {
        let hypotheses = experiment.hypotheses();
        if hypotheses.is_empty() {
            continue;
        }
        let _ = writeln!(section, "**{}**", experiment.method_id);
        for (idx, hypothesis) in hypotheses.iter().take(TOP_HYPOTHESES).enumerate() {
            render_hypothesis(&mut section, idx + 1, hypothesis);
        }
        section.push('\n');
    }
    if !section.is_empty() {
        out.push_str("### Hypotheses Summary\n\n");
        out.push_str(&section);
    }
}

fn render_hypothesis(out: &mut String, rank: usize, hypothesis: &Hypothesis) {
    let score = hypothesis
        .primary_score()
        .map(|(name, value)| format!(" ({name}={value:.3})"))
        .unwrap_or_default();
    let _ = writeln!(out, "- Hypothesis #{rank} [{}]{score}", hypothesis.level);
    let _ = writeln!(out, "  - preview: {}", code_span(&preview(&hypothesis.representation)));
    if !hypothesis.parameters.is_empty() {
        let parameters = hypothesis
            .parameters
            .iter()
            .map(|(key, value)| format!("{key}={}", plain_value(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  - parameters: {parameters}");
    }
    if !hypothesis.notes.is_empty() {
        let _ = writeln!(out, "  - notes: {}", hypothesis.notes.join(", "));
    }
}

fn preview(representation: &str) -> String {
    let flat = representation.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let mut cut: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
        cut.push_str("...");
        cut
    } else {
        flat
    }
}

/// Inline code whose fence outruns any backtick run in `text`.
fn code_span(text: &str) -> String {
    let longest_run = text
        .split(|ch| ch != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Writes markdown text to `path`, creating parent directories.
pub fn write_markdown(path: &Path, text: &str) -> Result<(), SapError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| SapError::io("sap_render.out_dir", parent, err))?;
    }
    fs::write(path, text).map_err(|err| SapError::io("sap_render.markdown_write", path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_representations() {
        let long = "x".repeat(81);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), 80);
        assert!(cut.ends_with("..."));
        assert_eq!(preview(&"y".repeat(80)), "y".repeat(80));
        assert_eq!(preview("a\nb"), "a b");
    }

    #[test]
    fn previews_with_backticks_keep_their_code_span() {
        assert_eq!(code_span("SOS"), "`SOS`");
        assert_eq!(code_span("a`b|c"), "``a`b|c``");
        assert_eq!(code_span("``x"), "``` ``x ```");
    }

    #[test]
    fn string_parameters_render_unquoted() {
        assert_eq!(plain_value(&Value::from("ch2")), "ch2");
        assert_eq!(plain_value(&Value::from(0.5)), "0.5");
    }
}
