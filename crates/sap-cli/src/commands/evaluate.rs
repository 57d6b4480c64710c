use std::collections::BTreeMap;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use sap_core::load_transcript;
use sap_core::serde::to_canonical_json_pretty;
use sap_engine::load_run_config;
use sap_matrix::{evaluate_channel, load_matrix};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// YAML run configuration naming the transcript and matrix.
    #[arg(long)]
    pub config: PathBuf,
}

pub fn run(args: &EvaluateArgs) -> Result<(), Box<dyn Error>> {
    let config = load_run_config(&args.config)?;
    let transcript = load_transcript(config.transcript_path())?;
    let matrix = load_matrix(config.matrix_path())?;
    let reports: BTreeMap<_, _> = transcript
        .channels
        .values()
        .map(|channel| {
            (
                channel.name.clone(),
                evaluate_channel(channel, &matrix, &config.applicability),
            )
        })
        .collect();
    let bytes = to_canonical_json_pretty(&reports)?;
    std::io::stdout().lock().write_all(&bytes)?;
    Ok(())
}
