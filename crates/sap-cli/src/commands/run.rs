use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sap_decode::DecoderRegistry;
use sap_engine::{load_run_config, ExperimentStatus, PartialPolicy};
use sap_render::run_and_export_with_opts;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML run configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory overriding the configuration's `out_dir`.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Worker count overriding `execution.concurrency`.
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Dispatch partially applicable units with degraded inputs.
    #[arg(long)]
    pub invoke_partial: bool,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut config = load_run_config(&args.config)?;
    if let Some(out) = &args.out {
        config.out_dir = out.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.execution.concurrency = concurrency;
    }
    if args.invoke_partial {
        config.execution.invoke_partially_applicable = true;
    }
    let opts = config.run_opts();

    let registry = DecoderRegistry::with_builtin();
    let (run, paths) = run_and_export_with_opts(&config, &registry, &opts)?;

    let experiments = run.experiments_by_method();
    let count = |status: ExperimentStatus| {
        experiments
            .iter()
            .filter(|experiment| experiment.status == status)
            .count()
    };
    println!(
        "channels={} ok={} failed={} skipped={} partial_policy={}{}",
        run.channels().len(),
        count(ExperimentStatus::Ok),
        count(ExperimentStatus::Failed),
        count(ExperimentStatus::Skipped),
        if opts.policy == PartialPolicy::Invoke {
            "invoke"
        } else {
            "skip"
        },
        if run.interrupted() { " interrupted" } else { "" }
    );
    println!("{}", paths.json.display());
    println!("{}", paths.markdown.display());
    println!("{}", paths.csv.display());
    Ok(())
}
