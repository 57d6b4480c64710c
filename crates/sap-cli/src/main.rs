use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    decoders::{self, DecodersArgs},
    evaluate::{self, EvaluateArgs},
    run::{self, RunArgs},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sap2", about = "SAP² applicability gating and decoding pipeline")]
struct Cli {
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate, decode and export a transcript described by a run configuration.
    Run(RunArgs),
    /// Print applicability reports as JSON without running decoders.
    Evaluate(EvaluateArgs),
    /// List registered decoders and their versions.
    Decoders(DecodersArgs),
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Evaluate(args) => evaluate::run(&args),
        Command::Decoders(args) => decoders::run(&args),
    }
}
