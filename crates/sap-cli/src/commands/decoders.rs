use std::error::Error;

use clap::Args;
use sap_decode::DecoderRegistry;

#[derive(Args, Debug)]
pub struct DecodersArgs {
    /// Print the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &DecodersArgs) -> Result<(), Box<dyn Error>> {
    let listing = DecoderRegistry::with_builtin().list();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for (method_id, version) in &listing {
            println!("{method_id}\t{version}");
        }
    }
    Ok(())
}
