use anyhow::{Context, Result};
use clap::Parser;
use ridership_normalizer::cli::{Args, print_header, print_summary, setup_logging};
use ridership_normalizer::processor::Pipeline;
use std::process;

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    if let Err(error) = run(&args) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.to_config()?;
    let quiet = args.quiet;

    if !quiet {
        print_header(&config);
    }

    let pipeline = Pipeline::new(config).context("Failed to set up the pipeline")?;
    let stats = pipeline.run().context("Ridership normalization failed")?;

    if !quiet {
        print_summary(&stats);
    }
    Ok(())
}
