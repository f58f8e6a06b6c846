use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::HumanDuration;
use log::{debug, info};

use finddups::logging::{init_logging, level_for};
use finddups::{write_json, write_text, Cli, DuplicateFinder, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start_time = Instant::now();
    let config = cli.to_config().context("Failed to load configuration")?;
    init_logging(level_for(cli.verbose, config.verbose))?;

    info!("Starting finddups v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    let format = config.format;
    let verbose = config.verbose;
    let finder = DuplicateFinder::new(config)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = finder.run(&cli.roots, |set| match format {
        OutputFormat::Text => Ok(write_text(&mut out, set)?),
        OutputFormat::Json => write_json(&mut out, set),
    })?;
    out.flush().context("Failed to write report")?;

    if verbose {
        summary.log();
        info!("Finished in {}", HumanDuration(start_time.elapsed()));
    }
    Ok(())
}
