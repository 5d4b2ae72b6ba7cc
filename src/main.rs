//! ipvs-sync CLI.

use clap::Parser;
use ipvs_sync::logging::{init_logging, LogConfig, LogFormat};
use ipvs_sync::{IpvsError, Pipeline, PipelineBuilder};
use std::io::{self, IsTerminal};

mod cli;

use crate::cli::{Cli, Command, LogFormatArg};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }

    let result = build_pipeline(&cli).and_then(|pipeline| execute(&pipeline, &cli.command));
    let exit_code = match result {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_format(format)
        .with_ansi(io::stderr().is_terminal())
        .with_target(cli.log_target)
}

fn build_pipeline(cli: &Cli) -> Result<Pipeline, IpvsError> {
    let mut builder = PipelineBuilder::new();
    if let Some(dir) = &cli.raw_dir {
        builder = builder.with_raw_dir(dir.clone());
    }
    if let Some(path) = &cli.ledger {
        builder = builder.with_ledger_path(path.clone());
    }
    if let Some(path) = &cli.reference {
        builder = builder.with_reference_path(path.clone());
    }
    if let Some(dir) = &cli.output_dir {
        builder = builder.with_output_dir(dir.clone());
    }
    builder.build()
}

fn execute(pipeline: &Pipeline, command: &Command) -> Result<(), IpvsError> {
    match command {
        Command::Scan => {
            let report = pipeline.scan()?;
            println!(
                "scanned {} file(s), registered {} new",
                report.scanned,
                report.registered.len()
            );
            for name in &report.registered {
                println!("  + {name}");
            }
        }
        Command::Convert { file: Some(file) } => {
            let outcome = pipeline.convert_file(file)?;
            println!(
                "{} -> {} ({} row(s))",
                outcome.source.display(),
                outcome.output.display(),
                outcome.rows_written
            );
        }
        Command::Convert { file: None } => {
            let outcomes = pipeline.convert_pending()?;
            for outcome in &outcomes {
                println!(
                    "{} -> {} ({} row(s))",
                    outcome.source.display(),
                    outcome.output.display(),
                    outcome.rows_written
                );
            }
            println!("converted {} file(s)", outcomes.len());
        }
        Command::Consolidate => {
            let report = pipeline.consolidate()?;
            println!(
                "combined {} file(s), {} row(s) into {}",
                report.files,
                report.rows,
                report.output.display()
            );
        }
        Command::Run => {
            let report = pipeline.run()?;
            println!(
                "registered {} new file(s), converted {}",
                report.scan.registered.len(),
                report.converted.len()
            );
            match report.consolidation {
                Some(c) => println!("combined {} row(s) into {}", c.rows, c.output.display()),
                None => println!("nothing to consolidate"),
            }
        }
        Command::Status => {
            for entry in pipeline.status()? {
                println!("{:<12} {}", entry.status.as_str(), entry.name);
            }
        }
    }
    Ok(())
}
