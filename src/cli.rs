//! CLI argument definitions for the `ipvs-sync` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "ipvs-sync",
    version,
    about = "Convert emailed price quotation workbooks into IPVS records",
    long_about = "Track quotation workbooks in a JSON ledger, convert each one into\n\
                  an IPVS CSV file and consolidate them into combined_IPVS.ipv."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Include the event target (module path) in log lines.
    #[arg(long = "log-target", global = true)]
    pub log_target: bool,

    /// Directory holding the downloaded attachments.
    #[arg(long = "raw-dir", value_name = "DIR", global = true)]
    pub raw_dir: Option<PathBuf>,

    /// Processed-file ledger (JSON).
    #[arg(long = "ledger", value_name = "PATH", global = true)]
    pub ledger: Option<PathBuf>,

    /// Code reference table (`;`-delimited CSV).
    #[arg(long = "reference", value_name = "PATH", global = true)]
    pub reference: Option<PathBuf>,

    /// Directory receiving IPVS CSV files and the combined output.
    #[arg(long = "output-dir", value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register new files in the raw directory as UNPROCESSED.
    Scan,

    /// Convert UNPROCESSED files, or a single workbook when FILE is given.
    Convert {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Rebuild combined_IPVS.ipv from every IPVS CSV file.
    Consolidate,

    /// Scan, convert and consolidate in one pass.
    Run,

    /// Print every ledger entry with its status.
    Status,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
