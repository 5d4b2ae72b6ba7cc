//! ipvs-sync - Ledger-tracked conversion of emailed price quotations into IPVS records
//!
//! This crate ingests spreadsheet price quotations delivered as email attachments,
//! tracks which files have been processed in a JSON ledger, converts each workbook
//! into the IPVS CSV format using an external code reference table, and consolidates
//! every converted file into one combined dataset.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ipvs_sync::PipelineBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Default layout: data/raw, data/logs/processed_list.json,
//!     // data/processed/id_reference.csv, data/processed/IPVS
//!     let pipeline = PipelineBuilder::new().build()?;
//!
//!     // Scan, convert every UNPROCESSED file, then rebuild combined_IPVS.ipv
//!     let report = pipeline.run()?;
//!     println!("converted {} file(s)", report.converted.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Step by Step
//!
//! ```rust,no_run
//! use ipvs_sync::PipelineBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = PipelineBuilder::new()
//!         .with_raw_dir("inbox")
//!         .with_ledger_path("state/processed_list.json")
//!         .with_reference_path("reference/id_reference.csv")
//!         .with_output_dir("out/IPVS")
//!         .build()?;
//!
//!     // Register new attachments as UNPROCESSED
//!     let scan = pipeline.scan()?;
//!     println!("{} new file(s)", scan.registered.len());
//!
//!     // Convert pending files (stops at the first failure)
//!     for outcome in pipeline.convert_pending()? {
//!         println!("{} -> {}", outcome.source.display(), outcome.output.display());
//!     }
//!
//!     pipeline.consolidate()?;
//!     Ok(())
//! }
//! ```
//!
//! # Ledger Only
//!
//! ```rust,no_run
//! use ipvs_sync::{scan_directory, Ledger};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Ledger::new("data/logs/processed_list.json");
//!     scan_directory(Path::new("data/raw"), &ledger)?;
//!
//!     for name in ledger.list_unprocessed()? {
//!         println!("pending: {}", name);
//!     }
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod consolidate;
mod converter;
mod error;
mod filename;
mod formatter;
mod ledger;
pub mod logging;
mod output;
mod parser;
mod reference;
mod scanner;
mod security;
mod types;

// 公開API
pub use api::{FileStatus, UnitCode, UnitConversion};
pub use builder::{
    Pipeline, PipelineBuilder, RunReport, DEFAULT_LEDGER_PATH, DEFAULT_OUTPUT_DIR,
    DEFAULT_RAW_DIR, DEFAULT_REFERENCE_PATH,
};
pub use consolidate::{consolidate, round3, ConsolidationReport, COMBINED_CSV, COMBINED_IPV};
pub use converter::{apply_unit, ConversionOutcome};
pub use error::{IpvsError, Result};
pub use filename::{decode_filename, decode_mime_words, ledger_key, normalize_key, DateToken};
pub use ledger::{Ledger, LedgerDocument, LedgerEntry};
pub use output::{ipvs_file_name, read_ipvs, write_ipvs, IPVS_HEADER};
pub use reference::{
    composite_key, normalize_category, ReferenceMap, MISSING_CATEGORY, UNKNOWN_CODE,
};
pub use scanner::{resolve_unprocessed, scan_directory, ScanReport};
pub use types::{IpvsRecord, PriceTriple};
