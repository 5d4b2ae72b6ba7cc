//! Integration Tests for ipvs-sync
//!
//! End-to-end tests of scan → convert → consolidate over real `.xlsx` files
//! generated with rust_xlsxwriter in a temporary directory.

use ipvs_sync::{
    read_ipvs, FileStatus, IpvsError, Pipeline, PipelineBuilder, PriceTriple, COMBINED_IPV,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Helper module for generating test fixtures
mod fixtures {
    use rust_xlsxwriter::*;
    use std::path::Path;

    pub const HEADER: [&str; 9] = [
        "Produto",
        "Variedade",
        "Classificação",
        "Unidade",
        "Menor",
        "Comum",
        "Maior",
        "Peso",
        "Data",
    ];

    /// One quotation row
    pub struct QuoteRow {
        pub produto: &'static str,
        pub variedade: Option<&'static str>,
        pub classificacao: Option<&'static str>,
        pub unidade: &'static str,
        pub prices: [f64; 3],
        pub peso: Option<f64>,
        pub data: &'static str,
    }

    impl QuoteRow {
        pub fn new(produto: &'static str, unidade: &'static str, prices: [f64; 3]) -> Self {
            Self {
                produto,
                variedade: None,
                classificacao: None,
                unidade,
                prices,
                peso: None,
                data: "15/03/2024",
            }
        }

        pub fn variety(mut self, variedade: &'static str, classificacao: &'static str) -> Self {
            self.variedade = Some(variedade);
            self.classificacao = Some(classificacao);
            self
        }

        pub fn weight(mut self, peso: f64) -> Self {
            self.peso = Some(peso);
            self
        }

        pub fn date(mut self, data: &'static str) -> Self {
            self.data = data;
            self
        }
    }

    /// Generate a quotation workbook with the standard header
    pub fn write_quotation(path: &Path, rows: &[QuoteRow]) -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, title) in HEADER.iter().enumerate() {
            worksheet.write_string(0, col as u16, *title)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            worksheet.write_string(r, 0, row.produto)?;
            if let Some(v) = row.variedade {
                worksheet.write_string(r, 1, v)?;
            }
            if let Some(c) = row.classificacao {
                worksheet.write_string(r, 2, c)?;
            }
            worksheet.write_string(r, 3, row.unidade)?;
            worksheet.write_number(r, 4, row.prices[0])?;
            worksheet.write_number(r, 5, row.prices[1])?;
            worksheet.write_number(r, 6, row.prices[2])?;
            if let Some(p) = row.peso {
                worksheet.write_number(r, 7, p)?;
            }
            worksheet.write_string(r, 8, row.data)?;
        }

        workbook.save(path)
    }
}

use fixtures::{write_quotation, QuoteRow};

const REFERENCE: &str = "Produto;UNIQUE_CONCAT;cod\n\
                         Tomate;TOMATEITALIANOEXTRA;TOM01\n\
                         Alface;ALFACE_CRESPAN/AN/A;ALF07\n\
                         Ovo;OVOBRANCON/A;OVO03\n";

/// Temporary data layout mirroring the default directory structure
struct Workspace {
    _dir: TempDir,
    raw: PathBuf,
    output: PathBuf,
    pipeline: Pipeline,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("data/raw");
        let output = dir.path().join("data/processed/IPVS");
        let reference = dir.path().join("data/processed/id_reference.csv");
        fs::create_dir_all(&raw).unwrap();
        fs::create_dir_all(reference.parent().unwrap()).unwrap();
        fs::write(&reference, REFERENCE).unwrap();

        let pipeline = PipelineBuilder::new()
            .with_raw_dir(&raw)
            .with_ledger_path(dir.path().join("data/logs/processed_list.json"))
            .with_reference_path(&reference)
            .with_output_dir(&output)
            .build()
            .unwrap();

        Self {
            _dir: dir,
            raw,
            output,
            pipeline,
        }
    }

    fn add_quotation(&self, name: &str, rows: &[QuoteRow]) -> PathBuf {
        let path = self.raw.join(name);
        write_quotation(&path, rows).unwrap();
        path
    }

    fn status_of(&self, name: &str) -> Option<FileStatus> {
        self.pipeline
            .status()
            .unwrap()
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.status)
    }
}

fn default_rows() -> Vec<QuoteRow> {
    vec![
        QuoteRow::new("TOMATE", "KG", [4.0, 5.0, 6.0]).variety("ITALIANO", "EXTRA"),
        QuoteRow::new("ALFACE CRESPA", "DZMC", [12.0, 18.0, 24.0]),
        QuoteRow::new("BATATA", "KG", [1.0, 2.0, 3.0]),
    ]
}

fn output_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

#[test]
fn test_full_pipeline_run() {
    let ws = Workspace::new();
    ws.add_quotation("Cotacao_14.03.2024.xlsx", &default_rows());
    ws.add_quotation(
        "Cotação_15.03.2024.xlsx",
        &[QuoteRow::new("OVO", "ENG", [30.0, 36.0, 42.0])
            .variety("BRANCO", "")
            .weight(3.0)
            .date("2024-03-15")],
    );

    let report = ws.pipeline.run().unwrap();

    assert_eq!(report.scan.registered.len(), 2);
    assert_eq!(report.converted.len(), 2);
    assert_eq!(
        ws.status_of("Cotacao_14.03.2024.xlsx"),
        Some(FileStatus::Processed)
    );
    // The decoded name carries the substituted term
    assert_eq!(
        ws.status_of("Cotacao_15.03.2024.xlsx"),
        Some(FileStatus::Processed)
    );

    let first = read_ipvs(&output_file(&ws.output, "IPVS_14032024.csv")).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].code, "TOM01");
    assert_eq!(first[0].prices(), PriceTriple::new(Some(4.0), Some(5.0), Some(6.0)));
    assert_eq!(first[1].code, "ALF07");
    assert_eq!(first[1].prices(), PriceTriple::new(Some(1.0), Some(1.5), Some(2.0)));

    let consolidation = report.consolidation.unwrap();
    assert_eq!(consolidation.files, 2);
    assert_eq!(consolidation.rows, 3);
    assert_eq!(consolidation.output, ws.output.join(COMBINED_IPV));

    let combined = read_ipvs(&consolidation.output).unwrap();
    let codes: Vec<_> = combined.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["TOM01", "ALF07", "OVO03"]);
    assert_eq!(combined[2].prices(), PriceTriple::new(Some(10.0), Some(12.0), Some(14.0)));
}

#[test]
fn test_scanning_twice_registers_once() {
    let ws = Workspace::new();
    ws.add_quotation("Cotacao_14.03.2024.xlsx", &default_rows());
    ws.add_quotation("COTAÇÃO_15.03.2024.xlsx", &default_rows());

    let first = ws.pipeline.scan().unwrap();
    let second = ws.pipeline.scan().unwrap();

    assert_eq!(first.registered.len(), 2);
    assert!(second.registered.is_empty());
    assert_eq!(ws.pipeline.status().unwrap().len(), 2);
}

#[test]
fn test_processed_entries_never_revert() {
    let ws = Workspace::new();
    ws.add_quotation("Cotacao_14.03.2024.xlsx", &default_rows());
    ws.pipeline.run().unwrap();

    // Re-scanning and re-registering a processed file keeps it PROCESSED
    ws.pipeline.scan().unwrap();
    assert!(!ws
        .pipeline
        .ledger()
        .upsert_unprocessed("cotacao_14.03.2024.XLSX")
        .unwrap());
    assert_eq!(
        ws.status_of("Cotacao_14.03.2024.xlsx"),
        Some(FileStatus::Processed)
    );
    assert!(ws.pipeline.convert_pending().unwrap().is_empty());
}

#[test]
fn test_unit_conversion_in_output() {
    let ws = Workspace::new();
    let source = ws.add_quotation(
        "Cotacao_15.03.2024.xlsx",
        &[
            QuoteRow::new("TOMATE", "ENG", [20.0, 30.0, 40.0])
                .variety("ITALIANO", "EXTRA")
                .weight(20.0),
            QuoteRow::new("ALFACE CRESPA", "MC", [7.5, 8.0, 9.25]),
            QuoteRow::new("OVO", "DZMC", [6.0, 12.0, 18.0]).variety("BRANCO", ""),
        ],
    );
    ws.pipeline.scan().unwrap();

    let outcome = ws.pipeline.convert_file(&source).unwrap();
    assert_eq!(outcome.rows_written, 3);

    let records = read_ipvs(&outcome.output).unwrap();
    assert_eq!(records[0].prices(), PriceTriple::new(Some(1.0), Some(1.5), Some(2.0)));
    assert_eq!(records[1].prices(), PriceTriple::new(Some(7.5), Some(8.0), Some(9.25)));
    assert_eq!(records[2].prices(), PriceTriple::new(Some(0.5), Some(1.0), Some(1.5)));
}

#[test]
fn test_unresolved_rows_are_filtered() {
    let ws = Workspace::new();
    let source = ws.add_quotation(
        "Cotacao_15.03.2024.xlsx",
        &[
            QuoteRow::new("BATATA", "KG", [1.0, 2.0, 3.0]),
            // Same product without variety resolves to a different key
            QuoteRow::new("TOMATE", "KG", [1.0, 2.0, 3.0]),
            QuoteRow::new("TOMATE", "KG", [4.0, 5.0, 6.0]).variety("ITALIANO", "EXTRA"),
        ],
    );

    let outcome = ws.pipeline.convert_file(&source).unwrap();
    assert_eq!(outcome.rows_read, 3);
    assert_eq!(outcome.rows_dropped, 2);

    let records = read_ipvs(&outcome.output).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records.iter().all(|r| r.code != "Unknown"));
}

#[test]
fn test_output_named_after_date_token() {
    let ws = Workspace::new();
    ws.add_quotation("Cotacao_15.03.2024_extra.xlsx", &default_rows());

    let report = ws.pipeline.run().unwrap();
    assert_eq!(
        report.converted[0].output,
        ws.output.join("IPVS_15032024.csv")
    );
}

#[test]
fn test_missing_date_token_leaves_entry_unprocessed() {
    let ws = Workspace::new();
    ws.add_quotation("Cotacao_semana.xlsx", &default_rows());

    let result = ws.pipeline.run();
    assert!(matches!(result, Err(IpvsError::MissingDateToken(_))));
    assert_eq!(
        ws.status_of("Cotacao_semana.xlsx"),
        Some(FileStatus::Unprocessed)
    );
    assert!(!ws.output.exists());
}

#[test]
fn test_failed_file_is_retried_on_next_run() {
    let ws = Workspace::new();
    ws.add_quotation("Cotacao_14.03.2024.xlsx", &default_rows());
    ws.add_quotation(
        "Cotacao_15.03.2024.xlsx",
        &[QuoteRow::new("TOMATE", "KG", [4.0, 5.0, 6.0])
            .variety("ITALIANO", "EXTRA")
            .date("sem data")],
    );

    let result = ws.pipeline.run();
    assert!(matches!(result, Err(IpvsError::InvalidCell { .. })));
    assert_eq!(
        ws.status_of("Cotacao_14.03.2024.xlsx"),
        Some(FileStatus::Processed)
    );
    assert_eq!(
        ws.status_of("Cotacao_15.03.2024.xlsx"),
        Some(FileStatus::Unprocessed)
    );
    assert!(!ws.output.join("IPVS_15032024.csv").exists());

    // Fix the workbook and run again
    ws.add_quotation(
        "Cotacao_15.03.2024.xlsx",
        &[QuoteRow::new("TOMATE", "KG", [4.0, 5.0, 6.0]).variety("ITALIANO", "EXTRA")],
    );
    let report = ws.pipeline.run().unwrap();

    assert_eq!(report.converted.len(), 1);
    assert_eq!(
        ws.status_of("Cotacao_15.03.2024.xlsx"),
        Some(FileStatus::Processed)
    );
    assert_eq!(report.consolidation.unwrap().rows, 3);
}

#[test]
fn test_run_with_empty_inbox() {
    let ws = Workspace::new();

    let report = ws.pipeline.run().unwrap();
    assert_eq!(report.scan.scanned, 0);
    assert!(report.converted.is_empty());
    assert!(report.consolidation.is_none());
}

#[test]
fn test_ledger_document_on_disk() {
    let ws = Workspace::new();
    ws.add_quotation("Cotacao_14.03.2024.xlsx", &default_rows());
    ws.pipeline.scan().unwrap();

    let content = fs::read_to_string(ws.pipeline.ledger().path()).unwrap();
    assert_eq!(
        content,
        "{\n    \"files\": [\n        {\n            \"name\": \"Cotacao_14.03.2024.xlsx\",\n            \"status\": \"UNPROCESSED\"\n        }\n    ]\n}"
    );
}
