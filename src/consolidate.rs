//! Consolidator Module
//!
//! 出力ディレクトリ内のIPVS CSVをすべて結合し、`combined_IPVS.ipv`を再生成する。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IpvsError;
use crate::output::{read_ipvs, write_ipvs};
use crate::scanner::list_files;

/// 結合結果を一時的に書き出すファイル名
pub const COMBINED_CSV: &str = "combined_IPVS.csv";

/// 結合結果のファイル名
pub const COMBINED_IPV: &str = "combined_IPVS.ipv";

/// 結合結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// 読み込んだIPVS CSVの数
    pub files: usize,

    /// 書き出した行数
    pub rows: usize,

    /// 出力ファイル（`combined_IPVS.ipv`）
    pub output: PathBuf,
}

/// 小数点以下3桁に丸める（0.5は0から遠い方へ）
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// 出力ディレクトリ内のIPVS CSVを結合する
///
/// ファイルはファイル名順に読み込み、各ファイル内の行順を保ちます。
/// 価格は小数点以下3桁に丸めます。既存の結合ファイルは置き換えられます。
///
/// # 戻り値
///
/// * `Ok(ConsolidationReport)` - 結合に成功した場合
/// * `Err(IpvsError::NothingToConsolidate)` - ディレクトリがない、または結合対象のCSVが1つもない場合
/// * `Err(IpvsError)` - 読み込み・書き込みに失敗した場合
pub fn consolidate(dir: &Path) -> Result<ConsolidationReport, IpvsError> {
    if !dir.is_dir() {
        return Err(IpvsError::NothingToConsolidate(dir.to_path_buf()));
    }

    let sources: Vec<PathBuf> = list_files(dir)?
        .into_iter()
        .filter(|path| is_ipvs_csv(path))
        .collect();

    if sources.is_empty() {
        return Err(IpvsError::NothingToConsolidate(dir.to_path_buf()));
    }

    let mut combined = Vec::new();
    for path in &sources {
        let records = read_ipvs(path)?;
        tracing::debug!(file = %path.display(), rows = records.len(), "read IPVS file");
        combined.extend(records.into_iter().map(|mut record| {
            record.min = record.min.map(round3);
            record.typical = record.typical.map(round3);
            record.max = record.max.map(round3);
            record
        }));
    }

    let csv_path = dir.join(COMBINED_CSV);
    let output = dir.join(COMBINED_IPV);
    write_ipvs(&csv_path, &combined)?;
    fs::rename(&csv_path, &output)?;

    let report = ConsolidationReport {
        files: sources.len(),
        rows: combined.len(),
        output,
    };
    tracing::info!(
        files = report.files,
        rows = report.rows,
        output = %report.output.display(),
        "consolidated IPVS files"
    );
    Ok(report)
}

fn is_ipvs_csv(path: &Path) -> bool {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let is_combined = path.file_name().is_some_and(|name| name == COMBINED_CSV);
    is_csv && !is_combined
}
