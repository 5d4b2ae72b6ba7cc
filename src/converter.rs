//! Row Converter Module
//!
//! 見積書ワークブック1ファイルをIPVS形式のCSVに変換するモジュール。
//!
//! # 処理フロー
//!
//! 1. 入力ファイルの存在・サイズを確認し、ワークブックを開く
//! 2. ファイル名から日付トークン（`DD.MM.YYYY`）を抽出
//! 3. 最初のワークシートを読み込み、行ごとに複合キーからコードを解決
//! 4. コードが`Unknown`の行を除外
//! 5. 単位に応じて価格を換算し、日付を`YYYY-MM-DD`に変換
//! 6. `IPVS_<DDMMYYYY>.csv`を書き出し、台帳を`PROCESSED`に更新
//!
//! 6より前で失敗した場合、台帳は変更されません。

use std::fs;
use std::path::{Path, PathBuf};

use crate::api::{UnitCode, UnitConversion};
use crate::error::IpvsError;
use crate::filename::{decode_filename, DateToken};
use crate::formatter::CellFormatter;
use crate::ledger::Ledger;
use crate::output::{ipvs_file_name, write_ipvs};
use crate::parser::{WorkbookParser, COMUM, DATA, MAIOR, MENOR, PESO};
use crate::reference::{composite_key, ReferenceMap, UNKNOWN_CODE};
use crate::security::SecurityConfig;
use crate::types::{IpvsRecord, PriceTriple, RawRow};

/// ダース単位の換算係数
const DOZEN: f64 = 12.0;

/// 1ファイルの変換結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    /// 入力ワークブック
    pub source: PathBuf,

    /// 出力したIPVS CSV
    pub output: PathBuf,

    /// 読み込んだデータ行数（空行を除く）
    pub rows_read: usize,

    /// 出力した行数
    pub rows_written: usize,

    /// コードが解決できず除外した行数
    pub rows_dropped: usize,
}

/// 単位に応じて価格を換算する
///
/// # 引数
///
/// * `unit` - 単位コード
/// * `prices` - 換算前の価格
/// * `weight` - 行の重量（`ENG` / `UN`でのみ使用）
///
/// # 戻り値
///
/// 換算後の価格。重量が必要な単位で重量がない・0の場合、および未知の単位では
/// すべて未設定になります。
///
/// # 使用例
///
/// ```rust
/// use ipvs_sync::{apply_unit, PriceTriple, UnitCode};
///
/// let prices = PriceTriple::new(Some(24.0), Some(36.0), None);
/// let converted = apply_unit(&UnitCode::Dzmc, prices, None);
/// assert_eq!(converted, PriceTriple::new(Some(2.0), Some(3.0), None));
/// ```
pub fn apply_unit(unit: &UnitCode, prices: PriceTriple, weight: Option<f64>) -> PriceTriple {
    match unit.conversion() {
        UnitConversion::PassThrough => prices,
        UnitConversion::PerWeight => match weight {
            Some(w) if w != 0.0 => prices.map(|v| v / w),
            _ => PriceTriple::unset(),
        },
        UnitConversion::PerDozen => prices.map(|v| v / DOZEN),
        UnitConversion::Unset => PriceTriple::unset(),
    }
}

/// 行コンバーター
///
/// コード対応表を参照し、`RawRow`を`IpvsRecord`に変換します。
pub(crate) struct RowConverter<'a> {
    reference: &'a ReferenceMap,
    formatter: CellFormatter,
}

impl<'a> RowConverter<'a> {
    pub fn new(reference: &'a ReferenceMap) -> Self {
        Self {
            reference,
            formatter: CellFormatter::new(),
        }
    }

    /// 行をまとめて変換する
    ///
    /// コードが解決できない行は除外します（エラーにはしません）。
    /// 数値・日付の変換は、除外されなかった行に対してのみ行います。
    pub fn convert_rows(&self, rows: &[RawRow]) -> Result<Vec<IpvsRecord>, IpvsError> {
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(record) = self.convert_row(row)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// 1行を変換する（コードが`Unknown`の場合は`None`）
    pub fn convert_row(&self, row: &RawRow) -> Result<Option<IpvsRecord>, IpvsError> {
        let key = composite_key(
            row.produto.as_deref(),
            row.variedade.as_deref(),
            row.classificacao.as_deref(),
        );
        let code = self.reference.resolve(&key);
        if code == UNKNOWN_CODE {
            tracing::debug!(
                row = row.row,
                key = %key,
                "no code for composite key, dropping row"
            );
            return Ok(None);
        }

        let prices = self.prices(row)?;
        let date = self.formatter.date(&row.date, row.row, DATA)?;
        Ok(Some(IpvsRecord::new(code, date, prices)))
    }

    fn prices(&self, row: &RawRow) -> Result<PriceTriple, IpvsError> {
        let conversion = row.unit.conversion();
        if conversion == UnitConversion::Unset {
            tracing::warn!(
                row = row.row,
                unit = row.unit.as_str(),
                "unknown unit, leaving prices empty"
            );
            return Ok(PriceTriple::unset());
        }

        let prices = PriceTriple::new(
            self.formatter.number(&row.low, row.row, MENOR)?,
            self.formatter.number(&row.typical, row.row, COMUM)?,
            self.formatter.number(&row.high, row.row, MAIOR)?,
        );

        let weight = if conversion == UnitConversion::PerWeight {
            let weight = self.formatter.number(&row.weight, row.row, PESO)?;
            if weight.map_or(true, |w| w == 0.0) {
                tracing::warn!(
                    row = row.row,
                    unit = row.unit.as_str(),
                    "missing or zero weight, leaving prices empty"
                );
            }
            weight
        } else {
            None
        };

        Ok(apply_unit(&row.unit, prices, weight))
    }
}

/// 見積書ワークブックを変換し、IPVS CSVを書き出す
///
/// 成功した場合のみ、元ファイル名（デコード済み）のエントリを`PROCESSED`にします。
///
/// # 引数
///
/// * `source` - 入力ワークブックのパス
/// * `reference` - コード対応表
/// * `output_dir` - 出力ディレクトリ（存在しない場合は作成）
/// * `ledger` - 台帳
/// * `security` - 入力サイズの上限
///
/// # 戻り値
///
/// * `Ok(ConversionOutcome)` - 変換に成功した場合
/// * `Err(IpvsError::SourceNotFound)` - 入力ファイルがない場合
/// * `Err(IpvsError::Parse)` - ワークブックとして開けない場合
/// * `Err(IpvsError::MissingDateToken)` - ファイル名に日付がない場合
/// * `Err(IpvsError)` - 読み込み・変換・書き込みに失敗した場合
pub(crate) fn convert_file(
    source: &Path,
    reference: &ReferenceMap,
    output_dir: &Path,
    ledger: &Ledger,
    security: &SecurityConfig,
) -> Result<ConversionOutcome, IpvsError> {
    match convert_inner(source, reference, output_dir, ledger, security) {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::error!(source = %source.display(), error = %e, "conversion failed");
            Err(e)
        }
    }
}

fn convert_inner(
    source: &Path,
    reference: &ReferenceMap,
    output_dir: &Path,
    ledger: &Ledger,
    security: &SecurityConfig,
) -> Result<ConversionOutcome, IpvsError> {
    let mut parser = WorkbookParser::open(source, security)?;

    let raw_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = decode_filename(&raw_name)?;
    let token =
        DateToken::extract(&name).ok_or_else(|| IpvsError::MissingDateToken(name.clone()))?;

    let rows = parser.read_rows()?;
    let records = RowConverter::new(reference).convert_rows(&rows)?;

    fs::create_dir_all(output_dir)?;
    let output = output_dir.join(ipvs_file_name(&token));
    write_ipvs(&output, &records)?;

    ledger.mark_processed(&name)?;

    let outcome = ConversionOutcome {
        source: source.to_path_buf(),
        output,
        rows_read: rows.len(),
        rows_written: records.len(),
        rows_dropped: rows.len() - records.len(),
    };
    tracing::info!(
        source = %outcome.source.display(),
        output = %outcome.output.display(),
        written = outcome.rows_written,
        dropped = outcome.rows_dropped,
        "converted file"
    );
    Ok(outcome)
}
