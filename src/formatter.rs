//! Formatter Module
//!
//! セル値を文字列・数値・日付へ変換する処理を提供するモジュール。
//! 見積書のセルは数値として入っていることも、ブラジル式の文字列
//! （例: `12,50`、`15/03/2024`）として入っていることもあるため、両方を受け付けます。

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::IpvsError;
use crate::types::CellValue;

/// 日付のみの文字列として受け付ける書式（先頭から順に試行）
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// 日時文字列として受け付ける書式（日付部分のみ使用）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// セルフォーマッター
///
/// セル値の変換処理のファサードとして機能します。
#[derive(Debug, Default)]
pub(crate) struct CellFormatter {
    /// 日付フォーマッター
    date_formatter: DateFormatter,

    /// 数値フォーマッター
    number_formatter: NumberFormatter,
}

impl CellFormatter {
    /// 新しいCellFormatterインスタンスを生成
    pub fn new() -> Self {
        Self {
            date_formatter: DateFormatter,
            number_formatter: NumberFormatter,
        }
    }

    /// セル値を文字列として取得する
    ///
    /// 空セル・空白のみの文字列は`None`を返します。
    pub fn text(&self, cell: &CellValue) -> Option<String> {
        if cell.is_empty() {
            return None;
        }
        Some(cell.as_raw_string())
    }

    /// セル値を数値として取得する
    ///
    /// # 引数
    ///
    /// * `cell` - セル値
    /// * `row` - ワークシート上の行番号（エラーメッセージ用）
    /// * `column` - 列名（エラーメッセージ用）
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(f64))` - 数値に変換できた場合
    /// * `Ok(None)` - 空セルの場合
    /// * `Err(IpvsError::InvalidCell)` - 数値として解釈できない場合
    pub fn number(
        &self,
        cell: &CellValue,
        row: usize,
        column: &str,
    ) -> Result<Option<f64>, IpvsError> {
        if cell.is_empty() {
            return Ok(None);
        }

        let value = match cell {
            CellValue::Number(n) => Some(*n),
            CellValue::String(s) => self.number_formatter.parse(s),
            _ => None,
        };

        value.map(Some).ok_or_else(|| invalid_cell(cell, row, column))
    }

    /// セル値を日付として取得する
    ///
    /// 日付のない行は出力できないため、空セルもエラーになります。
    pub fn date(&self, cell: &CellValue, row: usize, column: &str) -> Result<NaiveDate, IpvsError> {
        let date = match cell {
            CellValue::DateSerial(serial) | CellValue::Number(serial) => {
                self.date_formatter.from_serial(*serial)
            }
            CellValue::String(s) => self.date_formatter.parse(s),
            _ => None,
        };

        date.ok_or_else(|| invalid_cell(cell, row, column))
    }
}

fn invalid_cell(cell: &CellValue, row: usize, column: &str) -> IpvsError {
    IpvsError::InvalidCell {
        row,
        column: column.to_string(),
        value: cell.as_raw_string(),
    }
}

/// 日付フォーマッター
#[derive(Debug, Default)]
pub(crate) struct DateFormatter;

impl DateFormatter {
    /// Excelのシリアル日付値を日付に変換
    ///
    /// 1900年システム（1899年12月30日起算）を前提とします。
    /// 時刻部分（小数部）は切り捨てます。
    ///
    /// # 戻り値
    ///
    /// * `Some(NaiveDate)` - 変換に成功した場合
    /// * `None` - 負の値・非有限値・範囲外の値の場合
    pub fn from_serial(&self, serial: f64) -> Option<NaiveDate> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
        let days = Duration::try_days(serial.trunc() as i64)?;
        epoch.checked_add_signed(days)
    }

    /// 日付文字列を解析
    ///
    /// `DD/MM/YYYY`のように日を先に書く形式を優先します（月先の形式は受け付けません）。
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();

        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                    .map(|dt| dt.date())
            })
    }
}

/// 数値フォーマッター
#[derive(Debug, Default)]
pub(crate) struct NumberFormatter;

impl NumberFormatter {
    /// 数値文字列を解析
    ///
    /// カンマを含む場合はブラジル式（`1.234,56`）として扱い、
    /// 桁区切りの`.`を除去してから`,`を小数点に置き換えます。
    pub fn parse(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let normalized = if text.contains(',') {
            text.replace('.', "").replace(',', ".")
        } else {
            text.to_string()
        };

        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}
