//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::UnitCode;

/// セルの値を表す列挙型
///
/// calamineの`Data`を、変換処理に必要な種類だけに整理したものです。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列（ISO形式の日時文字列を含む）
    String(String),

    /// Excelのシリアル日付値（日付書式付きの数値セル）
    DateSerial(f64),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空白のみの文字列も空として扱います。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 値を文字列として取得（書式適用前）
    pub fn as_raw_string(&self) -> String {
        match self {
            CellValue::Number(n) | CellValue::DateSerial(n) => n.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&calamine::Data> for CellValue {
    fn from(cell: &calamine::Data) -> Self {
        use calamine::Data;

        match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::String(s.clone()),
            Data::DateTime(dt) => CellValue::DateSerial(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
            _ => CellValue::Empty,
        }
    }
}

/// 最安値・通常値・最高値の3点セット
///
/// `None`は「値なし」を表し、CSVでは空フィールドになります。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceTriple {
    pub low: Option<f64>,
    pub typical: Option<f64>,
    pub high: Option<f64>,
}

impl PriceTriple {
    pub fn new(low: Option<f64>, typical: Option<f64>, high: Option<f64>) -> Self {
        Self { low, typical, high }
    }

    /// 3つすべてが未設定のトリプル
    pub fn unset() -> Self {
        Self::default()
    }

    /// 各値に関数を適用する（`None`は`None`のまま）
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            low: self.low.map(&f),
            typical: self.typical.map(&f),
            high: self.high.map(&f),
        }
    }
}

/// ワークシートの1データ行
///
/// ヘッダー行から作った列インデックスで取り出した型付きの行です。
/// 数値・日付のセルは、コード解決で行が残った場合にのみ変換されます。
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRow {
    /// ワークシート上の行番号（1始まり）
    pub row: usize,
    pub produto: Option<String>,
    pub variedade: Option<String>,
    pub classificacao: Option<String>,
    pub unit: UnitCode,
    pub low: CellValue,
    pub typical: CellValue,
    pub high: CellValue,
    pub weight: CellValue,
    pub date: CellValue,
}

/// IPVS形式の出力行
///
/// CSV列順は`<cod>,<data>,<min>,<ult>,<max>`で固定です。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpvsRecord {
    #[serde(rename = "<cod>")]
    pub code: String,

    #[serde(rename = "<data>")]
    pub date: NaiveDate,

    #[serde(rename = "<min>")]
    pub min: Option<f64>,

    #[serde(rename = "<ult>")]
    pub typical: Option<f64>,

    #[serde(rename = "<max>")]
    pub max: Option<f64>,
}

impl IpvsRecord {
    pub fn new(code: impl Into<String>, date: NaiveDate, prices: PriceTriple) -> Self {
        Self {
            code: code.into(),
            date,
            min: prices.low,
            typical: prices.typical,
            max: prices.high,
        }
    }

    /// 数値列（min, ult, max）をトリプルとして取得
    pub fn prices(&self) -> PriceTriple {
        PriceTriple::new(self.min, self.typical, self.max)
    }
}
