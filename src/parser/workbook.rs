//! Workbook Parser Module
//!
//! calamineで見積書ワークブックを開き、最初のワークシートを型付きの行に変換します。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::api::UnitCode;
use crate::error::IpvsError;
use crate::formatter::CellFormatter;
use crate::parser::columns::ColumnIndex;
use crate::security::SecurityConfig;
use crate::types::{CellValue, RawRow};

/// ワークブックパーサー
///
/// calamineのラッパーとして、最初のワークシートの読み込みを提供します。
pub(crate) struct WorkbookParser {
    /// calamineのワークブック（xlsx / xlsb / xls / ods）
    workbook: Sheets<Cursor<Vec<u8>>>,
    /// 元ファイルのパス（エラーメッセージ用）
    path: PathBuf,
    formatter: CellFormatter,
}

impl WorkbookParser {
    /// ワークブックを開く
    ///
    /// 形式は拡張子ではなく内容から判定します。
    /// MIMEエンコードされたままのファイル名は拡張子を持たないことがあります。
    ///
    /// # 引数
    ///
    /// * `path` - 見積書ファイルのパス
    /// * `security` - 入力サイズの上限
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - ワークブックの読み込みに成功した場合
    /// * `Err(IpvsError::SourceNotFound)` - ファイルが存在しない場合
    /// * `Err(IpvsError::SecurityViolation)` - サイズ上限を超える場合
    /// * `Err(IpvsError::Parse)` - ワークブックとして解析できない場合
    pub fn open(path: &Path, security: &SecurityConfig) -> Result<Self, IpvsError> {
        // セキュリティチェック: 入力ファイルサイズの上限
        security.check_input_file(path)?;

        let buffer = std::fs::read(path)?;
        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self {
            workbook,
            path: path.to_path_buf(),
            formatter: CellFormatter::new(),
        })
    }

    /// 最初のワークシートのデータ行を読み込む
    ///
    /// 1行目をヘッダーとして列インデックスを構築し、2行目以降を`RawRow`に変換します。
    /// すべてのセルが空の行はスキップします。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<RawRow>)` - データ行（ワークシート上の順序）
    /// * `Err(IpvsError::EmptyWorksheet)` - ワークシートがない、またはヘッダー行がない場合
    /// * `Err(IpvsError::MissingColumn)` - 必須列が見つからない場合
    pub fn read_rows(&mut self) -> Result<Vec<RawRow>, IpvsError> {
        let range = self.first_sheet()?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| IpvsError::EmptyWorksheet(self.path.clone()))?;
        let index = ColumnIndex::from_header(header, &self.path)?;

        // ヘッダー行の次の行番号（1始まり）
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0) + 2;

        let mut result = Vec::new();
        for (offset, cells) in rows.enumerate() {
            if cells.iter().all(|c| CellValue::from(c).is_empty()) {
                continue;
            }
            result.push(self.build_row(first_row + offset, cells, &index));
        }

        tracing::debug!(
            path = %self.path.display(),
            rows = result.len(),
            "read worksheet rows"
        );
        Ok(result)
    }

    fn first_sheet(&mut self) -> Result<Range<Data>, IpvsError> {
        match self.workbook.worksheet_range_at(0) {
            Some(range) => Ok(range?),
            None => Err(IpvsError::EmptyWorksheet(self.path.clone())),
        }
    }

    fn build_row(&self, row: usize, cells: &[Data], index: &ColumnIndex) -> RawRow {
        let cell = |idx: usize| {
            cells
                .get(idx)
                .map(CellValue::from)
                .unwrap_or(CellValue::Empty)
        };
        let text = |idx: usize| self.formatter.text(&cell(idx));

        RawRow {
            row,
            produto: text(index.produto),
            variedade: text(index.variedade),
            classificacao: text(index.classificacao),
            unit: UnitCode::parse(&text(index.unidade).unwrap_or_default()),
            low: cell(index.menor),
            typical: cell(index.comum),
            high: cell(index.maior),
            weight: cell(index.peso),
            date: cell(index.data),
        }
    }
}
