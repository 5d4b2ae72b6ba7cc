//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;
use thiserror::Error;

/// ipvs-syncクレート全体で使用するエラー型
///
/// 台帳（Ledger）の読み書き、ワークブックの解析、IPVSファイルの出力など、
/// パイプライン中に発生するすべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `Io` / `Parse` / `Csv` / `Json`: 下位クレート由来のエラー（自動変換）
/// - `Decode`: MIMEエンコードされたファイル名のデコード失敗
/// - `Ledger`: 台帳ドキュメントが壊れている
/// - `SourceNotFound` / `MissingDateToken` / `MissingColumn` / `InvalidCell`:
///   1ファイルの変換を中断させる致命的エラー（台帳は`UNPROCESSED`のまま）
///
/// 未解決のコードや未知の単位はエラーではありません（行の除外・値の未設定で扱う）。
#[derive(Error, Debug)]
pub enum IpvsError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// CSVの読み書きエラー（参照テーブル・IPVSファイル）
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSONのシリアライズ／デシリアライズエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MIMEエンコードされたファイル名のデコードに失敗
    ///
    /// 登録処理はこのエラーで中断され、呼び出し元へ伝播します（フォールバックなし）。
    #[error("Failed to decode file name '{name}': {message}")]
    Decode {
        /// デコード対象の生のファイル名
        name: String,
        /// 詳細メッセージ
        message: String,
    },

    /// 台帳ドキュメントが不正
    ///
    /// 空ファイル・ファイルなしの場合は自動初期化されるため、このエラーにはなりません。
    #[error("Malformed ledger at {path}: {message}")]
    Ledger {
        /// 台帳ファイルのパス
        path: PathBuf,
        /// 詳細メッセージ
        message: String,
    },

    /// 参照テーブルの読み込みに失敗
    #[error("Failed to load reference table {path}: {message}")]
    Reference { path: PathBuf, message: String },

    /// 変換対象のファイルが存在しない
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// ファイル名に`DD.MM.YYYY`形式の日付が含まれていない
    #[error("Date not found in file name: {0}")]
    MissingDateToken(String),

    /// ヘッダー行に必須列が存在しない
    #[error("Required column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// 先頭ワークシートが存在しない、またはヘッダー行がない
    #[error("Workbook {0} has no worksheet with a header row")]
    EmptyWorksheet(PathBuf),

    /// セル値を期待する型へ変換できない
    ///
    /// `row`はワークシート上の1始まりの行番号です。
    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
    },

    /// 統合対象のIPVSファイルが1つもない
    #[error("No IPVS files to consolidate in {0}")]
    NothingToConsolidate(PathBuf),

    /// 設定の検証に失敗したエラー
    ///
    /// `PipelineBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// 入力サイズ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

/// `IpvsError`を使用する`Result`型エイリアス
pub type Result<T> = std::result::Result<T, IpvsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: IpvsError = io_err.into();

        match error {
            IpvsError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let parse_err = calamine::Error::Msg("Corrupted file");
        let error: IpvsError = parse_err.into();

        let error_msg = error.to_string();
        assert!(error_msg.contains("Failed to parse workbook"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: IpvsError = json_err.into();
        assert!(matches!(error, IpvsError::Json(_)));
    }

    #[test]
    fn test_decode_error_display() {
        let error = IpvsError::Decode {
            name: "=?utf-8?X?abc?=".to_string(),
            message: "unknown encoding 'X'".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("=?utf-8?X?abc?="));
        assert!(msg.contains("unknown encoding"));
    }

    #[test]
    fn test_missing_date_token_display() {
        let error = IpvsError::MissingDateToken("Cotacao_sem_data.xlsx".to_string());
        assert_eq!(
            error.to_string(),
            "Date not found in file name: Cotacao_sem_data.xlsx"
        );
    }

    #[test]
    fn test_invalid_cell_display() {
        let error = IpvsError::InvalidCell {
            row: 4,
            column: "Menor".to_string(),
            value: "abc".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("'abc'"));
        assert!(msg.contains("'Menor'"));
        assert!(msg.contains("row 4"));
    }

    // エラー変換のテスト（?演算子の動作確認）
    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<()> {
            let _file = std::fs::File::open("nonexistent_ledger.json")?;
            Ok(())
        }

        match io_operation() {
            Err(IpvsError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    #[test]
    fn test_config_error_display() {
        let error = IpvsError::Config("output dir must differ from raw dir".to_string());
        assert!(error.to_string().starts_with("Configuration error"));
    }
}
