//! Builder Module
//!
//! Fluent Builder APIを提供し、`Pipeline`インスタンスを段階的に構築する。

use std::path::{Path, PathBuf};

use crate::consolidate::{consolidate, ConsolidationReport};
use crate::converter::{convert_file, ConversionOutcome};
use crate::error::IpvsError;
use crate::ledger::{Ledger, LedgerEntry};
use crate::reference::ReferenceMap;
use crate::scanner::{resolve_unprocessed, scan_directory, ScanReport};
use crate::security::SecurityConfig;

/// 既定の受信ディレクトリ
pub const DEFAULT_RAW_DIR: &str = "data/raw";

/// 既定の台帳ファイル
pub const DEFAULT_LEDGER_PATH: &str = "data/logs/processed_list.json";

/// 既定のコード対応表
pub const DEFAULT_REFERENCE_PATH: &str = "data/processed/id_reference.csv";

/// 既定の出力ディレクトリ
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed/IPVS";

/// パイプラインの設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct PipelineConfig {
    /// 受信ディレクトリ（メール添付の保存先）
    pub raw_dir: PathBuf,

    /// 台帳ファイル
    pub ledger_path: PathBuf,

    /// コード対応表（`;`区切りCSV）
    pub reference_path: PathBuf,

    /// IPVS CSVの出力ディレクトリ
    pub output_dir: PathBuf,

    /// 入力ファイルの制限
    pub security: SecurityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            reference_path: PathBuf::from(DEFAULT_REFERENCE_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            security: SecurityConfig::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use ipvs_sync::PipelineBuilder;
///
/// # fn main() -> Result<(), ipvs_sync::IpvsError> {
/// let pipeline = PipelineBuilder::new()
///     .with_raw_dir("inbox")
///     .with_output_dir("out/IPVS")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PipelineBuilder {
    /// 内部設定（構築中）
    config: PipelineConfig,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 受信ディレクトリ: `data/raw`
    /// - 台帳: `data/logs/processed_list.json`
    /// - コード対応表: `data/processed/id_reference.csv`
    /// - 出力ディレクトリ: `data/processed/IPVS`
    /// - 入力ファイルの上限: 100MB
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// 受信ディレクトリを指定する
    pub fn with_raw_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.raw_dir = dir.into();
        self
    }

    /// 台帳ファイルのパスを指定する
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ledger_path = path.into();
        self
    }

    /// コード対応表のパスを指定する
    pub fn with_reference_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.reference_path = path.into();
        self
    }

    /// 出力ディレクトリを指定する
    ///
    /// 結合ファイル（`combined_IPVS.ipv`）もこのディレクトリに出力されます。
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// 入力ワークブックの最大サイズ（バイト）を指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ipvs_sync::PipelineBuilder;
    ///
    /// // 10MBに制限
    /// let builder = PipelineBuilder::new()
    ///     .with_max_input_file_size(10 * 1024 * 1024);
    /// ```
    pub fn with_max_input_file_size(mut self, bytes: u64) -> Self {
        self.config.security.max_input_file_size = bytes;
        self
    }

    /// 設定を検証し、`Pipeline`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Pipeline)`: 設定が有効な場合
    /// * `Err(IpvsError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * パスが空文字列
    /// * 出力ディレクトリが受信ディレクトリと同じ
    /// * 入力ファイルの上限が0
    pub fn build(self) -> Result<Pipeline, IpvsError> {
        // 1. パスの検証
        let paths = [
            ("raw directory", &self.config.raw_dir),
            ("ledger path", &self.config.ledger_path),
            ("reference path", &self.config.reference_path),
            ("output directory", &self.config.output_dir),
        ];
        for (label, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(IpvsError::Config(format!("{} must not be empty", label)));
            }
        }

        // 2. 出力先が受信ディレクトリと重ならないこと
        if self.config.output_dir == self.config.raw_dir {
            return Err(IpvsError::Config(format!(
                "Output directory must differ from raw directory: {}",
                self.config.raw_dir.display()
            )));
        }

        // 3. サイズ上限の検証
        if self.config.security.max_input_file_size == 0 {
            return Err(IpvsError::Config(
                "Maximum input file size must be greater than 0".to_string(),
            ));
        }

        Ok(Pipeline::new(self.config))
    }
}

/// `run`の実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub scan: ScanReport,
    pub converted: Vec<ConversionOutcome>,
    /// 結合対象のIPVS CSVがなかった場合は`None`
    pub consolidation: Option<ConsolidationReport>,
}

/// 取り込み処理のファサード
///
/// 走査 → 変換 → 結合の各段階を、構築時の設定で実行します。
///
/// # 使用例
///
/// ```rust,no_run
/// use ipvs_sync::PipelineBuilder;
///
/// # fn main() -> Result<(), ipvs_sync::IpvsError> {
/// let pipeline = PipelineBuilder::new().build()?;
/// let report = pipeline.run()?;
/// println!("converted {} file(s)", report.converted.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    ledger: Ledger,
}

impl Pipeline {
    pub(crate) fn new(config: PipelineConfig) -> Self {
        Self {
            ledger: Ledger::new(config.ledger_path.clone()),
            config,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn raw_dir(&self) -> &Path {
        &self.config.raw_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// 受信ディレクトリを走査し、新しいファイルを台帳に登録する
    pub fn scan(&self) -> Result<ScanReport, IpvsError> {
        scan_directory(&self.config.raw_dir, &self.ledger)
    }

    /// `UNPROCESSED`のファイルをすべて変換する
    ///
    /// 最初に失敗したファイルでエラーを返します。それより前に変換したファイルは
    /// `PROCESSED`のまま残り、失敗したファイルは`UNPROCESSED`のまま次回再試行されます。
    /// 未処理のファイルがない場合、コード対応表は読み込みません。
    pub fn convert_pending(&self) -> Result<Vec<ConversionOutcome>, IpvsError> {
        let pending = resolve_unprocessed(&self.config.raw_dir, &self.ledger)?;
        if pending.is_empty() {
            tracing::info!("no unprocessed files");
            return Ok(Vec::new());
        }

        let reference = ReferenceMap::load(&self.config.reference_path)?;
        let mut outcomes = Vec::with_capacity(pending.len());
        for source in &pending {
            outcomes.push(convert_file(
                source,
                &reference,
                &self.config.output_dir,
                &self.ledger,
                &self.config.security,
            )?);
        }

        tracing::info!(converted = outcomes.len(), "conversion complete");
        Ok(outcomes)
    }

    /// 指定したワークブック1つを変換する
    pub fn convert_file(&self, source: &Path) -> Result<ConversionOutcome, IpvsError> {
        let reference = ReferenceMap::load(&self.config.reference_path)?;
        convert_file(
            source,
            &reference,
            &self.config.output_dir,
            &self.ledger,
            &self.config.security,
        )
    }

    /// 出力ディレクトリのIPVS CSVを結合する
    pub fn consolidate(&self) -> Result<ConsolidationReport, IpvsError> {
        consolidate(&self.config.output_dir)
    }

    /// 走査 → 変換 → 結合を順に実行する
    ///
    /// 結合対象がない場合（`NothingToConsolidate`）はエラーにせず、
    /// `consolidation`が`None`になります。
    pub fn run(&self) -> Result<RunReport, IpvsError> {
        let scan = self.scan()?;
        let converted = self.convert_pending()?;
        let consolidation = match self.consolidate() {
            Ok(report) => Some(report),
            Err(IpvsError::NothingToConsolidate(dir)) => {
                tracing::info!(dir = %dir.display(), "nothing to consolidate");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(RunReport {
            scan,
            converted,
            consolidation,
        })
    }

    /// 台帳の全エントリ
    pub fn status(&self) -> Result<Vec<LedgerEntry>, IpvsError> {
        self.ledger.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_builder_new() {
        let builder = PipelineBuilder::new();
        assert_eq!(builder.config.raw_dir, PathBuf::from("data/raw"));
        assert_eq!(
            builder.config.ledger_path,
            PathBuf::from("data/logs/processed_list.json")
        );
        assert_eq!(
            builder.config.reference_path,
            PathBuf::from("data/processed/id_reference.csv")
        );
        assert_eq!(builder.config.output_dir, PathBuf::from("data/processed/IPVS"));
        assert_eq!(builder.config.security.max_input_file_size, 104_857_600);
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = PipelineBuilder::new()
            .with_raw_dir("in")
            .with_ledger_path("state/ledger.json")
            .with_reference_path("ref.csv")
            .with_output_dir("out")
            .with_max_input_file_size(1024);

        assert_eq!(builder.config.raw_dir, PathBuf::from("in"));
        assert_eq!(builder.config.ledger_path, PathBuf::from("state/ledger.json"));
        assert_eq!(builder.config.reference_path, PathBuf::from("ref.csv"));
        assert_eq!(builder.config.output_dir, PathBuf::from("out"));
        assert_eq!(builder.config.security.max_input_file_size, 1024);
    }

    #[test]
    fn test_build_success() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        assert_eq!(pipeline.raw_dir(), Path::new("data/raw"));
        assert_eq!(
            pipeline.ledger().path(),
            Path::new("data/logs/processed_list.json")
        );
    }

    #[test]
    fn test_build_with_empty_path() {
        let result = PipelineBuilder::new().with_reference_path("").build();
        match result {
            Err(IpvsError::Config(msg)) => assert!(msg.contains("reference path")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_with_same_raw_and_output_dir() {
        let result = PipelineBuilder::new()
            .with_raw_dir("data/shared")
            .with_output_dir("data/shared")
            .build();
        assert!(matches!(result, Err(IpvsError::Config(_))));
    }

    #[test]
    fn test_build_with_zero_size_limit() {
        let result = PipelineBuilder::new().with_max_input_file_size(0).build();
        assert!(matches!(result, Err(IpvsError::Config(_))));
    }
}
