//! Ledger Module
//!
//! 処理済みファイル台帳（`processed_list.json`）を管理するモジュール。
//!
//! 台帳は1つのJSONドキュメントとして永続化されます。
//!
//! ```json
//! {
//!     "files": [
//!         { "name": "Cotacao_15.03.2024.xlsx", "status": "UNPROCESSED" }
//!     ]
//! }
//! ```
//!
//! 各操作は「読み込み → メモリ上で変更 → 一時ファイルへ書き出し → リネーム」の
//! 1トランザクションとして実行されます。書き込み途中で中断しても台帳が壊れることは
//! ありませんが、複数プロセスからの同時書き込みには対応しません（単一ライター前提）。
//!
//! エントリの比較はすべて[`normalize_key`]による比較キーで行います。

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::FileStatus;
use crate::error::IpvsError;
use crate::filename::normalize_key;

/// 台帳の1エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// デコード済みのファイル名
    pub name: String,

    /// 処理状態
    pub status: FileStatus,
}

impl LedgerEntry {
    /// このエントリの比較キー
    pub fn key(&self) -> String {
        normalize_key(&self.name)
    }
}

/// 台帳ドキュメント全体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub files: Vec<LedgerEntry>,
}

impl LedgerDocument {
    fn position(&self, name: &str) -> Option<usize> {
        let key = normalize_key(name);
        self.files.iter().position(|entry| entry.key() == key)
    }
}

/// 処理済みファイル台帳
///
/// # 使用例
///
/// ```rust,no_run
/// use ipvs_sync::{FileStatus, Ledger};
///
/// # fn main() -> Result<(), ipvs_sync::IpvsError> {
/// let ledger = Ledger::new("data/logs/processed_list.json");
/// ledger.upsert_unprocessed("Cotacao_15.03.2024.xlsx")?;
/// assert!(ledger.is_processed("cotacao_15.03.2024.xlsx")?);
///
/// ledger.mark_processed("Cotacao_15.03.2024.xlsx")?;
/// assert!(ledger.list_unprocessed()?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 台帳ファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 台帳ファイルが存在しない、または空の場合に`{"files": []}`で初期化する
    ///
    /// 冪等です。親ディレクトリが存在しない場合は作成します。
    pub fn ensure_initialized(&self) -> Result<(), IpvsError> {
        let needs_init = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if needs_init {
            tracing::debug!(path = %self.path.display(), "initializing empty ledger");
            self.save(&LedgerDocument::default())?;
        }
        Ok(())
    }

    /// 台帳ドキュメントを読み込む
    ///
    /// # 戻り値
    ///
    /// * `Ok(LedgerDocument)` - 読み込みに成功した場合
    /// * `Err(IpvsError::Ledger)` - ドキュメントが不正なJSONの場合
    pub fn load(&self) -> Result<LedgerDocument, IpvsError> {
        self.ensure_initialized()?;
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| IpvsError::Ledger {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// 台帳ドキュメントを書き出す（一時ファイル経由でアトミックに置き換え）
    fn save(&self, document: &LedgerDocument) -> Result<(), IpvsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document.serialize(&mut serializer)?;

        let tmp_path = self.temp_path();
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&buffer)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// 台帳の全エントリを取得
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, IpvsError> {
        Ok(self.load()?.files)
    }

    /// 指定した名前のファイルが台帳に登録済みかどうか
    ///
    /// 状態（`UNPROCESSED` / `PROCESSED`）は問いません。比較は正規化キーで行います。
    pub fn is_processed(&self, name: &str) -> Result<bool, IpvsError> {
        Ok(self.load()?.position(name).is_some())
    }

    /// 未登録の場合のみ`UNPROCESSED`としてエントリを追加する
    ///
    /// # 戻り値
    ///
    /// * `Ok(true)` - エントリを追加した場合
    /// * `Ok(false)` - 同じ正規化キーのエントリが既に存在した場合（何もしない）
    pub fn upsert_unprocessed(&self, name: &str) -> Result<bool, IpvsError> {
        let mut document = self.load()?;
        if document.position(name).is_some() {
            return Ok(false);
        }

        document.files.push(LedgerEntry {
            name: name.to_string(),
            status: FileStatus::Unprocessed,
        });
        self.save(&document)?;
        tracing::info!(file = name, "registered new file as UNPROCESSED");
        Ok(true)
    }

    /// 一致するエントリを`PROCESSED`にする
    ///
    /// 一致するエントリがない場合は何もしません（エラーにもしません）。
    ///
    /// # 戻り値
    ///
    /// * `Ok(true)` - エントリが見つかった場合
    /// * `Ok(false)` - 見つからなかった場合
    pub fn mark_processed(&self, name: &str) -> Result<bool, IpvsError> {
        let mut document = self.load()?;
        let Some(index) = document.position(name) else {
            tracing::debug!(file = name, "no ledger entry to mark as PROCESSED");
            return Ok(false);
        };

        let entry = &mut document.files[index];
        if entry.status != FileStatus::Processed {
            entry.status = FileStatus::Processed;
            self.save(&document)?;
        }
        tracing::info!(file = name, "marked as PROCESSED");
        Ok(true)
    }

    /// `UNPROCESSED`のエントリ名を台帳の順序で取得
    pub fn list_unprocessed(&self) -> Result<Vec<String>, IpvsError> {
        Ok(self
            .load()?
            .files
            .into_iter()
            .filter(|entry| entry.status == FileStatus::Unprocessed)
            .map(|entry| entry.name)
            .collect())
    }
}
