//! Directory Scanner Module
//!
//! 受信ディレクトリを走査し、未登録のファイルを台帳へ`UNPROCESSED`として登録する。
//! 変換は行いません（登録のみ）。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IpvsError;
use crate::filename::{decode_filename, ledger_key, normalize_key};
use crate::ledger::Ledger;

/// 走査結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// 走査したファイル数
    pub scanned: usize,

    /// 今回新たに登録したファイル名（デコード済み）
    pub registered: Vec<String>,
}

impl ScanReport {
    /// 既に台帳に存在していたファイル数
    pub fn already_known(&self) -> usize {
        self.scanned - self.registered.len()
    }
}

/// ディレクトリ内の通常ファイルを名前順に列挙する
pub(crate) fn list_files(dir: &Path) -> Result<Vec<PathBuf>, IpvsError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// ディレクトリを走査し、未登録のファイルを台帳へ登録する
///
/// # 引数
///
/// * `dir` - 受信ディレクトリ
/// * `ledger` - 台帳
///
/// # 戻り値
///
/// * `Ok(ScanReport)` - 走査結果
/// * `Err(IpvsError::Decode)` - ファイル名のデコードに失敗した場合（その時点で中断）
pub fn scan_directory(dir: &Path, ledger: &Ledger) -> Result<ScanReport, IpvsError> {
    ledger.ensure_initialized()?;

    let mut report = ScanReport::default();
    for path in list_files(dir)? {
        let name = decode_filename(&file_name_of(&path))?;
        report.scanned += 1;

        if !ledger.is_processed(&name)? && ledger.upsert_unprocessed(&name)? {
            report.registered.push(name);
        }
    }

    tracing::info!(
        dir = %dir.display(),
        scanned = report.scanned,
        registered = report.registered.len(),
        "directory scan complete"
    );
    Ok(report)
}

/// `UNPROCESSED`エントリに対応するファイルのパスを受信ディレクトリから探す
///
/// ディスク上のファイル名もデコードしてから比較キーで照合します。
/// ディスク上に見つからないエントリは警告を出してスキップします。
pub fn resolve_unprocessed(dir: &Path, ledger: &Ledger) -> Result<Vec<PathBuf>, IpvsError> {
    let pending = ledger.list_unprocessed()?;
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let mut on_disk = Vec::new();
    for path in list_files(dir)? {
        let key = ledger_key(&file_name_of(&path))?;
        on_disk.push((key, path));
    }

    let mut resolved = Vec::with_capacity(pending.len());
    for name in pending {
        let key = normalize_key(&name);
        match on_disk.iter().find(|(k, _)| *k == key) {
            Some((_, path)) => resolved.push(path.clone()),
            None => tracing::warn!(file = %name, "unprocessed entry has no file in raw directory"),
        }
    }

    tracing::debug!(count = resolved.len(), "resolved unprocessed files");
    Ok(resolved)
}
