//! Security Module
//!
//! 入力ファイルに対するサイズ制限を提供するモジュール。
//! ワークブックはcalamineで全体をメモリに展開するため、読み込み前に上限を確認します。

use std::path::Path;

use crate::error::IpvsError;

/// セキュリティ設定
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 入力ワークブックの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: 104_857_600, // 100MB
        }
    }
}

impl SecurityConfig {
    /// 入力ファイルの存在とサイズを検証する
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - ファイルが存在し、上限以下の場合
    /// * `Err(IpvsError::SourceNotFound)` - ファイルが存在しない場合
    /// * `Err(IpvsError::SecurityViolation)` - 上限を超える場合
    pub fn check_input_file(&self, path: &Path) -> Result<(), IpvsError> {
        let metadata = match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(IpvsError::SourceNotFound(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IpvsError::SourceNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.len() > self.max_input_file_size {
            return Err(IpvsError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                metadata.len(),
                self.max_input_file_size
            )));
        }
        Ok(())
    }
}
