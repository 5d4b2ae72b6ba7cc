//! Code Reference Module
//!
//! 商品の複合キー（品名 + 品種 + 等級）から短いコードへの対応表を読み込むモジュール。
//! 対応表は`;`区切りのCSVで、少なくとも`UNIQUE_CONCAT`列と`cod`列を持ちます。

use std::collections::HashMap;
use std::path::Path;

use crate::error::IpvsError;

/// 欠損した分類値の代替トークン
pub const MISSING_CATEGORY: &str = "N/A";

/// コードが解決できなかった場合の値
pub const UNKNOWN_CODE: &str = "Unknown";

const KEY_COLUMN: &str = "UNIQUE_CONCAT";
const CODE_COLUMN: &str = "cod";

/// 分類値（品名・品種・等級）を正規化する
///
/// 欠損・空文字列は`N/A`、空白文字は`_`に置き換えます。
pub fn normalize_category(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.replace(' ', "_"),
        _ => MISSING_CATEGORY.to_string(),
    }
}

/// 3つの分類値から複合キーを生成する（品名, 品種, 等級の順）
///
/// # 使用例
///
/// ```rust
/// use ipvs_sync::composite_key;
///
/// assert_eq!(
///     composite_key(Some("ALFACE CRESPA"), None, Some("EXTRA")),
///     "ALFACE_CRESPAN/AEXTRA"
/// );
/// ```
pub fn composite_key(
    produto: Option<&str>,
    variedade: Option<&str>,
    classificacao: Option<&str>,
) -> String {
    let mut key = normalize_category(produto);
    key.push_str(&normalize_category(variedade));
    key.push_str(&normalize_category(classificacao));
    key
}

/// 複合キー → コードの対応表（読み取り専用）
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    codes: HashMap<String, String>,
}

impl ReferenceMap {
    /// 参照CSVを読み込む
    ///
    /// キーが重複する場合は後の行が優先されます。キーが空の行は無視します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(ReferenceMap)` - 読み込みに成功した場合
    /// * `Err(IpvsError::Reference)` - ファイルがない、必須列がない、CSVが不正な場合
    pub fn load(path: &Path) -> Result<Self, IpvsError> {
        let reference_error = |message: String| IpvsError::Reference {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_path(path)
            .map_err(|e| reference_error(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| reference_error(e.to_string()))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| reference_error(format!("missing column '{}'", name)))
        };
        let key_idx = column(KEY_COLUMN)?;
        let code_idx = column(CODE_COLUMN)?;

        let mut codes = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| reference_error(e.to_string()))?;
            let key = record.get(key_idx).unwrap_or_default();
            if key.is_empty() {
                continue;
            }
            let code = record.get(code_idx).unwrap_or_default().trim();
            codes.insert(key.to_string(), code.to_string());
        }

        tracing::debug!(path = %path.display(), entries = codes.len(), "loaded code reference");
        Ok(Self { codes })
    }

    /// キーとコードの組から対応表を作る
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            codes: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 複合キーに対応するコードを返す（完全一致、なければ`Unknown`）
    pub fn resolve(&self, key: &str) -> &str {
        self.codes.get(key).map(String::as_str).unwrap_or(UNKNOWN_CODE)
    }

    /// 登録されているキーの数
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// 対応表が空かどうか
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
