//! Column Index Module
//!
//! ヘッダー行から列名 → 列インデックスの対応を1回だけ構築します。

use calamine::Data;
use std::path::Path;

use crate::error::IpvsError;
use crate::filename::normalize_key;
use crate::types::CellValue;

pub(crate) const PRODUTO: &str = "Produto";
pub(crate) const VARIEDADE: &str = "Variedade";
pub(crate) const CLASSIFICACAO: &str = "Classificação";
pub(crate) const UNIDADE: &str = "Unidade";
pub(crate) const MENOR: &str = "Menor";
pub(crate) const COMUM: &str = "Comum";
pub(crate) const MAIOR: &str = "Maior";
pub(crate) const PESO: &str = "Peso";
pub(crate) const DATA: &str = "Data";

/// 必須列の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnIndex {
    pub produto: usize,
    pub variedade: usize,
    pub classificacao: usize,
    pub unidade: usize,
    pub menor: usize,
    pub comum: usize,
    pub maior: usize,
    pub peso: usize,
    pub data: usize,
}

impl ColumnIndex {
    /// ヘッダー行から列インデックスを構築する
    ///
    /// 列名は前後の空白を除き、アクセント・大文字小文字を無視して比較します
    /// （`Classificação`と`CLASSIFICACAO`は同じ列）。同名の列が複数ある場合は最初の列を使います。
    ///
    /// # 戻り値
    ///
    /// * `Ok(ColumnIndex)` - すべての必須列が見つかった場合
    /// * `Err(IpvsError::MissingColumn)` - 必須列が見つからない場合
    pub fn from_header(header: &[Data], path: &Path) -> Result<Self, IpvsError> {
        let keys: Vec<Option<String>> = header
            .iter()
            .map(|cell| match CellValue::from(cell) {
                CellValue::String(s) => Some(normalize_key(s.trim())),
                _ => None,
            })
            .collect();

        let find = |name: &str| {
            let wanted = normalize_key(name);
            keys.iter()
                .position(|k| k.as_deref() == Some(wanted.as_str()))
                .ok_or_else(|| IpvsError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        };

        Ok(Self {
            produto: find(PRODUTO)?,
            variedade: find(VARIEDADE)?,
            classificacao: find(CLASSIFICACAO)?,
            unidade: find(UNIDADE)?,
            menor: find(MENOR)?,
            comum: find(COMUM)?,
            maior: find(MAIOR)?,
            peso: find(PESO)?,
            data: find(DATA)?,
        })
    }
}
