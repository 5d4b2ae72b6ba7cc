//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// 台帳エントリの処理状態
///
/// JSON上では`"UNPROCESSED"` / `"PROCESSED"`として保存されます。
/// 状態遷移は`Unprocessed → Processed`の一方向のみです。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    /// 登録済み・未変換（次回の変換対象）
    Unprocessed,

    /// 変換済み
    Processed,
}

impl FileStatus {
    /// 台帳に保存される文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Unprocessed => "UNPROCESSED",
            FileStatus::Processed => "PROCESSED",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 価格に適用する換算方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitConversion {
    /// そのまま出力
    PassThrough,

    /// 行の重量（`Peso`）で割る
    PerWeight,

    /// 12で割る（ダース → 単位）
    PerDozen,

    /// 値を設定しない（未知の単位）
    Unset,
}

/// 見積書の単位コード（`Unidade`列）
///
/// # 換算ルール
///
/// | 単位 | 換算 |
/// | ---- | ---- |
/// | `KG`, `MC` | そのまま |
/// | `ENG`, `UN` | 重量で割る |
/// | `DZMC` | 12で割る |
/// | その他 | 値なし |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitCode {
    Kg,
    Mc,
    Eng,
    Un,
    Dzmc,
    /// 上記以外（空文字列を含む）
    Other(String),
}

impl UnitCode {
    /// セルの文字列から単位コードを判定する
    ///
    /// 前後の空白を除去し、ASCII大文字に揃えてから比較します。
    pub fn parse(raw: &str) -> Self {
        let code = raw.trim().to_ascii_uppercase();
        match code.as_str() {
            "KG" => UnitCode::Kg,
            "MC" => UnitCode::Mc,
            "ENG" => UnitCode::Eng,
            "UN" => UnitCode::Un,
            "DZMC" => UnitCode::Dzmc,
            _ => UnitCode::Other(code),
        }
    }

    /// 単位コードの文字列表現
    pub fn as_str(&self) -> &str {
        match self {
            UnitCode::Kg => "KG",
            UnitCode::Mc => "MC",
            UnitCode::Eng => "ENG",
            UnitCode::Un => "UN",
            UnitCode::Dzmc => "DZMC",
            UnitCode::Other(code) => code,
        }
    }

    /// この単位に適用する換算方法
    pub fn conversion(&self) -> UnitConversion {
        match self {
            UnitCode::Kg | UnitCode::Mc => UnitConversion::PassThrough,
            UnitCode::Eng | UnitCode::Un => UnitConversion::PerWeight,
            UnitCode::Dzmc => UnitConversion::PerDozen,
            UnitCode::Other(_) => UnitConversion::Unset,
        }
    }
}
