//! Parser Module
//!
//! calamineを使用した見積書ワークブックの読み込み。
//! ヘッダー行から列位置を決め、データ行を`RawRow`として取り出します。

mod columns;
mod workbook;

pub(crate) use columns::{COMUM, DATA, MAIOR, MENOR, PESO};
pub(crate) use workbook::WorkbookParser;
