//! Output Module
//!
//! IPVS形式のCSV出力と読み込みを提供するモジュール。
//!
//! 列順は`<cod>,<data>,<min>,<ult>,<max>`で固定です。値のない価格は空フィールドになります。

use std::path::Path;

use crate::error::IpvsError;
use crate::filename::DateToken;
use crate::types::IpvsRecord;

/// IPVS CSVのヘッダー行
pub const IPVS_HEADER: [&str; 5] = ["<cod>", "<data>", "<min>", "<ult>", "<max>"];

/// 出力日付の書式
const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日付トークンから出力ファイル名を生成する（例: `IPVS_15032024.csv`）
pub fn ipvs_file_name(token: &DateToken) -> String {
    format!("IPVS_{}.csv", token.compact())
}

/// IPVSレコードをCSVファイルに書き込む
///
/// レコードが0件でもヘッダー行は出力します。既存のファイルは上書きされます。
///
/// # 戻り値
///
/// * `Ok(())` - 書き込みに成功した場合
/// * `Err(IpvsError::Csv)` - 書き込みに失敗した場合
pub fn write_ipvs(path: &Path, records: &[IpvsRecord]) -> Result<(), IpvsError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(IPVS_HEADER)?;
    for record in records {
        writer.write_record([
            record.code.clone(),
            record.date.format(DATE_FORMAT).to_string(),
            format_price(record.min),
            format_price(record.typical),
            format_price(record.max),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// IPVS CSVファイルを読み込む
///
/// # 戻り値
///
/// * `Ok(Vec<IpvsRecord>)` - ファイル内のレコード（ファイル内の順序）
/// * `Err(IpvsError::Csv)` - ファイルが存在しない、または形式が不正な場合
pub fn read_ipvs(path: &Path) -> Result<Vec<IpvsRecord>, IpvsError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        let record: IpvsRecord = record?;
        records.push(record);
    }
    Ok(records)
}

/// 価格を出力用の文字列に変換する
///
/// 整数値も小数点付き（`5.0`）で出力します。
fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceTriple;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_ipvs_file_name() {
        let token = DateToken::extract("Cotacao_15.03.2024.xlsx").unwrap();
        assert_eq!(ipvs_file_name(&token), "IPVS_15032024.csv");
    }

    #[test]
    fn test_write_ipvs_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IPVS_15032024.csv");
        let records = vec![
            IpvsRecord::new("TOM01", date(), PriceTriple::new(Some(4.5), Some(5.0), Some(6.25))),
            IpvsRecord::new("0042", date(), PriceTriple::unset()),
        ];

        write_ipvs(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "<cod>,<data>,<min>,<ult>,<max>\n\
             TOM01,2024-03-15,4.5,5.0,6.25\n\
             0042,2024-03-15,,,\n"
        );
    }

    #[test]
    fn test_write_ipvs_empty_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IPVS_15032024.csv");

        write_ipvs(&path, &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "<cod>,<data>,<min>,<ult>,<max>\n");
        assert!(read_ipvs(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_ipvs_parses_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IPVS_15032024.csv");
        std::fs::write(
            &path,
            "<cod>,<data>,<min>,<ult>,<max>\nABC,2024-03-15,1.5,,3\n",
        )
        .unwrap();

        let records = read_ipvs(&path).unwrap();
        assert_eq!(
            records,
            vec![IpvsRecord::new("ABC", date(), PriceTriple::new(Some(1.5), None, Some(3.0)))]
        );
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(2.0)), "2.0");
        assert_eq!(format_price(Some(0.333)), "0.333");
        assert_eq!(format_price(None), "");
    }
}
