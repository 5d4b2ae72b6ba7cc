//! Filename Normalizer Module
//!
//! メール添付ファイル名の正規化を提供するモジュール。
//!
//! 同じ物理ファイルが、MIMEエンコード（RFC 2047）の有無、合成済み／分解済みの
//! アクセント文字、大文字小文字の違いなどで別の文字列として現れることがあります。
//! ここで定義する比較キーにより、それらを同一ファイルとして認識します。

use base64::Engine as _;
use encoding_rs::Encoding;
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::IpvsError;

/// 既知の問題語とその置換先
const TERM_SUBSTITUTION: (&str, &str) = ("Cotação", "Cotacao");

fn encoded_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"=\?([^?]*)\?([qQbB])\?(.*?)\?=").expect("encoded-word pattern is valid")
    })
}

fn date_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{2}\.\d{2}\.\d{4}").expect("date token pattern is valid"))
}

/// ファイル名をデコードし、表示用の名前に正規化する
///
/// 1. RFC 2047のエンコードワード（`=?charset?B?...?=` / `=?charset?Q?...?=`）をデコード
/// 2. NFC（合成済み形式）に揃える
/// 3. `Cotação` → `Cotacao` の置換を適用
///
/// # 戻り値
///
/// * `Ok(String)` - デコード済みのファイル名
/// * `Err(IpvsError::Decode)` - ペイロードが壊れている、または未対応の文字セットの場合
pub fn decode_filename(raw: &str) -> Result<String, IpvsError> {
    let decoded = decode_mime_words(raw)?;
    let composed: String = decoded.nfc().collect();
    Ok(composed.replace(TERM_SUBSTITUTION.0, TERM_SUBSTITUTION.1))
}

/// 台帳の比較キーを生成する
///
/// 小文字化した後にNFD分解し、結合文字（アクセント記号）を除去します。
///
/// # 使用例
///
/// ```rust
/// use ipvs_sync::normalize_key;
///
/// assert_eq!(normalize_key("Cotação_15.03.2024.XLSX"), "cotacao_15.03.2024.xlsx");
/// ```
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// 生のファイル名から台帳の比較キーを生成する
///
/// `normalize_key(decode_filename(raw)?)` と同じです。
pub fn ledger_key(raw: &str) -> Result<String, IpvsError> {
    Ok(normalize_key(&decode_filename(raw)?))
}

/// ファイル名に埋め込まれた日付トークン（`DD.MM.YYYY`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateToken(String);

impl DateToken {
    /// ファイル名中の最初の`DD.MM.YYYY`を抽出する
    pub fn extract(name: &str) -> Option<Self> {
        date_token_regex()
            .find(name)
            .map(|m| DateToken(m.as_str().to_string()))
    }

    /// ファイル名に現れたままの形式（例: `15.03.2024`）
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 区切りを除いた形式（例: `15032024`）
    pub fn compact(&self) -> String {
        self.0.replace('.', "")
    }
}

/// 文字列中のRFC 2047エンコードワードをすべてデコードする
///
/// エンコードワード同士の間にある空白のみの区間は取り除きます。
/// パターンに一致しない部分はそのまま残します。
pub fn decode_mime_words(raw: &str) -> Result<String, IpvsError> {
    let mut result = String::with_capacity(raw.len());
    let mut last_end = 0;
    let mut previous_was_word = false;

    for caps in encoded_word_regex().captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let gap = &raw[last_end..whole.start()];
        if !(previous_was_word && gap.trim().is_empty()) {
            result.push_str(gap);
        }

        let charset = &caps[1];
        let encoding = &caps[2];
        let payload = &caps[3];

        let bytes = match encoding {
            "b" | "B" => decode_b(payload),
            _ => decode_q(payload),
        }
        .map_err(|message| decode_error(raw, message))?;

        result.push_str(&decode_charset(charset, &bytes).map_err(|m| decode_error(raw, m))?);

        last_end = whole.end();
        previous_was_word = true;
    }

    result.push_str(&raw[last_end..]);
    Ok(result)
}

fn decode_error(raw: &str, message: String) -> IpvsError {
    IpvsError::Decode {
        name: raw.to_string(),
        message,
    }
}

/// `B`エンコーディング（base64）のデコード
///
/// 末尾のパディングが欠けている場合は補います。
fn decode_b(payload: &str) -> Result<Vec<u8>, String> {
    let mut padded = payload.trim_end_matches('=').to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    base64::engine::general_purpose::STANDARD
        .decode(padded.as_bytes())
        .map_err(|e| format!("invalid base64 payload: {}", e))
}

/// `Q`エンコーディング（quoted-printableの変種）のデコード
fn decode_q(payload: &str) -> Result<Vec<u8>, String> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| format!("invalid quoted-printable escape at offset {}", i))?;
                out.push(hex);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// 文字セットに従ってバイト列を文字列に変換する
///
/// ラベルの解釈は`encoding_rs`（WHATWG Encoding Standard）に従います。
/// RFC 2231の言語指定（`utf-8*pt`）は無視します。
fn decode_charset(charset: &str, bytes: &[u8]) -> Result<String, String> {
    let label = charset.split('*').next().unwrap_or_default().trim();

    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| format!("unsupported charset '{}'", label))?;

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| format!("malformed {} payload", encoding.name()))
}
