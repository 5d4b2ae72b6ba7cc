//! Logging Module
//!
//! `tracing`と`tracing-subscriber`によるログ出力の初期化を提供するモジュール。
//!
//! # ログレベル
//!
//! - `error`: 変換の失敗（再送出の直前）
//! - `warn`: 除外・スキップした行やエントリ
//! - `info`: 各段階（走査・変換・結合）の集計
//! - `debug`: ファイル単位の詳細
//!
//! 環境変数`RUST_LOG`が設定されている場合は、そちらが優先されます。

use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::IpvsError;

/// ログの出力形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 人間向けの複数行形式
    #[default]
    Pretty,
    /// 1行形式
    Compact,
    /// 機械処理向けのJSON形式
    Json,
}

/// ログ設定
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 出力する最低レベル
    pub level: Level,
    pub format: LogFormat,
    /// ANSIカラーを使うか
    pub with_ansi: bool,
    /// ターゲット（モジュールパス）を出力するか
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            with_ansi: true,
            with_target: false,
        }
    }
}

impl LogConfig {
    /// `-v` / `-q`の指定回数からログ設定を作る
    ///
    /// - `quiet`: errorのみ
    /// - 0: info
    /// - 1: debug
    /// - 2以上: trace
    pub fn from_verbosity(verbosity: u8, quiet: bool) -> Self {
        let level = if quiet {
            Level::ERROR
        } else {
            match verbosity {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            }
        };
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }
}

/// グローバルなsubscriberを初期化する（標準エラー出力へ）
///
/// # 戻り値
///
/// * `Ok(())` - 初期化に成功した場合
/// * `Err(IpvsError::Config)` - すでに初期化済みの場合
pub fn init_logging(config: &LogConfig) -> Result<(), IpvsError> {
    let filter = build_env_filter(config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(config.with_target)
                    .without_time(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(config.with_target)
                    .without_time(),
            )
            .try_init(),
    };

    result.map_err(|e| IpvsError::Config(format!("failed to initialize logging: {}", e)))
}

/// `RUST_LOG`を優先し、なければ指定レベルのフィルタを作る
fn build_env_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,ipvs_sync={level}")))
}
