//! エラーモジュール
//!
//! 解析処理のエラー種別を定義する。ファイル単位のエラーは
//! そのファイルの集計のみを中止し、他のファイルの処理は続行する。

use std::path::PathBuf;

use thiserror::Error;

/// 頻度解析のエラー
#[derive(Debug, Error)]
pub enum FreqError {
    /// ファイル読み込み失敗（該当ファイルのみスキップ）
    #[error("ファイル読み込みエラー {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 正規表現のコンパイル失敗
    #[error("無効な正規表現 '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// 正規表現がマッチエンジンのリソース上限を超過
    ///
    /// コンパイルエラーと区別して伝播する（黙って誤集計しない）。
    #[error("正規表現がリソース上限を超過 '{pattern}': {message}")]
    PatternTooLarge { pattern: String, message: String },

    /// マッチ数0のファイルは正規化（重み/マッチ数）が定義できない
    #[error("マッチが1件もないため正規化できません: {path}", path = .path.display())]
    NoMatches { path: PathBuf },

    /// 設定ファイルの解析失敗
    #[error("設定ファイル解析エラー {path}: {message}", path = .path.display())]
    Config { path: PathBuf, message: String },

    /// ファイル数と重みの個数の不一致
    #[error("ファイル数({files})と重みの個数({multipliers})が一致しません")]
    MultiplierMismatch { files: usize, multipliers: usize },
}
