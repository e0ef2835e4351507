//! 設定モジュール
//!
//! 集計対象のコーパスファイルと重みの組を管理する。
//! JSON設定ファイルまたはコマンドライン引数から構築する。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FreqError;

/// 1コーパスファイルの設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// ファイルパス
    pub path: PathBuf,
    /// 重み（このファイルの寄与合計）
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

/// コーパスセット
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// 集計対象のファイル一覧
    pub files: Vec<CorpusEntry>,
}

impl CorpusConfig {
    /// JSON設定ファイルから読み込む
    ///
    /// 形式: `{"files": [{"path": "...", "multiplier": 18}, ...]}`
    pub fn from_json_file(path: &Path) -> Result<Self, FreqError> {
        let text = std::fs::read_to_string(path).map_err(|source| FreqError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| FreqError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// コマンドライン引数から構築する
    ///
    /// 重みを指定しない場合は全ファイル1.0。指定する場合は
    /// ファイル数と同数でなければならない。
    pub fn from_cli(files: &[PathBuf], multipliers: &[f64]) -> Result<Self, FreqError> {
        if !multipliers.is_empty() && multipliers.len() != files.len() {
            return Err(FreqError::MultiplierMismatch {
                files: files.len(),
                multipliers: multipliers.len(),
            });
        }

        Ok(Self {
            files: files
                .iter()
                .enumerate()
                .map(|(i, path)| CorpusEntry {
                    path: path.clone(),
                    multiplier: multipliers.get(i).copied().unwrap_or(1.0),
                })
                .collect(),
        })
    }
}

// ============================================================================
// パターンプリセット
// ============================================================================

/// 名前付きパターンプリセット
///
/// サブ式を2個以上持つパターンは先頭の1個しか尊重されない点に注意。
pub const PRESETS: &[(&str, &str)] = &[
    ("letters", "[a-z]"),
    ("letter-digraphs", "[a-z]{2,2}"),
    ("letter-trigraphs", "[a-z]{3,3}"),
    ("main30", "[a-z.,;']"),
    ("main30-digraphs", "[a-z.,;']{2,2}"),
    ("main30-trigraphs", "[a-z.,;']{3,3}"),
    ("digraphs-nospc", "[^\n\t ]{2,2}"),
    ("chars", "."),
    ("digraphs", ".."),
    ("trigraphs", "..."),
    // 単語はアポストロフィで始まらず、終わらない
    ("words", "((([a-z])+('[a-z])?)+)"),
    ("first-letter", "([a-z])[a-z]*"),
];

/// プリセット名からパターンを引く
pub fn preset_pattern(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, pattern)| *pattern)
}

/// プリセット名の一覧（ヘルプ表示用）
pub fn preset_names() -> String {
    PRESETS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}
