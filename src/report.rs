//! レポートモジュール
//!
//! ソート済みの頻度ペアを整形して出力する。制御文字はエスケープ
//! 表現に変換して人間が読める形にする。

use std::io::{self, Write};
use std::path::Path;

use crate::freq_map::Pair;

/// シフトを表す制御コード（\s と表示する）
const ASCII_SHIFT: u8 = 0x0e;

/// キーのバイト列を表示用文字列に変換する
///
/// 変換表（ctrl_to_escape = true）:
/// 改行→`\n`、タブ→`\t`、0x0E→`\s`、バックスペース→`\b`、
/// バックスラッシュ→`\\`。false の場合はタブとバックスラッシュを
/// そのまま出力する。その他のバイトはそのまま。
pub fn escape_sequence(key: &[u8], ctrl_to_escape: bool) -> String {
    let mut out = String::with_capacity(key.len());
    for &b in key {
        if ctrl_to_escape {
            match b {
                b'\n' => out.push_str("\\n"),
                b'\t' => out.push_str("\\t"),
                ASCII_SHIFT => out.push_str("\\s"),
                0x08 => out.push_str("\\b"),
                b'\\' => out.push_str("\\\\"),
                _ => out.push(b as char),
            }
        } else {
            match b {
                b'\n' => out.push_str("\\n"),
                ASCII_SHIFT => out.push_str("\\s"),
                0x08 => out.push_str("\\b"),
                _ => out.push(b as char),
            }
        }
    }
    out
}

/// 表示する件数を切り詰める（0は無制限）
fn truncate(pairs: &[Pair], limit: usize) -> &[Pair] {
    if limit > 0 && pairs.len() > limit {
        &pairs[..limit]
    } else {
        pairs
    }
}

/// ペア列を1行ずつ出力する
///
/// 各行は「キー 値」。値は整数に切り捨てて表示し、末尾に空行を置く。
pub fn print_pairs(
    out: &mut impl Write,
    pairs: &[Pair],
    limit: usize,
    ctrl_to_escape: bool,
) -> io::Result<()> {
    for pair in truncate(pairs, limit) {
        writeln!(
            out,
            "{} {}",
            escape_sequence(&pair.key, ctrl_to_escape),
            pair.value as i64
        )?;
    }
    writeln!(out)?;
    Ok(())
}

/// 集計結果をJSONファイルに保存する
pub fn save_json(pairs: &[Pair], limit: usize, path: &Path) {
    let entries: Vec<serde_json::Value> = truncate(pairs, limit)
        .iter()
        .map(|p| {
            serde_json::json!({
                "sequence": escape_sequence(&p.key, true),
                "weight": p.value,
            })
        })
        .collect();

    let json = serde_json::json!({
        "name": "Corpus Frequency Result",
        "total_keys": pairs.len(),
        "entries": entries,
    });

    match serde_json::to_string_pretty(&json) {
        Ok(text) => match std::fs::write(path, text) {
            Ok(_) => println!("\n結果を保存: {:?}", path),
            Err(e) => eprintln!("\n保存エラー: {}", e),
        },
        Err(e) => eprintln!("\nJSON生成エラー: {}", e),
    }
}
