//! スキャンモジュール
//!
//! 正規表現でバッファを走査し、マッチ列を頻度マップへ集計する。
//! ファイルごとに「計数パス→重み付け集計パス」の2段階で実行し、
//! 1ファイルの寄与合計が常にそのファイルの重みと一致するようにする。

use std::path::Path;

use regex::bytes::{Regex, RegexBuilder};

use crate::error::FreqError;
use crate::freq_map::FreqMap;

/// 1回のマッチ試行で参照する最大バイト数
///
/// 試行ごとにバッファ残り全体ではなくこの窓だけをマッチャに渡す。
pub const MAX_TOKEN_LEN: usize = 1000;

/// 正規表現をコンパイルする（常に大文字小文字を無視）
///
/// バイト単位でマッチし、`.` は改行を含む任意の1バイトに一致する。
/// サブ式（キャプチャグループ）は先頭の1個のみ尊重する。2個以上の
/// 挙動は未規定（既知の制限）。
pub fn compile_pattern(pattern: &str) -> Result<Regex, FreqError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(false)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| match e {
            regex::Error::CompiledTooBig(_) => FreqError::PatternTooLarge {
                pattern: pattern.to_string(),
                message: e.to_string(),
            },
            _ => FreqError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            },
        })
}

/// パターン形状から重複マッチ可否を判定する
///
/// `+` や `*` を含む可変長パターンは非重複、固定長パターンは重複。
pub fn auto_overlap(pattern: &str) -> bool {
    !(pattern.contains('+') || pattern.contains('*'))
}

/// バッファをASCII小文字に正規化する
pub fn normalize_case(buffer: &mut [u8]) {
    buffer.make_ascii_lowercase();
}

/// キーとして登録可能なバイト列かどうか
///
/// 印字可能ASCII・改行・タブ以外を含む列は登録しない。
fn legal_bytes(sequence: &[u8]) -> bool {
    sequence
        .iter()
        .all(|&b| matches!(b, 0x20..=0x7e | b'\n' | b'\t'))
}

/// バッファを走査してマッチ数を返す
///
/// mapがSomeなら、マッチごとにキーへweightを加算する。mapがNoneなら
/// 計数のみ行う（正規化の1パス目）。キーはサブ式1が非空ならその範囲、
/// なければマッチ全体。不正なバイトを含むキーは登録しないが、
/// マッチ数には数える（両パスで同じ数え方をするため）。
///
/// 前進規則: overlapなら直前マッチ開始の1バイト先へ、非overlapなら
/// 直前マッチ終端へ進む。空マッチで停止しないよう、前進は常に
/// 1バイト以上とする。現在位置でマッチしなくなった時点で終了する。
pub fn scan(
    mut map: Option<&mut FreqMap>,
    buffer: &[u8],
    re: &Regex,
    overlap: bool,
    weight: f64,
) -> usize {
    let mut matches = 0;
    let mut i = 0;

    while i < buffer.len() {
        let window_end = buffer.len().min(i + MAX_TOKEN_LEN);
        let caps = match re.captures(&buffer[i..window_end]) {
            Some(caps) => caps,
            None => break, // これ以上マッチしない
        };
        let Some(whole) = caps.get(0) else { break };

        let token = match caps.get(1) {
            Some(sub) if !sub.is_empty() => sub.as_bytes(),
            _ => whole.as_bytes(),
        };

        if legal_bytes(token) {
            if let Some(m) = map.as_deref_mut() {
                m.increment(token, weight);
            }
        }
        matches += 1;

        i += if overlap {
            whole.start() + 1
        } else {
            whole.end().max(whole.start() + 1)
        };
    }

    matches
}

/// 1ファイルを読み込み、重み付きで頻度マップを作る
///
/// 2段階実行: まず計数のみでマッチ総数を求め、
/// `weight = multiplier / マッチ数` を1マッチあたりの寄与として
/// 再走査する。これにより生のマッチ数に関係なく、ファイルの寄与
/// 合計は常にmultiplierになる。マッチ数0のファイルは除算が定義
/// できないためNoMatchesを返す。
pub fn scan_file(
    path: &Path,
    re: &Regex,
    overlap: bool,
    multiplier: f64,
    case_sensitive: bool,
) -> Result<FreqMap, FreqError> {
    let mut buffer = std::fs::read(path).map_err(|source| FreqError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !case_sensitive {
        normalize_case(&mut buffer);
    }

    let count = scan(None, &buffer, re, overlap, 1.0);
    if count == 0 {
        return Err(FreqError::NoMatches {
            path: path.to_path_buf(),
        });
    }

    let weight = multiplier / count as f64;
    let mut map = FreqMap::new();
    scan(Some(&mut map), &buffer, re, overlap, weight);
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_single_byte_pattern_with_overlap() {
        let re = compile_pattern(".").unwrap();
        let mut map = FreqMap::new();
        let count = scan(Some(&mut map), b"aabb", &re, true, 1.0);
        assert_eq!(count, 4);
        assert_eq!(map.get(b"a"), Some(2.0));
        assert_eq!(map.get(b"b"), Some(2.0));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_count_only_pass() {
        let re = compile_pattern("..").unwrap();
        assert_eq!(scan(None, b"abcd", &re, true, 1.0), 3);
        assert_eq!(scan(None, b"abcd", &re, false, 1.0), 2);
    }

    #[test]
    fn test_auto_overlap_detection() {
        assert!(auto_overlap("[a-z]"));
        assert!(auto_overlap("[a-z]{2,2}"));
        assert!(auto_overlap(".."));
        assert!(!auto_overlap("[a-z]+"));
        assert!(!auto_overlap("[a-z]*x"));
    }

    #[test]
    fn test_capture_group_is_the_key() {
        // 単語の先頭1文字だけをキーにする
        let re = compile_pattern("([a-z])[a-z]*").unwrap();
        let mut map = FreqMap::new();
        let count = scan(Some(&mut map), b"foo bar baz", &re, false, 1.0);
        assert_eq!(count, 3);
        assert_eq!(map.get(b"f"), Some(1.0));
        assert_eq!(map.get(b"b"), Some(2.0));
        assert_eq!(map.get(b"foo"), None);
    }

    #[test]
    fn test_case_insensitive_matching() {
        let re = compile_pattern("[a-z]").unwrap();
        let mut map = FreqMap::new();
        let count = scan(Some(&mut map), b"aA", &re, true, 1.0);
        assert_eq!(count, 2);
        // マップ自体は正規化しないので、キーはマッチしたままのバイト列
        assert_eq!(map.get(b"a"), Some(1.0));
        assert_eq!(map.get(b"A"), Some(1.0));
    }

    #[test]
    fn test_illegal_bytes_counted_but_not_inserted() {
        let re = compile_pattern("..").unwrap();
        let mut map = FreqMap::new();
        // 0x01 は印字不能。これを含むマッチは登録されないが数えられる
        let count = scan(Some(&mut map), b"a\x01b", &re, true, 1.0);
        assert_eq!(count, 2);
        assert!(!map.exists(b"a\x01"));
        assert!(!map.exists(b"\x01b"));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_newline_and_tab_are_legal() {
        let re = compile_pattern("..").unwrap();
        let mut map = FreqMap::new();
        scan(Some(&mut map), b"a\nb\tc", &re, false, 1.0);
        assert!(map.exists(b"a\n"));
        assert!(map.exists(b"b\t"));
    }

    #[test]
    fn test_window_caps_match_length() {
        // 2000バイトの連続トークンは1000バイトの窓で2回に分かれる
        let re = compile_pattern("a+").unwrap();
        let buffer = vec![b'a'; 2 * MAX_TOKEN_LEN];
        let mut map = FreqMap::new();
        let count = scan(Some(&mut map), &buffer, &re, false, 1.0);
        assert_eq!(count, 2);
        assert_eq!(map.get(vec![b'a'; MAX_TOKEN_LEN].as_slice()), Some(2.0));
    }

    #[test]
    fn test_empty_match_does_not_stall() {
        // "x*" は先頭で空マッチするが、走査は必ず前進して停止する
        let re = compile_pattern("x*").unwrap();
        let count = scan(None, b"abc", &re, false, 1.0);
        assert!(count >= 1);
    }

    #[test]
    fn test_stops_at_first_failed_attempt() {
        let re = compile_pattern("[a-z]{2,2}").unwrap();
        // 残りバッファにマッチがなくなった時点で打ち切る
        let count = scan(None, b"ab123", &re, false, 1.0);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_invalid_pattern_error() {
        match compile_pattern("([a-z]") {
            Err(FreqError::InvalidPattern { pattern, .. }) => {
                assert_eq!(pattern, "([a-z]");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_normalization_weights() {
        // 10マッチ・重み5 → 1マッチあたり0.5、合計は5
        let re = compile_pattern("a").unwrap();
        let buffer = b"aaaaaaaaaa";
        let count = scan(None, buffer, &re, true, 1.0);
        assert_eq!(count, 10);

        let weight = 5.0 / count as f64;
        let mut map = FreqMap::new();
        scan(Some(&mut map), buffer, &re, true, weight);
        assert_eq!(map.get(b"a"), Some(5.0));

        let total: f64 = map.iter().map(|(_, v)| v).sum();
        assert!((total - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_scan_file_normalizes_by_match_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"The Quick Brown Fox").unwrap();

        let re = compile_pattern("[a-z]").unwrap();
        let map = scan_file(file.path(), &re, true, 4.0, false).unwrap();

        // 寄与の合計は常にファイルの重みに一致する
        let total: f64 = map.iter().map(|(_, v)| v).sum();
        assert!((total - 4.0).abs() < 1e-9);
        assert!(map.exists(b"q"));
        assert!(!map.exists(b"Q"));
    }

    #[test]
    fn test_scan_file_zero_matches() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"12345").unwrap();

        let re = compile_pattern("[a-z]").unwrap();
        match scan_file(file.path(), &re, true, 1.0, false) {
            Err(FreqError::NoMatches { .. }) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_scan_file_missing_file() {
        let re = compile_pattern(".").unwrap();
        match scan_file(Path::new("no_such_file.txt"), &re, true, 1.0, false) {
            Err(FreqError::Io { .. }) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
