//! N-gramモジュール
//!
//! 連続するN単語の列を手動トークナイズで抽出する。正規表現では
//! 表現できないため独立した実装を持つ。スキャンと異なり重みは
//! 生の乗数のまま加算され、マッチ数による正規化は行わない
//! （意図的な非対称）。

use std::path::Path;

use crate::error::FreqError;
use crate::freq_map::FreqMap;
use crate::scan::normalize_case;

/// 1単語の最大バイト数。これを超える単語を含む窓は登録しない
pub const MAX_WORD_LEN: usize = 1000;

/// 単語構成バイトかどうか（英数字とアポストロフィ）
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'\''
}

/// バッファからword_count語の窓をすべて抽出してマップに加算する
///
/// 窓は1語ずつスライドする（word_count語ずつではない）。各語は
/// 区切りバイトを読み飛ばしたあと英数字とアポストロフィの連続を
/// 貪欲に取り、末尾のアポストロフィは1個だけ取り除く。語はスペース
/// 1個で連結してキーにする。バッファ終端までにword_count語が
/// 揃わなければ、その不完全な窓は捨てて終了する。
/// MAX_WORD_LENを超える語を含む窓は登録せず、スライドは続ける。
pub fn extract(map: &mut FreqMap, buffer: &[u8], word_count: usize, weight: f64) {
    if word_count == 0 {
        return;
    }

    let mut start = 0;
    loop {
        let mut i = start;
        let mut key: Vec<u8> = Vec::new();
        let mut words = 0;
        let mut oversized = false;

        while i < buffer.len() && words < word_count {
            // 区切りを読み飛ばす
            while i < buffer.len() && !buffer[i].is_ascii_alphanumeric() {
                i += 1;
            }
            if i >= buffer.len() {
                break;
            }

            if words > 0 {
                key.push(b' ');
            }
            let word_start = key.len();

            // 1単語を貪欲にマッチ
            while i < buffer.len() && is_word_byte(buffer[i]) {
                key.push(buffer[i]);
                i += 1;
            }
            // 単語末尾のアポストロフィは単語に含めない
            if key.last() == Some(&b'\'') {
                key.pop();
                i -= 1;
            }

            if key.len() - word_start > MAX_WORD_LEN {
                oversized = true;
            }
            words += 1;

            // 次の窓は今回の1語目の直後から始まる
            if words == 1 {
                start = i;
            }
        }

        if words == word_count {
            if !oversized {
                map.increment(&key, weight);
            }
        } else {
            // 終端に達して窓が揃わなかった
            break;
        }
    }
}

/// 1ファイルを読み込み、N-gram頻度マップを作る
///
/// 重みは正規化せず乗数のまま使う。
pub fn extract_file(
    path: &Path,
    word_count: usize,
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

    let mut map = FreqMap::new();
    extract(&mut map, &buffer, word_count, multiplier);
    Ok(map)
}
