//! 頻度マップモジュール
//!
//! 頻度集計に特化したハッシュテーブルを実装する。
//! キーは任意のバイト列、値は累積カウント（f64）。

/// スロット数の最小値（常に2のべき乗を維持）
const RESIZE_MIN: usize = 16;

/// デフォルト初期容量
const DEFAULT_CAPACITY: usize = 16;

/// ソート済みスナップショットの1要素
///
/// 抽出後にマップを変更しても、生成済みのPairには影響しない。
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    /// キーのバイト列
    pub key: Vec<u8>,
    /// 累積カウント
    pub value: f64,
}

/// バケット内の1エントリ（キーはマップが所有するコピー）
#[derive(Debug, Clone)]
struct Entry {
    key: Vec<u8>,
    value: f64,
}

/// 頻度マップ
///
/// スロット配列（2のべき乗長）＋チェイン法。負荷率が0.75を
/// 超えた挿入の直後に2倍へ再ハッシュする。
#[derive(Debug, Clone)]
pub struct FreqMap {
    /// スロット配列。空Vecが未割り当てバケットに相当する
    buckets: Vec<Vec<Entry>>,
    /// 生存エントリ数
    count: usize,
}

/// DJB2ハッシュ（seed 5381、h = h*33 + byte）
///
/// マップ内では大文字小文字の正規化を行わない。必要なら呼び出し側が
/// 挿入前にキーを正規化する。
fn hash_bytes(key: &[u8]) -> u64 {
    let mut h: u64 = 5381;
    for &b in key {
        h = h.wrapping_mul(33).wrapping_add(u64::from(b));
    }
    h
}

/// capacity以上で最小の2のべき乗（下限RESIZE_MIN）を返す
///
/// オーバーフロー時は表現可能な最大の2のべき乗で飽和する。
fn slot_count_for(capacity: usize) -> usize {
    capacity
        .checked_next_power_of_two()
        .unwrap_or(usize::MAX / 2 + 1)
        .max(RESIZE_MIN)
}

impl FreqMap {
    /// デフォルト容量で空のマップを作成
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 指定容量で空のマップを作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); slot_count_for(capacity)],
            count: 0,
        }
    }

    /// 生存エントリ数
    pub fn len(&self) -> usize {
        self.count
    }

    /// マップが空かどうか
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// スロット数（2のべき乗）
    pub fn slot_count(&self) -> usize {
        self.buckets.len()
    }

    /// キーのスロット番号（アクセスごとに再計算、キャッシュしない）
    fn slot_of(&self, key: &[u8]) -> usize {
        (hash_bytes(key) % self.buckets.len() as u64) as usize
    }

    /// キーを検索して値を返す
    ///
    /// 不在はNoneで表す。0や負の値も正当なカウントであり、
    /// 不在と混同されることはない。
    pub fn get(&self, key: &[u8]) -> Option<f64> {
        self.buckets[self.slot_of(key)]
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value)
    }

    /// キーが存在するかどうか
    pub fn exists(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// キーと値を登録する。既存キーなら値を上書きする
    pub fn put(&mut self, key: &[u8], value: f64) {
        let slot = self.slot_of(key);
        if let Some(e) = self.buckets[slot].iter_mut().find(|e| e.key == key) {
            e.value = value;
            return;
        }
        self.insert_new(slot, key, value);
    }

    /// キーの値にdeltaを加算する。不在なら値deltaで新規登録する
    ///
    /// 頻度集計の主経路。
    pub fn increment(&mut self, key: &[u8], delta: f64) {
        let slot = self.slot_of(key);
        if let Some(e) = self.buckets[slot].iter_mut().find(|e| e.key == key) {
            e.value += delta;
            return;
        }
        self.insert_new(slot, key, delta);
    }

    /// 新規エントリをバケット末尾に追加し、必要なら再ハッシュする
    fn insert_new(&mut self, slot: usize, key: &[u8], value: f64) {
        self.buckets[slot].push(Entry {
            key: key.to_vec(),
            value,
        });
        self.count += 1;

        // 負荷率0.75超で2倍に再ハッシュ
        if self.count * 100 > self.buckets.len() * 75 {
            self.grow();
        }
    }

    /// srcの全エントリをselfに加算合流する。srcは変更しない
    pub fn merge(&mut self, src: &FreqMap) {
        for (key, value) in src.iter() {
            self.increment(key, value);
        }
    }

    /// 全エントリを走査するイテレータ（順序は不定）
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], f64)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|e| (e.key.as_slice(), e.value)))
    }

    /// 全エントリのスナップショットを値の降順で返す
    ///
    /// 同値のエントリはキーの昇順（バイト列比較）で並ぶ。
    /// 返り値は独立したコピーであり、以後のマップ変更の影響を受けない。
    pub fn to_sorted_pairs(&self) -> Vec<Pair> {
        let mut pairs: Vec<Pair> = self
            .iter()
            .map(|(key, value)| Pair {
                key: key.to_vec(),
                value,
            })
            .collect();

        pairs.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        pairs
    }

    /// 全エントリとバケット領域を解放し、初期状態に戻す
    pub fn clear(&mut self) {
        self.buckets = vec![Vec::new(); slot_count_for(DEFAULT_CAPACITY)];
        self.count = 0;
    }

    /// スロット数2倍の新テーブルへ全エントリを再挿入する
    ///
    /// 旧テーブル内でキーは一意なので、加算ではなくputで移す。
    /// 値は完全に保存される。
    fn grow(&mut self) {
        let new_slots = self.buckets.len().saturating_mul(2);
        let mut next = FreqMap {
            buckets: vec![Vec::new(); slot_count_for(new_slots)],
            count: 0,
        };
        for bucket in &self.buckets {
            for e in bucket {
                let slot = next.slot_of(&e.key);
                next.buckets[slot].push(Entry {
                    key: e.key.clone(),
                    value: e.value,
                });
                next.count += 1;
            }
        }
        *self = next;
    }
}

impl Default for FreqMap {
    fn default() -> Self {
        Self::new()
    }
}
