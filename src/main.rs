//! コーパス頻度解析ツール
//!
//! テキストコーパス中の文字・文字列・単語列の出現頻度を、
//! ファイルごとの重み付きで集計する。

mod config;
mod error;
mod freq_map;
mod ngram;
mod report;
mod scan;

use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::config::{CorpusConfig, CorpusEntry};
use crate::error::FreqError;
use crate::freq_map::FreqMap;

/// コーパス頻度解析ツール
#[derive(Parser, Debug, Clone)]
#[command(name = "corpus_freq_analyzer")]
#[command(about = "テキストコーパスの重み付き頻度統計を集計")]
struct Args {
    /// コーパスファイル
    files: Vec<PathBuf>,

    /// ファイルごとの重み（ファイルと同数を繰り返し指定、省略時は1.0）
    #[arg(short, long)]
    multiplier: Vec<f64>,

    /// JSON設定ファイル（ファイルと重みの一覧）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 正規表現パターン（サブ式は先頭の1個のみ有効）
    #[arg(short, long)]
    pattern: Option<String>,

    /// パターンプリセット名
    #[arg(long)]
    preset: Option<String>,

    /// N-gramモード: 連続N単語を集計（パターン指定より優先）
    #[arg(short = 'n', long)]
    ngram: Option<usize>,

    /// 重複マッチの扱い（auto / on / off）
    #[arg(long, default_value = "auto")]
    overlap: String,

    /// 表示件数上限（0=無制限）
    #[arg(short, long, default_value_t = 0)]
    top: usize,

    /// 結果のJSON出力先
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 小文字化せずに集計する
    #[arg(long, default_value_t = false)]
    case_sensitive: bool,

    /// 制御文字をエスケープせずに表示する
    #[arg(long, default_value_t = false)]
    no_escape: bool,
}

fn main() {
    let args = Args::parse();

    println!("=== コーパス頻度解析 ===\n");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定エラー: {}", e);
            std::process::exit(1);
        }
    };

    if config.files.is_empty() {
        eprintln!("集計対象のファイルがありません");
        std::process::exit(1);
    }

    let total = match args.ngram {
        Some(word_count) => run_ngram(&config, word_count, &args),
        None => run_pattern(&config, &args),
    };

    println!("\n対象ファイル: {}", config.files.len());
    println!("集計キー数: {}\n", total.len());

    let pairs = total.to_sorted_pairs();
    if let Err(e) = report::print_pairs(&mut std::io::stdout(), &pairs, args.top, !args.no_escape)
    {
        eprintln!("出力エラー: {}", e);
        std::process::exit(1);
    }

    if let Some(path) = &args.output {
        report::save_json(&pairs, args.top, path);
    }
}

/// コーパス設定を読み込む（設定ファイル優先）
fn load_config(args: &Args) -> Result<CorpusConfig, FreqError> {
    match &args.config {
        Some(path) => CorpusConfig::from_json_file(path),
        None => CorpusConfig::from_cli(&args.files, &args.multiplier),
    }
}

/// 正規表現モードで全ファイルを集計する
fn run_pattern(config: &CorpusConfig, args: &Args) -> FreqMap {
    let pattern = resolve_pattern(args);
    let re = match scan::compile_pattern(&pattern) {
        Ok(re) => re,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let overlap = resolve_overlap(&args.overlap, &pattern);

    println!("パターン: {} (overlap: {})", pattern, overlap);

    let pb = progress_bar(config.files.len());
    let results: Vec<(&CorpusEntry, Result<FreqMap, FreqError>)> = config
        .files
        .par_iter()
        .map(|entry| {
            let result =
                scan::scan_file(&entry.path, &re, overlap, entry.multiplier, args.case_sensitive);
            pb.inc(1);
            (entry, result)
        })
        .collect();
    pb.finish_and_clear();

    merge_results(results)
}

/// N-gramモードで全ファイルを集計する
fn run_ngram(config: &CorpusConfig, word_count: usize, args: &Args) -> FreqMap {
    if word_count == 0 {
        eprintln!("--ngram には1以上を指定してください");
        std::process::exit(1);
    }

    println!("N-gram: 連続{}単語", word_count);

    let pb = progress_bar(config.files.len());
    let results: Vec<(&CorpusEntry, Result<FreqMap, FreqError>)> = config
        .files
        .par_iter()
        .map(|entry| {
            let result =
                ngram::extract_file(&entry.path, word_count, entry.multiplier, args.case_sensitive);
            pb.inc(1);
            (entry, result)
        })
        .collect();
    pb.finish_and_clear();

    merge_results(results)
}

/// パターン文字列を決定する（明示指定 > プリセット > デフォルト）
fn resolve_pattern(args: &Args) -> String {
    if let Some(pattern) = &args.pattern {
        return pattern.clone();
    }
    if let Some(name) = &args.preset {
        match config::preset_pattern(name) {
            Some(pattern) => return pattern.to_string(),
            None => {
                eprintln!("未知のプリセット: {} (候補: {})", name, config::preset_names());
                std::process::exit(1);
            }
        }
    }
    // デフォルトは1文字頻度
    ".".to_string()
}

/// 重複マッチモードを決定する
fn resolve_overlap(mode: &str, pattern: &str) -> bool {
    match mode {
        "on" => true,
        "off" => false,
        "auto" => scan::auto_overlap(pattern),
        other => {
            eprintln!("--overlap は auto / on / off のいずれか: {}", other);
            std::process::exit(1);
        }
    }
}

/// ファイル単位の進捗バーを作成する（非TTYでは非表示）
fn progress_bar(len: usize) -> ProgressBar {
    if !atty::is(atty::Stream::Stdout) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (Files)")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

/// ファイルごとの結果を1つのマップへ合流する
///
/// ファイル単位のエラーはそのファイルだけをスキップして報告し、
/// 残りの集計は続行する。
fn merge_results(results: Vec<(&CorpusEntry, Result<FreqMap, FreqError>)>) -> FreqMap {
    let mut total = FreqMap::new();
    for (entry, result) in results {
        match result {
            Ok(map) => {
                total.merge(&map);
                println!("done: {} (重み {})", entry.path.display(), entry.multiplier);
            }
            Err(e) => eprintln!("スキップ: {}", e),
        }
    }
    total
}
