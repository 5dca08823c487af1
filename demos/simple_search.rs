//! 演示如何在 library 模式下使用 blast-rs 进行相似性检索。
//!
//! 运行方式：
//! ```bash
//! cargo run --example simple_search
//! ```

use blast_rs::align::{CancelToken, ScoringScheme, SearchOpt, Searcher, XDropExtender};
use blast_rs::codec::{Alphabet, SequenceEncoder};
use blast_rs::index::{Database, SeedIndex};
use blast_rs::io::report;
use blast_rs::stats::StatisticsContext;

fn main() -> blast_rs::Result<()> {
    // 1. 编码
    let dna = Alphabet::nucleotide();
    let encoder = SequenceEncoder::<u64>::full_width(&dna)?;
    let reference: &[u8] = b"ACGTACGTAGCTGATCGTAGCTAGCTAGCTGATCGTAGCTAGCTAGCTGATTTGACCAGTAGGCATNNACGT";
    let encoded = encoder.encode(reference)?;
    println!(
        "参考序列 {} bp，{} 位/符号，每字 {} 个符号，共 {} 个字",
        encoded.len(),
        encoded.bits(),
        encoded.window_size(),
        encoded.words().len()
    );

    // 2. 建库与种子索引
    let mut db = Database::new();
    db.push(&encoder, "ref1", reference)?;
    db.push(&encoder, "ref2", b"TTTTGGGGCCCCAAAATTTTGATCGTAGCTAGCTAGCCCC")?;
    let index = SeedIndex::build(&db, &dna, 8)?;
    println!("索引：{} 个不同 8-mer，{} 处出现", index.num_keys(), index.num_occurrences());

    // 3. 单个种子的 X-drop 延伸
    let scheme = ScoringScheme { word_size: 8, evalue_threshold: 1.0, ..Default::default() };
    let query = encoder.encode(b"CCGATCGTAGCTAGCTAGCAA")?;
    let extender = XDropExtender::new(&dna, scheme);
    if let Some(rec) = db.get(0) {
        let ext = extender.extend(&query, 2, 10, &rec.seq, 12, 20)?;
        println!(
            "\n延伸：query[{}..{}) ↔ ref1[{}..{})，得分 {}，一致 {}/{}",
            ext.query_start,
            ext.query_end,
            ext.target_start,
            ext.target_end,
            ext.score,
            ext.identities,
            ext.length()
        );
        println!("  片段：{}", String::from_utf8_lossy(&encoder.decode(&ext.query_segment)?));
    }

    // 4. 统计量
    let q_symbols = encoder.decode(&query)?;
    let ctx = StatisticsContext::new(&scheme, &dna, &q_symbols, db.total_len(), db.len() as u64)?;
    println!(
        "\nλ={:.4} K={:.4} H={:.4}，有效搜索空间 {:.0}",
        ctx.params.lambda, ctx.params.k, ctx.params.h, ctx.search_space
    );

    // 5. 完整检索
    let opt = SearchOpt { scheme, threads: 1, both_strands: true };
    let searcher = Searcher::new(&db, &index, &dna, opt)?;
    let result = searcher.search(&q_symbols, &CancelToken::new())?;
    println!("\n{} 个种子，{} 条命中:", result.seeds, result.num_hits());
    let mut out = Vec::new();
    if report::write_tabular(&mut out, "query", &result).is_ok() {
        print!("{}", String::from_utf8_lossy(&out));
    }

    println!("\n完成！");
    Ok(())
}
