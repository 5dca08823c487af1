//! # blast-rs
//!
//! BLAST 风格的序列相似性检索内核。
//!
//! 本 crate 提供：
//!
//! - **序列编码**：按字母表位宽把符号紧凑打包进 8/16/32/64 位字
//! - **种子索引**：参考集合上所有 k-mer 的倒排表
//! - **种子延伸**：X-drop 无空位双向延伸
//! - **显著性统计**：Karlin-Altschul λ / K / H、bit score 与 E 值
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use blast_rs::align::{CancelToken, ScoringScheme, SearchOpt, Searcher};
//! use blast_rs::codec::{Alphabet, SequenceEncoder};
//! use blast_rs::index::{Database, SeedIndex};
//!
//! let dna = Alphabet::dna();
//! let encoder = SequenceEncoder::<u64>::full_width(&dna)?;
//!
//! let mut db = Database::new();
//! db.push(&encoder, "ref1", b"ACGTACGTAGCTGATCGTAGCTAGCTAGCTGATCGTAGCTAGCTAGCTGAT")?;
//! let index = SeedIndex::build(&db, &dna, 11)?;
//!
//! let searcher = Searcher::new(&db, &index, &dna, SearchOpt::default())?;
//! let report = searcher.search(b"GATCGTAGCTAGCTAGCTG", &CancelToken::new())?;
//! for subject in &report.subjects {
//!     for hit in &subject.hits {
//!         println!("{} score={} evalue={:.2e}", subject.name, hit.extension.score, hit.evalue);
//!     }
//! }
//! # Ok::<(), blast_rs::BlastError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`codec`]：字母表、位打包编码与编码缓存
//! - [`index`]：参考集合与 k-mer 种子索引
//! - [`align`]：打分方案、种子查找、X-drop 延伸、单查询检索
//! - [`stats`]：Karlin-Altschul 参数与 E 值换算
//! - [`io`]：FASTA 读取与表格输出
//! - [`util`]：序列规范化 / 反向互补

pub mod align;
pub mod codec;
pub mod error;
pub mod index;
pub mod io;
pub mod stats;
pub mod util;

pub use error::{BlastError, Result};
