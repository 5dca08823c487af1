//! 参考集合与 k-mer 种子索引。

pub mod db;
pub mod seed_index;

pub use db::{Database, DbRecord};
pub use seed_index::{kmer_keys, IndexMeta, SeedIndex, SeedKey, SeedOccurrence};
