//! 种子查找、X-drop 无空位延伸与单查询检索流程。
pub mod extend;
pub mod scoring;
pub mod search;
pub mod seed;

pub use extend::{extend_seed, Extension, XDropExtender};
pub use scoring::ScoringScheme;
pub use search::{CancelToken, Hit, SearchOpt, SearchReport, Searcher, Strand, SubjectHits};
pub use seed::{find_seed_hits, group_by_diagonal, SeedHit};
