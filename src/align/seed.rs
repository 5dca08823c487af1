use crate::codec::{Alphabet, EncodedSequence, Word};
use crate::error::{BlastError, Result};
use crate::index::{kmer_keys, SeedIndex};

/// query 与某条参考序列之间的一次 k-mer 精确匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeedHit {
    pub seq_id: u32,
    pub query_offset: usize,
    pub target_offset: usize,
    pub len: usize,
}

impl SeedHit {
    /// 对角线编号：target 偏移 - query 偏移
    #[inline]
    pub fn diagonal(&self) -> i64 {
        self.target_offset as i64 - self.query_offset as i64
    }
}

/// 查 query 的所有 k-mer，展开为种子命中。
pub fn find_seed_hits<W: Word>(
    index: &SeedIndex<W>,
    alphabet: &Alphabet,
    query: &EncodedSequence<W>,
) -> Result<Vec<SeedHit>> {
    if query.bits() != index.bits() {
        return Err(BlastError::out_of_range(
            "query bit width",
            query.bits() as u64,
            index.bits() as u64,
            index.bits() as u64,
        ));
    }
    let mut hits = Vec::new();
    for (qoff, key) in kmer_keys(query, alphabet, index.word_size()) {
        for occ in index.lookup(&key) {
            hits.push(SeedHit {
                seq_id: occ.seq_id,
                query_offset: qoff,
                target_offset: occ.offset as usize,
                len: occ.len as usize,
            });
        }
    }
    Ok(hits)
}

/// 按 (序列, 对角线) 分组，组内按 query 偏移升序
pub fn group_by_diagonal(mut hits: Vec<SeedHit>) -> Vec<Vec<SeedHit>> {
    hits.sort_by(|a, b| {
        a.seq_id
            .cmp(&b.seq_id)
            .then(a.diagonal().cmp(&b.diagonal()))
            .then(a.query_offset.cmp(&b.query_offset))
    });

    let mut groups: Vec<Vec<SeedHit>> = Vec::new();
    for h in hits {
        match groups.last_mut() {
            Some(g) if g[0].seq_id == h.seq_id && g[0].diagonal() == h.diagonal() => g.push(h),
            _ => groups.push(vec![h]),
        }
    }
    groups
}
