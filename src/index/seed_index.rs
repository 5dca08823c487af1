use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::db::Database;
use crate::codec::word::low_mask;
use crate::codec::{Alphabet, EncodedSequence, Word};
use crate::error::{BlastError, Result};

/// 一个 k-mer 打包后的字，按位模式比较和哈希。
///
/// 布局与 [`SequenceEncoder::encode_window`](crate::codec::SequenceEncoder::encode_window)
/// 相同：k 个符号从高位起排列，低位补零。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeedKey<W: Word>(pub W);

/// k-mer 在参考集合中的一次出现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedOccurrence {
    pub seq_id: u32,
    pub offset: u32,
    pub len: u32,
}

/// 索引元信息（可选）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexMeta {
    pub reference_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// k-mer 种子索引：SeedKey -> 出现位置列表。
///
/// 离线构建一次，之后只读，可被多个查询线程共享。
#[derive(Debug, Clone)]
pub struct SeedIndex<W: Word> {
    word_size: usize,
    bits: u32,
    table: HashMap<SeedKey<W>, Vec<SeedOccurrence>>,
    n_occurrences: usize,
    /// 建索引所用的字母表；`new` 手工构造时为 None
    alphabet: Option<Alphabet>,
    meta: IndexMeta,
}

impl<W: Word> SeedIndex<W> {
    pub fn new(word_size: usize, bits: u32) -> Result<Self> {
        let max = if bits == 0 { 0 } else { (W::BITS / bits) as usize };
        if word_size == 0 || word_size > max {
            return Err(BlastError::out_of_range("word size", word_size as u64, 1, max as u64));
        }
        Ok(Self { word_size, bits, table: HashMap::new(), n_occurrences: 0, alphabet: None, meta: IndexMeta::default() })
    }

    /// 对整个参考集合建索引。
    ///
    /// 各序列的 k-mer 并行计算，再按序列号顺序单线程汇总。
    pub fn build(db: &Database<W>, alphabet: &Alphabet, word_size: usize) -> Result<Self> {
        let mut index = Self::new(word_size, alphabet.bits())?;
        if let Some(rec) = db.records().iter().find(|r| r.seq.bits() != alphabet.bits()) {
            return Err(BlastError::out_of_range(
                "record bit width",
                rec.seq.bits() as u64,
                alphabet.bits() as u64,
                alphabet.bits() as u64,
            ));
        }
        index.alphabet = Some(alphabet.clone());

        let partial: Vec<Vec<(SeedKey<W>, SeedOccurrence)>> = db
            .records()
            .par_iter()
            .enumerate()
            .map(|(id, rec)| {
                kmer_keys(&rec.seq, alphabet, word_size)
                    .into_iter()
                    .map(|(off, key)| {
                        let occ = SeedOccurrence { seq_id: id as u32, offset: off as u32, len: word_size as u32 };
                        (key, occ)
                    })
                    .collect()
            })
            .collect();

        for list in partial {
            for (key, occ) in list {
                index.insert(key, occ);
            }
        }

        log::debug!(
            "seed index: k={} keys={} occurrences={} sequences={}",
            word_size,
            index.num_keys(),
            index.num_occurrences(),
            db.len()
        );
        Ok(index)
    }

    pub fn insert(&mut self, key: SeedKey<W>, occurrence: SeedOccurrence) {
        self.table.entry(key).or_default().push(occurrence);
        self.n_occurrences += 1;
    }

    /// 未出现的 key 返回空切片
    pub fn lookup(&self, key: &SeedKey<W>) -> &[SeedOccurrence] {
        self.table.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn word_size(&self) -> usize {
        self.word_size
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn alphabet(&self) -> Option<&Alphabet> {
        self.alphabet.as_ref()
    }

    pub fn num_keys(&self) -> usize {
        self.table.len()
    }

    pub fn num_occurrences(&self) -> usize {
        self.n_occurrences
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }
}

/// 枚举序列上所有只含规则符号的 k-mer，返回 (起点, key)。
///
/// 滚动计算：遇到歧义码时清零重新累计。
pub fn kmer_keys<W: Word>(seq: &EncodedSequence<W>, alphabet: &Alphabet, k: usize) -> Vec<(usize, SeedKey<W>)> {
    let bits = seq.bits();
    let span = bits * k as u32;
    if k == 0 || span > W::BITS || seq.len() < k {
        return Vec::new();
    }
    let mask = low_mask(span);
    let shift = W::BITS - span;

    let mut out = Vec::with_capacity(seq.len() + 1 - k);
    let mut rolling = 0u64;
    let mut valid = 0usize;
    for i in 0..seq.len() {
        let c = seq.code(i);
        if !alphabet.is_regular_code(c) {
            rolling = 0;
            valid = 0;
            continue;
        }
        rolling = ((rolling << bits) | c as u64) & mask;
        valid += 1;
        if valid >= k {
            out.push((i + 1 - k, SeedKey(W::from_u64(rolling << shift))));
        }
    }
    out
}
